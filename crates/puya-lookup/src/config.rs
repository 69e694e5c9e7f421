//! ERP credentials and their validation.

use std::fmt;

use url::Url;

/// Environment variable holding the ERP base URL.
pub const ENV_URL: &str = "ODOO_URL";
/// Environment variable holding the database name.
pub const ENV_DB: &str = "ODOO_DB";
/// Environment variable holding the login.
pub const ENV_USERNAME: &str = "ODOO_USERNAME";
/// Environment variable holding the password or API key.
pub const ENV_PASSWORD: &str = "ODOO_PASSWORD";

/// Errors raised while assembling credentials. All of them are fatal at startup.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration incomplete: missing {}", .missing.join(", "))]
    ConfigurationIncomplete { missing: Vec<&'static str> },

    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

/// Remote-access credentials for one ERP instance.
///
/// Only constructible through [`Credentials::new`] or the env loaders, so a
/// value in hand always has every field populated.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    endpoint: Url,
    database: String,
    username: String,
    secret: String,
}

impl Credentials {
    /// Validate and build credentials. Every field must be non-empty after trimming.
    pub fn new(
        endpoint: &str,
        database: &str,
        username: &str,
        secret: &str,
    ) -> Result<Self, ConfigError> {
        let fields = [
            (ENV_URL, endpoint),
            (ENV_DB, database),
            (ENV_USERNAME, username),
            (ENV_PASSWORD, secret),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::ConfigurationIncomplete { missing });
        }

        let endpoint = parse_endpoint(endpoint.trim())?;

        Ok(Self {
            endpoint,
            database: database.trim().to_string(),
            username: username.trim().to_string(),
            secret: secret.to_string(),
        })
    }

    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary name → value lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_URL).unwrap_or_default();
        let db = lookup(ENV_DB).unwrap_or_default();
        let username = lookup(ENV_USERNAME).unwrap_or_default();
        let password = lookup(ENV_PASSWORD).unwrap_or_default();
        Self::new(&url, &db, &username, &password)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint.as_str())
            .field("database", &self.database)
            .field("username", &self.username)
            .field("secret", &"***")
            .finish()
    }
}

/// Parse the base URL, dropping any trailing slashes from the path.
fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("not a base URL".to_string()));
    }

    let trimmed = url.path().trim_end_matches('/').to_string();
    url.set_path(&trimmed);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_complete_credentials() {
        let vars = env(&[
            (ENV_URL, "https://erp.example.com/"),
            (ENV_DB, "puya"),
            (ENV_USERNAME, "kiosk@puya.test"),
            (ENV_PASSWORD, "s3cret"),
        ]);
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(creds.endpoint().as_str(), "https://erp.example.com/");
        assert_eq!(creds.database(), "puya");
        assert_eq!(creds.secret(), "s3cret");
    }

    #[test]
    fn test_empty_secret_is_incomplete() {
        let err = Credentials::new("https://erp.example.com", "puya", "kiosk", "").unwrap_err();
        assert_eq!(
            err,
            ConfigError::ConfigurationIncomplete {
                missing: vec![ENV_PASSWORD]
            }
        );
    }

    #[test]
    fn test_reports_every_missing_name() {
        let vars = env(&[(ENV_DB, "puya"), (ENV_USERNAME, "   ")]);
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        match err {
            ConfigError::ConfigurationIncomplete { missing } => {
                assert_eq!(missing, vec![ENV_URL, ENV_USERNAME, ENV_PASSWORD]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = Credentials::new("erp.example.com", "puya", "kiosk", "pw").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));

        let err = Credentials::new("ftp://erp.example.com", "puya", "kiosk", "pw").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_trailing_slashes_dropped_from_subpath() {
        let creds = Credentials::new("https://host/odoo//", "db", "u", "p").unwrap();
        assert_eq!(creds.endpoint().path(), "/odoo");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("https://host", "db", "u", "hunter2").unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }
}
