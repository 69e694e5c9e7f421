//! Configuration loading and resolution.

use std::path::PathBuf;
use std::time::Duration;

use puya_lookup::Credentials;

use crate::types::{KioskError, KioskResult};

/// Optional request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "PUYA_TIMEOUT_SECS";
/// Optional session cache lifetime, in seconds. `0` disables the cache.
pub const ENV_SESSION_TTL_SECS: &str = "PUYA_SESSION_TTL_SECS";

/// Everything the kiosk needs before its first lookup.
#[derive(Debug, Clone)]
pub struct KioskSettings {
    pub credentials: Credentials,
    pub timeout: Option<Duration>,
    pub session_ttl: Duration,
}

/// Values given on the command line; they win over the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub timeout_secs: Option<u64>,
    pub session_ttl_secs: Option<u64>,
}

impl KioskSettings {
    /// Load settings from the process environment.
    pub fn load(overrides: Overrides) -> KioskResult<Self> {
        Self::load_from(overrides, |name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary name → value lookup.
    ///
    /// Credentials are validated first, so an incomplete configuration is
    /// reported before anything else and before any remote call.
    pub fn load_from<F>(overrides: Overrides, lookup: F) -> KioskResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Credentials::from_lookup(&lookup)?;

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => Some(secs),
            None => parse_secs(ENV_TIMEOUT_SECS, lookup(ENV_TIMEOUT_SECS))?,
        };
        let session_ttl_secs = match overrides.session_ttl_secs {
            Some(secs) => Some(secs),
            None => parse_secs(ENV_SESSION_TTL_SECS, lookup(ENV_SESSION_TTL_SECS))?,
        };

        Ok(Self {
            credentials,
            timeout: timeout_secs.filter(|s| *s > 0).map(Duration::from_secs),
            session_ttl: Duration::from_secs(session_ttl_secs.unwrap_or(0)),
        })
    }
}

fn parse_secs(name: &'static str, raw: Option<String>) -> KioskResult<Option<u64>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| KioskError::InvalidSetting {
                name,
                value: value.to_string(),
            }),
    }
}

/// Resolve the REPL history file path.
pub fn resolve_history_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    PathBuf::from(home).join(".puya_kiosk_history")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use puya_lookup::ConfigError;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("ODOO_URL", "https://erp.example.com"),
            ("ODOO_DB", "puya"),
            ("ODOO_USERNAME", "kiosk"),
            ("ODOO_PASSWORD", "s3cret"),
        ])
    }

    fn load(
        env: &HashMap<&'static str, &'static str>,
        overrides: Overrides,
    ) -> KioskResult<KioskSettings> {
        KioskSettings::load_from(overrides, |k| env.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let settings = load(&base_env(), Overrides::default()).unwrap();
        assert_eq!(settings.timeout, None);
        assert_eq!(settings.session_ttl, Duration::ZERO);
    }

    #[test]
    fn test_env_and_overrides() {
        let mut env = base_env();
        env.insert(ENV_TIMEOUT_SECS, "15");
        env.insert(ENV_SESSION_TTL_SECS, "300");

        let settings = load(&env, Overrides::default()).unwrap();
        assert_eq!(settings.timeout, Some(Duration::from_secs(15)));
        assert_eq!(settings.session_ttl, Duration::from_secs(300));

        let settings = load(
            &env,
            Overrides {
                timeout_secs: Some(5),
                session_ttl_secs: Some(0),
            },
        )
        .unwrap();
        assert_eq!(settings.timeout, Some(Duration::from_secs(5)));
        assert_eq!(settings.session_ttl, Duration::ZERO);
    }

    #[test]
    fn test_incomplete_credentials_reported_first() {
        let mut env = base_env();
        env.insert("ODOO_PASSWORD", "");
        env.insert(ENV_TIMEOUT_SECS, "soon");

        let err = load(&env, Overrides::default()).unwrap_err();
        assert!(matches!(
            err,
            KioskError::Config(ConfigError::ConfigurationIncomplete { .. })
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_bad_number() {
        let mut env = base_env();
        env.insert(ENV_TIMEOUT_SECS, "soon");
        let err = load(&env, Overrides::default()).unwrap_err();
        assert!(matches!(
            err,
            KioskError::InvalidSetting { name, .. } if name == ENV_TIMEOUT_SECS
        ));
    }
}
