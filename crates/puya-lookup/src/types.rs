//! Core data types for product lookups.

use serde::{Deserialize, Serialize};

/// A product as shown on the kiosk, normalized from the ERP's `product.template`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub name: String,
    pub list_price: f64,
    pub barcode: String,
    pub internal_code: String,
    pub available_quantity: f64,
}

/// Result of one lookup attempt. Exactly one variant per attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LookupOutcome {
    Found { product: ProductRecord },
    NotFound,
    AuthenticationFailed { message: String },
    TransportError { message: String },
}

impl LookupOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, LookupOutcome::Found { .. })
    }

    /// The product, if the lookup found one.
    pub fn product(&self) -> Option<&ProductRecord> {
        match self {
            LookupOutcome::Found { product } => Some(product),
            _ => None,
        }
    }
}

impl From<Result<Option<ProductRecord>, LookupError>> for LookupOutcome {
    fn from(result: Result<Option<ProductRecord>, LookupError>) -> Self {
        match result {
            Ok(Some(product)) => LookupOutcome::Found { product },
            Ok(None) => LookupOutcome::NotFound,
            Err(LookupError::AuthenticationFailed(message)) => {
                LookupOutcome::AuthenticationFailed { message }
            }
            Err(LookupError::Transport(message)) => LookupOutcome::TransportError { message },
        }
    }
}

/// Opaque session handle (the ERP `uid`) returned by authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHandle {
    uid: i64,
    cached: bool,
}

impl SessionHandle {
    pub(crate) fn new(uid: i64) -> Self {
        Self { uid, cached: false }
    }

    pub(crate) fn from_cache(uid: i64) -> Self {
        Self { uid, cached: true }
    }

    pub fn uid(&self) -> i64 {
        self.uid
    }

    /// Whether this handle was served from the session cache rather than a fresh login.
    pub fn is_cached(&self) -> bool {
        self.cached
    }
}

/// Errors that abort a lookup. Converted into a [`LookupOutcome`] at the client boundary.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Convenience result type.
pub type LookupResult<T> = Result<T, LookupError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn arroz() -> ProductRecord {
        ProductRecord {
            name: "Arroz 1kg".to_string(),
            list_price: 2.5,
            barcode: "7501234567890".to_string(),
            internal_code: "AR-001".to_string(),
            available_quantity: 42.0,
        }
    }

    #[test]
    fn test_outcome_from_result() {
        assert_eq!(
            LookupOutcome::from(Ok(Some(arroz()))),
            LookupOutcome::Found { product: arroz() }
        );
        assert_eq!(LookupOutcome::from(Ok(None)), LookupOutcome::NotFound);
        assert_eq!(
            LookupOutcome::from(Err(LookupError::Transport("boom".to_string()))),
            LookupOutcome::TransportError {
                message: "boom".to_string()
            }
        );
        assert_eq!(
            LookupOutcome::from(Err(LookupError::AuthenticationFailed("nope".to_string()))),
            LookupOutcome::AuthenticationFailed {
                message: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(LookupOutcome::Found { product: arroz() }).unwrap();
        assert_eq!(json["outcome"], "found");
        assert_eq!(json["product"]["listPrice"], 2.5);
        assert_eq!(json["product"]["internalCode"], "AR-001");
        assert_eq!(json["product"]["availableQuantity"], 42.0);

        let json = serde_json::to_value(LookupOutcome::NotFound).unwrap();
        assert_eq!(json["outcome"], "not_found");
    }
}
