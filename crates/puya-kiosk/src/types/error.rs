//! Errors raised by the kiosk before or between lookups.
//!
//! Lookup failures themselves never show up here: they arrive as a
//! [`puya_lookup::LookupOutcome`] and are rendered like any other result.

use puya_lookup::{CaptureError, ConfigError};

#[derive(thiserror::Error, Debug)]
pub enum KioskError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid value for {name}: '{value}' (expected whole seconds)")]
    InvalidSetting { name: &'static str, value: String },

    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KioskError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            KioskError::Config(_) | KioskError::InvalidSetting { .. } => 2,
            KioskError::Capture(_) | KioskError::Io(_) | KioskError::Json(_) => 1,
        }
    }
}

pub type KioskResult<T> = Result<T, KioskError>;
