//! Puya kiosk: terminal price checker backed by an Odoo catalog.

pub mod config;
pub mod kiosk;
pub mod render;
pub mod repl;
pub mod session;
pub mod types;

pub use config::{KioskSettings, Overrides};
pub use render::OutputFormat;
pub use session::KioskSession;
pub use types::{KioskError, KioskResult};
