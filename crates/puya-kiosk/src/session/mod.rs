//! Kiosk session state.

pub mod manager;

pub use manager::{KioskSession, SessionStats};
