//! Puya lookup: read-only product lookup against an Odoo ERP over XML-RPC.

pub mod capture;
pub mod client;
pub mod config;
pub mod transport;
pub mod types;
pub mod xmlrpc;

pub use capture::{
    normalize_identifier, CaptureError, CaptureMode, IdentifierSource, LineSource, ScriptedSource,
};
pub use client::{OdooClient, PRODUCT_FIELDS, PRODUCT_MODEL};
pub use config::{ConfigError, Credentials};
pub use transport::{HttpTransport, RpcError, RpcTransport, Service};
pub use types::*;
