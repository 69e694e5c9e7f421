//! XML-RPC over HTTP transport.
//!
//! No retry, no backoff. One POST per call; failures are reported as-is.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::xmlrpc::{self, Response, Value};

/// The two ERP services the kiosk talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Login and version endpoints.
    Common,
    /// Generic model method invocation (`execute_kw`).
    Object,
}

impl Service {
    pub fn path(&self) -> &'static str {
        match self {
            Service::Common => "xmlrpc/2/common",
            Service::Object => "xmlrpc/2/object",
        }
    }
}

/// Failures of a single remote call.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Fault {code}: {message}")]
    Fault { code: i64, message: String },
}

impl From<xmlrpc::CodecError> for RpcError {
    fn from(e: xmlrpc::CodecError) -> Self {
        RpcError::Malformed(e.to_string())
    }
}

/// Seam between the lookup client and the network.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Invoke `method` on `service` with positional `params`.
    async fn call(&self, service: Service, method: &str, params: Vec<Value>)
        -> Result<Value, RpcError>;
}

/// [`RpcTransport`] that POSTs `text/xml` bodies with reqwest.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport with the reqwest defaults (no request timeout).
    pub fn new(base_url: Url) -> Self {
        Self::with_timeout(base_url, None)
    }

    /// Create a transport with an optional per-request timeout.
    pub fn with_timeout(base_url: Url, timeout: Option<Duration>) -> Self {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_default();
        Self { client, base_url }
    }

    /// Full URL for a service, e.g. `https://erp.example.com/xmlrpc/2/common`.
    pub fn service_url(&self, service: Service) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            service.path()
        )
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(
        &self,
        service: Service,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, RpcError> {
        let url = self.service_url(service);
        let body = xmlrpc::encode_call(method, &params);

        tracing::debug!("XML-RPC {method} -> {url}");

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| RpcError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RpcError::Status(status.as_u16()));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| RpcError::Http(e.to_string()))?;

        match xmlrpc::decode_response(&text)? {
            Response::Success(value) => Ok(value),
            Response::Fault { code, message } => Err(RpcError::Fault { code, message }),
        }
    }
}
