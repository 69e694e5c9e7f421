//! Read-only product lookup against the Odoo external API.
//!
//! One lookup is `authenticate → search → read`, strictly in sequence. Every
//! path ends in exactly one [`LookupOutcome`]; nothing is retried.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::Credentials;
use crate::transport::{HttpTransport, RpcError, RpcTransport, Service};
use crate::types::{LookupError, LookupOutcome, LookupResult, ProductRecord, SessionHandle};
use crate::xmlrpc::Value;

/// Catalog model queried by the kiosk.
pub const PRODUCT_MODEL: &str = "product.template";

/// Fields requested from `read`, in the order the ERP documents them.
pub const PRODUCT_FIELDS: [&str; 5] = [
    "name",
    "list_price",
    "barcode",
    "default_code",
    "immediately_usable_qty",
];

/// Fault code the ERP uses for `AccessDenied`.
const FAULT_ACCESS_DENIED: i64 = 3;

/// The only model methods this client can invoke.
#[derive(Debug, Clone, Copy)]
enum ReadMethod {
    Search,
    Read,
}

impl ReadMethod {
    fn as_str(self) -> &'static str {
        match self {
            ReadMethod::Search => "search",
            ReadMethod::Read => "read",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedSession {
    uid: i64,
    obtained_at: Instant,
}

/// Client for the ERP's product catalog.
pub struct OdooClient<T = HttpTransport> {
    transport: T,
    credentials: Credentials,
    session_ttl: Option<Duration>,
    cached: Mutex<Option<CachedSession>>,
}

impl OdooClient<HttpTransport> {
    /// Build a client that talks HTTP to the credentials' endpoint.
    pub fn connect(credentials: Credentials, timeout: Option<Duration>) -> Self {
        let transport = HttpTransport::with_timeout(credentials.endpoint().clone(), timeout);
        Self::with_transport(transport, credentials)
    }
}

impl<T: RpcTransport> OdooClient<T> {
    pub fn with_transport(transport: T, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            session_ttl: None,
            cached: Mutex::new(None),
        }
    }

    /// Reuse the session handle for `ttl` instead of logging in on every lookup.
    /// A zero TTL keeps the default re-authenticate-per-lookup behaviour.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = (!ttl.is_zero()).then_some(ttl);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Look up a product by identifier. Never fails; every failure is an outcome.
    pub async fn lookup_product(&self, identifier: &str) -> LookupOutcome {
        let result = self.lookup(identifier).await;
        if matches!(result, Err(LookupError::AuthenticationFailed(_))) {
            self.invalidate_session();
        }

        let outcome = LookupOutcome::from(result);
        match &outcome {
            LookupOutcome::Found { product } => {
                tracing::info!("Found '{}' for identifier {identifier}", product.name)
            }
            LookupOutcome::NotFound => {
                tracing::info!("No active product for identifier {identifier}")
            }
            LookupOutcome::AuthenticationFailed { message } => {
                tracing::warn!("Authentication failed: {message}")
            }
            LookupOutcome::TransportError { message } => {
                tracing::warn!("Lookup of {identifier} failed: {message}")
            }
        }
        outcome
    }

    async fn lookup(&self, identifier: &str) -> LookupResult<Option<ProductRecord>> {
        let session = self.session().await?;
        self.find_by_barcode(&session, identifier).await
    }

    /// Log in against the common service and return the session handle.
    pub async fn authenticate(&self) -> LookupResult<SessionHandle> {
        let params = vec![
            self.credentials.database().into(),
            self.credentials.username().into(),
            self.credentials.secret().into(),
            Value::Struct(BTreeMap::new()),
        ];

        match self
            .transport
            .call(Service::Common, "authenticate", params)
            .await
        {
            Ok(Value::Int(uid)) if uid > 0 => {
                tracing::debug!("Authenticated {} as uid {uid}", self.credentials.username());
                Ok(SessionHandle::new(uid))
            }
            Ok(other) => {
                tracing::debug!("authenticate returned {other:?}");
                Err(LookupError::AuthenticationFailed(
                    "invalid credentials".to_string(),
                ))
            }
            Err(e) => Err(LookupError::AuthenticationFailed(format!(
                "connection error: {e}"
            ))),
        }
    }

    /// Search active products by barcode and read the first match.
    ///
    /// Zero matches is `Ok(None)`. Several matches collapse to the first id
    /// the search returned.
    pub async fn find_by_barcode(
        &self,
        session: &SessionHandle,
        barcode: &str,
    ) -> LookupResult<Option<ProductRecord>> {
        let domain = Value::Array(vec![
            Value::Array(vec!["barcode".into(), "=".into(), barcode.into()]),
            Value::Array(vec!["active".into(), "=".into(), true.into()]),
        ]);
        let found = self
            .execute_kw(session, ReadMethod::Search, vec![domain], None)
            .await?;
        let ids = found
            .as_array()
            .ok_or_else(|| unexpected_shape("search", &found))?;

        let Some(first) = ids.first() else {
            return Ok(None);
        };
        let first = first
            .as_i64()
            .ok_or_else(|| unexpected_shape("search", first))?;
        if ids.len() > 1 {
            tracing::debug!(
                "{} active products share barcode {barcode}; using id {first}",
                ids.len()
            );
        }

        let fields = Value::Array(PRODUCT_FIELDS.iter().map(|f| Value::from(*f)).collect());
        let records = self
            .execute_kw(
                session,
                ReadMethod::Read,
                vec![Value::Array(vec![Value::Int(first)])],
                Some(Value::structure([("fields", fields)])),
            )
            .await?;
        let records = records
            .as_array()
            .ok_or_else(|| unexpected_shape("read", &records))?;

        match records.first() {
            None => Ok(None),
            Some(record) => {
                let members = record
                    .as_struct()
                    .ok_or_else(|| unexpected_shape("read", record))?;
                Ok(Some(product_from_record(members)))
            }
        }
    }

    async fn execute_kw(
        &self,
        session: &SessionHandle,
        method: ReadMethod,
        args: Vec<Value>,
        kwargs: Option<Value>,
    ) -> LookupResult<Value> {
        let mut params = vec![
            self.credentials.database().into(),
            Value::Int(session.uid()),
            self.credentials.secret().into(),
            PRODUCT_MODEL.into(),
            method.as_str().into(),
            Value::Array(args),
        ];
        if let Some(kwargs) = kwargs {
            params.push(kwargs);
        }

        self.transport
            .call(Service::Object, "execute_kw", params)
            .await
            .map_err(|e| match e {
                RpcError::Fault { code, message }
                    if code == FAULT_ACCESS_DENIED && session.is_cached() =>
                {
                    LookupError::AuthenticationFailed(format!("session rejected: {message}"))
                }
                RpcError::Fault { message, .. } => LookupError::Transport(message),
                other => LookupError::Transport(other.to_string()),
            })
    }

    async fn session(&self) -> LookupResult<SessionHandle> {
        if let Some(handle) = self.cached_session() {
            return Ok(handle);
        }
        let handle = self.authenticate().await?;
        if self.session_ttl.is_some() {
            *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = Some(CachedSession {
                uid: handle.uid(),
                obtained_at: Instant::now(),
            });
        }
        Ok(handle)
    }

    fn cached_session(&self) -> Option<SessionHandle> {
        let ttl = self.session_ttl?;
        let mut slot = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        match *slot {
            Some(cached) if cached.obtained_at.elapsed() < ttl => {
                Some(SessionHandle::from_cache(cached.uid))
            }
            Some(_) => {
                tracing::debug!("Cached session expired");
                *slot = None;
                None
            }
            None => None,
        }
    }

    fn invalidate_session(&self) {
        self.cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// Apply the field defaulting policy. The ERP sends `false` for empty fields.
fn product_from_record(record: &BTreeMap<String, Value>) -> ProductRecord {
    let text = |field: &str| {
        record
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let number = |field: &str| record.get(field).and_then(Value::as_f64).unwrap_or(0.0);

    ProductRecord {
        name: text("name"),
        list_price: number("list_price"),
        barcode: text("barcode"),
        internal_code: text("default_code"),
        available_quantity: number("immediately_usable_qty"),
    }
}

fn unexpected_shape(method: &str, value: &Value) -> LookupError {
    LookupError::Transport(format!("unexpected {method} response: {value:?}"))
}
