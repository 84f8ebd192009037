//! Backend clients — remote (HTTP service) and library (in-process engine).
//!
//! Both carry provider data, but differently: a remote client sends it as
//! the JSON-encoded [`PROVIDER_DATA_HEADER`] default header, a library
//! client keeps it as an in-memory map handed to the engine on every call.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use stackfront_core::ProviderData;
use stackfront_core::config::ApiKey;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// Header carrying JSON-encoded provider data to a remote backend.
pub const PROVIDER_DATA_HEADER: &str = "X-LlamaStack-Provider-Data";

// ---------------------------------------------------------------------------
// Remote client
// ---------------------------------------------------------------------------

/// HTTP client for a separately running Llama Stack service.
///
/// Instances are immutable: changing default headers produces a new client
/// that shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    base_url: String,
    api_key: Option<ApiKey>,
    default_headers: BTreeMap<String, String>,
    timeout_ms: u64,
}

impl RemoteClient {
    /// Create a client for `base_url` with no default headers.
    ///
    /// # Errors
    /// Returns [`ClientError::RequestFailed`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, api_key: Option<ApiKey>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
            default_headers: BTreeMap::new(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Service base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Headers attached to every request.
    #[must_use]
    pub fn default_headers(&self) -> &BTreeMap<String, String> {
        &self.default_headers
    }

    /// Provider data decoded from [`PROVIDER_DATA_HEADER`]; empty when the
    /// header is absent or unreadable.
    #[must_use]
    pub fn provider_data(&self) -> ProviderData {
        ProviderData::from_header_value(
            self.default_headers.get(PROVIDER_DATA_HEADER).map(String::as_str),
        )
    }

    /// A copy of this client with `headers` as its default headers.
    #[must_use]
    pub fn with_default_headers(&self, headers: BTreeMap<String, String>) -> Self {
        Self {
            default_headers: headers,
            ..self.clone()
        }
    }

    /// A copy of this client whose provider-data header encodes `data`.
    /// Every other default header is carried over unchanged.
    #[must_use]
    pub fn with_provider_data(&self, data: &ProviderData) -> Self {
        let mut headers = self.default_headers.clone();
        headers.insert(PROVIDER_DATA_HEADER.to_string(), data.to_header_value());
        self.with_default_headers(headers)
    }

    /// Start a request to `path` with auth and default headers applied.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidHeader`] if a default header name or
    /// value cannot be sent.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut builder = self.http.request(method, url);

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose());
        }
        for (name, value) in &self.default_headers {
            let name_h = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::InvalidHeader(format!("name `{name}`")))?;
            let value_h = HeaderValue::from_str(value)
                .map_err(|_| ClientError::InvalidHeader(format!("value for `{name}`")))?;
            builder = builder.header(name_h, value_h);
        }
        Ok(builder)
    }

    /// `GET path` and decode the JSON body.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, or a body
    /// that is not JSON.
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        self.send(self.request(Method::GET, path)?).await
    }

    /// `POST path` with a JSON body and decode the JSON response.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, or a body
    /// that is not JSON.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(self.request(Method::POST, path)?.json(body)).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let start = Instant::now();
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("Backend request timed out after {}ms", self.timeout_ms);
                ClientError::Timeout(self.timeout_ms)
            } else {
                warn!("Backend request failed: {}", e);
                ClientError::from(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Backend returned error: HTTP {}", status);
            return Err(ClientError::RequestFailed(format!("HTTP {status}: {body}")));
        }

        let json = response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::RequestFailed(format!("response is not JSON: {e}")))?;
        debug!(latency_ms = start.elapsed().as_millis(), "backend call complete");
        Ok(json)
    }
}

// ---------------------------------------------------------------------------
// Library client
// ---------------------------------------------------------------------------

/// An initialised in-process serving engine.
///
/// The engine itself is owned by whatever embeds it; this layer only holds
/// it and pairs it with provider data.
pub trait LibraryEngine: Send + Sync + fmt::Debug {
    /// Config file the engine was started from.
    fn config_path(&self) -> &Path;
}

/// Starts library engines.
pub trait LibraryLoader {
    /// Start an engine from the config at `config_path`.
    fn initialize(
        &self,
        config_path: &Path,
    ) -> impl Future<Output = Result<Arc<dyn LibraryEngine>>> + Send;
}

/// Loader for deployments that only ever talk to a remote service.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteOnly;

impl LibraryLoader for RemoteOnly {
    async fn initialize(&self, config_path: &Path) -> Result<Arc<dyn LibraryEngine>> {
        Err(ClientError::Initialization(format!(
            "no library engine available to load {}",
            config_path.display()
        )))
    }
}

/// In-process client: an engine plus mutable provider data.
#[derive(Debug)]
pub struct LibraryClient {
    engine: Arc<dyn LibraryEngine>,
    provider_data: RwLock<ProviderData>,
}

impl LibraryClient {
    /// Wrap an engine with empty provider data.
    #[must_use]
    pub fn new(engine: Arc<dyn LibraryEngine>) -> Self {
        Self {
            engine,
            provider_data: RwLock::new(ProviderData::new()),
        }
    }

    /// The embedded engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn LibraryEngine> {
        &self.engine
    }

    /// Snapshot of the current provider data.
    #[must_use]
    pub fn provider_data(&self) -> ProviderData {
        self.provider_data.read().clone()
    }

    /// Replace the provider data wholesale.
    pub fn set_provider_data(&self, data: ProviderData) {
        *self.provider_data.write() = data;
    }

    /// Merge `updates` into the provider data in place.
    pub fn merge_provider_data<I, K, V>(&self, updates: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.provider_data.write().merge(updates);
    }
}
