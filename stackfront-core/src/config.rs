//! Configuration for stackfront.
//!
//! Maps directly to `stackfront.toml`. Every section is optional; a missing
//! section takes its defaults.
//!
//! ```toml
//! [general]
//! log_level = "debug"
//!
//! [backend]
//! use_as_library_client = true
//! library_client_config_path = "run.yaml"
//!
//! [[rag.byok]]
//! vector_db_id = "product-docs"
//! db_path = "/var/lib/rag/product-docs.faiss"
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StackfrontError};
use crate::types::DEFAULT_RAG_TOOL;

/// Top-level stackfront configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackfrontConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Which backend client to build and how to reach it.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Retrieval-augmentation settings.
    #[serde(default)]
    pub rag: RagConfig,
}

impl StackfrontConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `StackfrontError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| StackfrontError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error. `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log line format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

/// An API key that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**********)")
    }
}

/// Backend client selection.
///
/// Exactly one mode is active: library mode when `use_as_library_client`
/// is set (and then `library_client_config_path` is required), remote mode
/// otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Run the serving engine in-process instead of talking to a service.
    #[serde(default)]
    pub use_as_library_client: bool,
    /// Engine config file for library mode.
    #[serde(default)]
    pub library_client_config_path: Option<PathBuf>,
    /// Service base URL for remote mode.
    #[serde(default)]
    pub url: Option<String>,
    /// Optional bearer token for remote mode.
    #[serde(default)]
    pub api_key: Option<ApiKey>,
    /// Per-request timeout for remote calls, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            use_as_library_client: false,
            library_client_config_path: None,
            url: None,
            api_key: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl BackendConfig {
    /// Remote-mode configuration for `url`.
    #[must_use]
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Library-mode configuration reading the engine config at `path`.
    #[must_use]
    pub fn library(path: impl Into<PathBuf>) -> Self {
        Self {
            use_as_library_client: true,
            library_client_config_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Attach an API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(ApiKey::new(key));
        self
    }

    /// The URL remote mode connects to, falling back to the local default.
    #[must_use]
    pub fn url_or_default(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_BACKEND_URL)
    }

    /// Check the mode-specific requirements.
    ///
    /// # Errors
    /// Returns `StackfrontError::Config` when library mode is requested
    /// without a config path, or when `timeout_ms` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.use_as_library_client && self.library_client_config_path.is_none() {
            return Err(StackfrontError::Config(
                "library_client_config_path is required for library mode".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(StackfrontError::Config("timeout_ms must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Base URL used by remote mode when none is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8321";

/// Retrieval-augmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Name of the tool whose responses carry retrieved chunks.
    #[serde(default = "default_rag_tool")]
    pub tool_name: String,
    /// Bring-your-own-knowledge stores injected into library-mode configs.
    #[serde(default)]
    pub byok: Vec<ByokStore>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            tool_name: DEFAULT_RAG_TOOL.to_string(),
            byok: Vec::new(),
        }
    }
}

/// A pre-built vector store registered with the library engine at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByokStore {
    /// Identifier the engine registers the store under.
    pub vector_db_id: String,
    /// On-disk location of the index.
    pub db_path: PathBuf,
    /// Embedding model the index was built with.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Embedding vector dimensions.
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: u32,
    /// Provider id; derived from `vector_db_id` when absent.
    #[serde(default)]
    pub provider_id: Option<String>,
}

impl ByokStore {
    /// Provider id used for the engine's `vector_io` entry.
    #[must_use]
    pub fn provider_id(&self) -> String {
        self.provider_id
            .clone()
            .unwrap_or_else(|| format!("byok_{}", self.vector_db_id))
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_rag_tool() -> String { DEFAULT_RAG_TOOL.to_string() }
fn default_embedding_model() -> String { "sentence-transformers/all-mpnet-base-v2".to_string() }
fn default_embedding_dimension() -> u32 { 768 }
fn default_timeout_ms() -> u64 { 180_000 }
