//! Client holder — owns the one active backend client.
//!
//! Built once by the application at startup and shared (typically in an
//! `Arc`) with every request handler:
//!
//! ```text
//! startup:   holder.load(&config.backend, &loader).await?
//! request:   let client = holder.get()?;                  // read lock
//! rotation:  holder.update_provider_data(creds)?;         // write lock
//! ```
//!
//! `load` should finish before traffic is accepted. A later `load` replaces
//! the handle wholesale.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use stackfront_core::config::BackendConfig;
use tracing::{debug, error, info, warn};

use crate::client::{LibraryClient, LibraryLoader, RemoteClient};
use crate::enrich::ConfigEnricher;
use crate::error::{ClientError, Result};
use crate::handle::{ClientHandle, ClientMode};

/// Holder of the active [`ClientHandle`].
#[derive(Debug, Default)]
pub struct ClientHolder {
    current: RwLock<Option<ClientHandle>>,
    enricher: ConfigEnricher,
}

impl ClientHolder {
    /// An empty holder enriching library configs with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty holder using `enricher` for library configs.
    #[must_use]
    pub fn with_enricher(enricher: ConfigEnricher) -> Self {
        Self {
            current: RwLock::new(None),
            enricher,
        }
    }

    /// Build a client from `config` and make it the active one.
    ///
    /// Library mode enriches the engine config, then asks `loader` to start
    /// the engine. Remote mode builds an HTTP client for `config.url`.
    /// On error the previous handle, if any, stays active.
    ///
    /// # Errors
    /// - [`ClientError::Configuration`] if library mode has no config path
    /// - whatever `loader` or the HTTP client builder returns
    pub async fn load<L: LibraryLoader>(&self, config: &BackendConfig, loader: &L) -> Result<()> {
        if let Err(e) = config.validate() {
            error!("{}", e);
            return Err(e.into());
        }

        let handle = if let Some(path) = config
            .library_client_config_path
            .as_ref()
            .filter(|_| config.use_as_library_client)
        {
            info!("Using Llama Stack as library client");
            let enricher = self.enricher.clone();
            let input = path.clone();
            let enriched = match tokio::task::spawn_blocking(move || enricher.enrich(&input)).await {
                Ok(enriched) => enriched,
                Err(e) => {
                    warn!("Config enrichment task failed, using original: {}", e);
                    path.clone()
                }
            };
            let engine = loader.initialize(&enriched).await?;
            ClientHandle::from(LibraryClient::new(engine))
        } else {
            let url = config.url_or_default();
            info!(url, "Using Llama Stack running as a service");
            ClientHandle::from(RemoteClient::new(
                url,
                config.api_key.clone(),
                Duration::from_millis(config.timeout_ms),
            )?)
        };

        self.set_client(handle);
        Ok(())
    }

    /// The active client.
    ///
    /// # Errors
    /// [`ClientError::Uninitialized`] before the first successful `load`.
    pub fn get(&self) -> Result<ClientHandle> {
        self.current.read().clone().ok_or(ClientError::Uninitialized)
    }

    /// Replace the active client.
    pub fn set_client(&self, handle: ClientHandle) {
        debug!(mode = %handle.mode(), "installing backend client");
        *self.current.write() = Some(handle);
    }

    /// Whether a client has been loaded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.current.read().is_some()
    }

    /// Mode of the active client, if any.
    #[must_use]
    pub fn mode(&self) -> Option<ClientMode> {
        self.current.read().as_ref().map(ClientHandle::mode)
    }

    /// Merge `updates` into the active client's provider data and return
    /// the resulting client, which is also installed as the active one.
    ///
    /// Keys not in `updates` are kept. A library client is updated in
    /// place; a remote client is replaced by a copy whose provider-data
    /// header holds the merged map, so handles obtained earlier keep the
    /// old header. The whole read-merge-write runs under the write lock.
    ///
    /// # Errors
    /// [`ClientError::Uninitialized`] before the first successful `load`.
    pub fn update_provider_data<I, K, V>(&self, updates: I) -> Result<ClientHandle>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut current = self.current.write();
        let handle = current.as_ref().ok_or(ClientError::Uninitialized)?;
        let updated = handle.merge_provider_data(updates);
        debug!(
            mode = %updated.mode(),
            replaced = !updated.same_client(handle),
            "provider data updated"
        );
        *current = Some(updated.clone());
        Ok(updated)
    }
}

/// Share a holder between request handlers.
pub type SharedClientHolder = Arc<ClientHolder>;
