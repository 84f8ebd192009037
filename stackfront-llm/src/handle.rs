//! The mode-tagged client handle held by [`ClientHolder`](crate::ClientHolder).

use std::fmt;
use std::sync::Arc;

use stackfront_core::ProviderData;

use crate::client::{LibraryClient, RemoteClient};

/// Which kind of backend client is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMode {
    /// In-process serving engine.
    Library,
    /// Separately running service reached over HTTP.
    Remote,
}

impl fmt::Display for ClientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library => f.write_str("library"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

/// The active backend client.
///
/// Cloning is cheap and yields a handle to the *same* client; use
/// [`ClientHandle::same_client`] to compare identity.
#[derive(Debug, Clone)]
pub enum ClientHandle {
    /// In-process client; provider data is mutated in place.
    Library(Arc<LibraryClient>),
    /// HTTP client; provider data lives in an immutable default header, so
    /// changing it means replacing the client.
    Remote(Arc<RemoteClient>),
}

impl ClientHandle {
    /// Mode of this handle.
    #[must_use]
    pub fn mode(&self) -> ClientMode {
        match self {
            Self::Library(_) => ClientMode::Library,
            Self::Remote(_) => ClientMode::Remote,
        }
    }

    /// Current provider data.
    #[must_use]
    pub fn provider_data(&self) -> ProviderData {
        match self {
            Self::Library(client) => client.provider_data(),
            Self::Remote(client) => client.provider_data(),
        }
    }

    /// Whether both handles point at the same client instance.
    #[must_use]
    pub fn same_client(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Library(a), Self::Library(b)) => Arc::ptr_eq(a, b),
            (Self::Remote(a), Self::Remote(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The library client, if this is a library handle.
    #[must_use]
    pub fn as_library(&self) -> Option<&Arc<LibraryClient>> {
        match self {
            Self::Library(client) => Some(client),
            Self::Remote(_) => None,
        }
    }

    /// The remote client, if this is a remote handle.
    #[must_use]
    pub fn as_remote(&self) -> Option<&Arc<RemoteClient>> {
        match self {
            Self::Remote(client) => Some(client),
            Self::Library(_) => None,
        }
    }

    /// Merge `updates` into this handle's provider data.
    ///
    /// Library handles are updated in place and returned as-is. Remote
    /// handles yield a new client whose provider-data header is the merged
    /// map; the receiver is left untouched.
    #[must_use]
    pub fn merge_provider_data<I, K, V>(&self, updates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        match self {
            Self::Library(client) => {
                client.merge_provider_data(updates);
                self.clone()
            }
            Self::Remote(client) => {
                let mut data = client.provider_data();
                data.merge(updates);
                Self::Remote(Arc::new(client.with_provider_data(&data)))
            }
        }
    }
}

impl From<LibraryClient> for ClientHandle {
    fn from(client: LibraryClient) -> Self {
        Self::Library(Arc::new(client))
    }
}

impl From<RemoteClient> for ClientHandle {
    fn from(client: RemoteClient) -> Self {
        Self::Remote(Arc::new(client))
    }
}
