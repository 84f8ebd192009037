//! # stackfront-llm — backend client layer
//!
//! Holds the single client through which the service talks to Llama Stack,
//! in one of two modes:
//!   - **Library** — the serving engine runs in-process, started from a
//!     YAML config that is enriched first ([`enrich`])
//!   - **Remote** — a separately running service reached over HTTP
//!
//! Per-request provider credentials ("provider data") can be rotated at
//! runtime with [`ClientHolder::update_provider_data`], which merges into
//! what is already there.
//!
//! # Architecture
//!
//! ```text
//! BackendConfig ──load──▶ ClientHolder ──get──▶ ClientHandle
//!                              │                  ├─ Library(Arc<LibraryClient>)   mutated in place
//!                              └─update──────────▶└─ Remote(Arc<RemoteClient>)     replaced on update
//! ```

#![deny(clippy::unwrap_used)]

pub mod client;
pub mod enrich;
pub mod error;
pub mod handle;
pub mod holder;

pub use client::{LibraryClient, LibraryEngine, LibraryLoader, PROVIDER_DATA_HEADER, RemoteClient, RemoteOnly};
pub use enrich::ConfigEnricher;
pub use error::ClientError;
pub use handle::{ClientHandle, ClientMode};
pub use holder::{ClientHolder, SharedClientHolder};
