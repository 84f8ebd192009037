//! # stackfront core
//!
//! Turns the raw tool-execution events of a Llama Stack agent turn into a
//! normalized [`TurnSummary`]:
//!
//! - **Pairing** — tool calls matched with their responses by call id,
//!   in call order ([`pairing`])
//! - **Retrieval chunks** — evidence pulled out of `knowledge_search`
//!   responses, whatever shape they come in ([`rag`])
//! - **Transcripts** — the stored user/assistant exchange served by the
//!   conversations API ([`transcript`])
//!
//! Also home to the shared data model ([`ProviderData`], summaries), the
//! `stackfront.toml` configuration and logging setup.
//!
//! ## Failure contract
//!
//! Building a summary never fails. Malformed tool output degrades to a
//! single raw-text chunk instead of an error.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod pairing;
pub mod rag;
pub mod summary;
pub mod tool_parser;
pub mod transcript;
pub mod types;

pub use config::StackfrontConfig;
pub use error::StackfrontError;
pub use events::{CompletionMessage, InterleavedContent, ToolCall, ToolExecutionStep, ToolResponse};
pub use summary::TurnSummary;
pub use types::*;
