//! Model-specific tool-call extraction.
//!
//! Most models are handled by the backend's own parser. Granite models put
//! their calls on the completion message in a way that parser misses, so
//! they get a dedicated one that reads `tool_calls` directly.

use crate::events::{CompletionMessage, ToolCall};

/// A tool-call parser override for a model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolParser {
    /// Reads `tool_calls` straight off the completion message.
    Granite,
}

impl ToolParser {
    /// Parser override for `model_id`, if its family needs one.
    ///
    /// Matching is a case-insensitive prefix check.
    #[must_use]
    pub fn for_model(model_id: &str) -> Option<Self> {
        let prefix = "granite";
        model_id
            .get(..prefix.len())
            .filter(|head| head.eq_ignore_ascii_case(prefix))
            .map(|_| Self::Granite)
    }

    /// Tool calls carried by `message`; empty when there is no message.
    #[must_use]
    pub fn tool_calls(self, message: Option<&CompletionMessage>) -> Vec<ToolCall> {
        match self {
            Self::Granite => message.map(|m| m.tool_calls.clone()).unwrap_or_default(),
        }
    }
}
