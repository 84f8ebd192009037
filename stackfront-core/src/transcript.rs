//! Stored conversation turns and their REST transcript shape.
//!
//! ```json
//! {
//!   "provider": "openai", "model": "gpt-4o-mini",
//!   "started_at": "2024-01-01T00:00:00Z", "completed_at": "2024-01-01T00:00:05Z",
//!   "messages": [
//!     {"type": "user", "content": "query"},
//!     {"type": "assistant", "content": "response"}
//!   ]
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::summary::TurnSummary;

/// One stored question/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// What the user asked.
    pub query: String,
    /// What the model answered.
    pub response: String,
    /// Provider that served the turn.
    pub provider: String,
    /// Model that served the turn.
    pub model: String,
    /// When the request arrived.
    pub started_at: DateTime<Utc>,
    /// When the answer was complete.
    pub completed_at: DateTime<Utc>,
}

impl ConversationEntry {
    /// Record a finished turn.
    #[must_use]
    pub fn from_turn(
        query: impl Into<String>,
        summary: &TurnSummary,
        provider: impl Into<String>,
        model: impl Into<String>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            query: query.into(),
            response: summary.llm_response.clone(),
            provider: provider.into(),
            model: model.into(),
            started_at,
            completed_at,
        }
    }

    /// The user/assistant transcript returned by the conversations API.
    #[must_use]
    pub fn transcript(&self) -> Transcript {
        Transcript {
            provider: self.provider.clone(),
            model: self.model.clone(),
            started_at: iso8601(self.started_at),
            completed_at: iso8601(self.completed_at),
            messages: vec![
                TranscriptMessage {
                    role: MessageRole::User,
                    content: self.query.clone(),
                },
                TranscriptMessage {
                    role: MessageRole::Assistant,
                    content: self.response.clone(),
                },
            ],
        }
    }
}

fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The caller.
    User,
    /// The model.
    Assistant,
}

/// One message of a [`Transcript`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    /// Author.
    #[serde(rename = "type")]
    pub role: MessageRole,
    /// Message text.
    pub content: String,
}

/// REST representation of a [`ConversationEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Provider that served the turn.
    pub provider: String,
    /// Model that served the turn.
    pub model: String,
    /// ISO-8601 start time.
    pub started_at: String,
    /// ISO-8601 completion time.
    pub completed_at: String,
    /// User message followed by assistant message.
    pub messages: Vec<TranscriptMessage>,
}
