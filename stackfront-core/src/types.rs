//! Core type definitions for turn summaries and provider data.
//!
//! All types serialise to the JSON shapes the REST layer stores and returns.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Tool whose responses carry retrieved evidence chunks.
pub const DEFAULT_RAG_TOOL: &str = "knowledge_search";

/// Placeholder for [`ToolResultSummary::round`]; multi-round numbering is not modelled.
pub const DEFAULT_ROUND: u32 = 1;

// ---------------------------------------------------------------------------
// Provider data
// ---------------------------------------------------------------------------

/// Caller/session identification attached to every backend call
/// (for example rotated `azure_api_key` credentials).
///
/// Keys are opaque. Merging is key-wise last-write-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderData(BTreeMap<String, String>);

impl ProviderData {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up one key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no keys are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge `updates` in, overwriting keys that already exist and keeping
    /// every key `updates` does not mention.
    pub fn merge<I, K, V>(&mut self, updates: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in updates {
            self.0.insert(key.into(), value.into());
        }
    }

    /// Decode the JSON header form.
    ///
    /// Absent, malformed, or non-object input yields an empty map. Non-string
    /// values inside an object are kept as their JSON text.
    #[must_use]
    pub fn from_header_value(value: Option<&str>) -> Self {
        let Some(raw) = value else {
            return Self::new();
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map
                .into_iter()
                .map(|(k, v)| match v {
                    Value::String(s) => (k, s),
                    other => (k, other.to_string()),
                })
                .collect(),
            Ok(other) => {
                debug!(kind = json_kind(&other), "provider data header is not an object, starting empty");
                Self::new()
            }
            Err(e) => {
                debug!(error = %e, "provider data header is not valid JSON, starting empty");
                Self::new()
            }
        }
    }

    /// Encode as the JSON object carried in the provider-data header.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl FromIterator<(String, String)> for ProviderData {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for ProviderData {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<'a> IntoIterator for &'a ProviderData {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tool call / result summaries
// ---------------------------------------------------------------------------

/// Discriminator serialised as the `type` field of a summary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    /// A [`ToolCallSummary`].
    ToolCall,
    /// A [`ToolResultSummary`].
    ToolResult,
}

/// A tool call made while generating a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallSummary {
    /// Correlation id shared with at most one [`ToolResultSummary`].
    pub id: String,
    /// Name of the tool called.
    pub name: String,
    /// Arguments passed to the tool.
    #[serde(default)]
    pub args: Map<String, Value>,
    /// Always [`SummaryKind::ToolCall`].
    #[serde(rename = "type")]
    pub kind: SummaryKind,
}

/// Outcome of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// The backend returned a response for the call.
    Success,
    /// No response with a matching id was found.
    Failure,
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failure => f.write_str("failure"),
        }
    }
}

/// The result of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultSummary {
    /// Matches the corresponding [`ToolCallSummary::id`].
    pub id: String,
    /// [`ToolStatus::Failure`] iff no response was found.
    pub status: ToolStatus,
    /// Rendered response text, `None` when there was no response.
    pub content: Option<String>,
    /// Always [`SummaryKind::ToolResult`].
    #[serde(rename = "type")]
    pub kind: SummaryKind,
    /// Tool-execution round. Currently always [`DEFAULT_ROUND`].
    pub round: u32,
}

// ---------------------------------------------------------------------------
// Retrieved evidence
// ---------------------------------------------------------------------------

/// One unit of retrieved evidence used to ground a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagChunk {
    /// Chunk text. Empty when the source omitted it.
    pub content: String,
    /// Source document or URL.
    #[serde(default)]
    pub source: Option<String>,
    /// Relevance score.
    #[serde(default)]
    pub score: Option<f64>,
}

impl RagChunk {
    /// A chunk holding raw tool output attributed to `source`.
    #[must_use]
    pub fn raw(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: Some(source.into()),
            score: None,
        }
    }
}
