//! Backend event shapes consumed by the turn-summary builder.
//!
//! These mirror what the Llama Stack client emits for one tool-execution
//! step of an agent turn and deserialise straight from its JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator placed between items when flattening interleaved content.
const ITEM_SEPARATOR: &str = " ";

/// Placeholder text for image content.
const IMAGE_PLACEHOLDER: &str = "<image>";

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id, echoed by the matching [`ToolResponse`].
    pub call_id: String,
    /// Tool to invoke.
    pub tool_name: String,
    /// Arguments: usually an object, sometimes a raw string.
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    /// Arguments as a JSON object.
    ///
    /// Non-object arguments are wrapped as `{"args": "<text>"}`.
    #[must_use]
    pub fn arguments_map(&self) -> Map<String, Value> {
        match &self.arguments {
            Value::Object(map) => map.clone(),
            Value::String(s) => wrap_args(s.clone()),
            other => wrap_args(other.to_string()),
        }
    }
}

fn wrap_args(text: String) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("args".to_string(), Value::String(text));
    map
}

/// The output of a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Id of the [`ToolCall`] this answers.
    pub call_id: String,
    /// Tool that produced the response, when reported.
    #[serde(default)]
    pub tool_name: Option<String>,
    /// Response payload.
    pub content: InterleavedContent,
}

/// One step of tool execution: the calls the model made and whatever
/// responses came back, each in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolExecutionStep {
    /// Calls requested by the model.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// Responses received.
    #[serde(default)]
    pub tool_responses: Vec<ToolResponse>,
}

/// A single typed content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// An image, by URL or inline data. Only its presence is rendered.
    Image {
        /// Image payload as sent by the backend.
        #[serde(default)]
        image: Value,
    },
}

impl ContentItem {
    /// Text rendering of this item.
    #[must_use]
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } => text,
            Self::Image { .. } => IMAGE_PLACEHOLDER,
        }
    }
}

/// Response content: a bare string, one item, or a list of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InterleavedContent {
    /// Bare string.
    Text(String),
    /// One typed item.
    Item(ContentItem),
    /// Several typed items.
    Items(Vec<ContentItem>),
}

impl InterleavedContent {
    /// Flatten to a single human-readable string.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Item(item) => item.as_text().to_string(),
            Self::Items(items) => items
                .iter()
                .map(ContentItem::as_text)
                .collect::<Vec<_>>()
                .join(ITEM_SEPARATOR),
        }
    }
}

impl From<&str> for InterleavedContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for InterleavedContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// The assistant message that closes an inference step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    /// Generated content.
    pub content: InterleavedContent,
    /// Why generation stopped (`end_of_turn`, `end_of_message`, ...).
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// Tool calls the model asked for.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}
