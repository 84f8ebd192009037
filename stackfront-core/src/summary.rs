//! Structured summary of one conversational turn.

use serde::{Deserialize, Serialize};

use crate::config::RagConfig;
use crate::events::ToolExecutionStep;
use crate::pairing::pair_tool_calls;
use crate::types::{DEFAULT_RAG_TOOL, RagChunk, ToolCallSummary, ToolResultSummary};

/// LLM text plus every tool call, tool result and retrieved chunk of a turn.
///
/// Built by feeding it tool-execution steps as they complete. Entries are
/// only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// Final text produced by the model.
    pub llm_response: String,
    /// Tool calls, in the order they were made.
    #[serde(default)]
    pub tool_calls: Vec<ToolCallSummary>,
    /// One result per entry of `tool_calls`.
    #[serde(default)]
    pub tool_results: Vec<ToolResultSummary>,
    /// Evidence returned by the retrieval tool.
    #[serde(default)]
    pub rag_chunks: Vec<RagChunk>,
}

impl TurnSummary {
    /// Start a summary for a turn whose answer is `llm_response`.
    #[must_use]
    pub fn new(llm_response: impl Into<String>) -> Self {
        Self {
            llm_response: llm_response.into(),
            ..Self::default()
        }
    }

    /// Append one tool-execution step, extracting chunks from
    /// [`DEFAULT_RAG_TOOL`] responses.
    pub fn append_tool_execution_step(&mut self, step: &ToolExecutionStep) {
        self.append_tool_execution_step_with(step, DEFAULT_RAG_TOOL);
    }

    /// Append one tool-execution step, extracting chunks from responses of
    /// the tool named `rag_tool`.
    pub fn append_tool_execution_step_with(&mut self, step: &ToolExecutionStep, rag_tool: &str) {
        let paired = pair_tool_calls(step, rag_tool);
        self.tool_calls.extend(paired.tool_calls);
        self.tool_results.extend(paired.tool_results);
        self.rag_chunks.extend(paired.rag_chunks);
    }

    /// Append one tool-execution step using the retrieval tool configured
    /// in `[rag]`.
    pub fn append_tool_execution_step_for(&mut self, step: &ToolExecutionStep, rag: &RagConfig) {
        self.append_tool_execution_step_with(step, &rag.tool_name);
    }

    /// Whether any tool was called during the turn.
    #[must_use]
    pub fn has_tool_activity(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
