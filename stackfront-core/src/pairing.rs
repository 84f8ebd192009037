//! Pairing of tool calls with tool responses.
//!
//! Calls and responses arrive as two independent lists and are matched by
//! `call_id`. Output follows call order; response order is irrelevant.

use std::collections::HashMap;

use crate::events::{ToolCall, ToolExecutionStep, ToolResponse};
use crate::rag::extract_rag_chunks;
use crate::types::{
    DEFAULT_RAG_TOOL, DEFAULT_ROUND, RagChunk, SummaryKind, ToolCallSummary, ToolResultSummary, ToolStatus,
};

/// Summaries produced from one [`ToolExecutionStep`].
///
/// `tool_calls` and `tool_results` always have the same length and share
/// ids position by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairedStep {
    /// One entry per distinct call id, in call order.
    pub tool_calls: Vec<ToolCallSummary>,
    /// The matching result for each entry of `tool_calls`.
    pub tool_results: Vec<ToolResultSummary>,
    /// Chunks extracted from responses of `rag_tool`, in order.
    pub rag_chunks: Vec<RagChunk>,
}

/// Pair the calls of `step` with their responses.
///
/// Duplicate call ids keep the position of their first occurrence and the
/// content of their last; duplicate response ids resolve to the last one.
/// Responses from the tool named `rag_tool` with non-empty text are run
/// through [`extract_rag_chunks`]; raw-text chunks are attributed to
/// [`DEFAULT_RAG_TOOL`] whatever `rag_tool` is.
#[must_use]
pub fn pair_tool_calls(step: &ToolExecutionStep, rag_tool: &str) -> PairedStep {
    let mut order: Vec<&str> = Vec::with_capacity(step.tool_calls.len());
    let mut calls: HashMap<&str, &ToolCall> = HashMap::with_capacity(step.tool_calls.len());
    for call in &step.tool_calls {
        if calls.insert(call.call_id.as_str(), call).is_none() {
            order.push(call.call_id.as_str());
        }
    }

    let responses: HashMap<&str, &ToolResponse> = step
        .tool_responses
        .iter()
        .map(|resp| (resp.call_id.as_str(), resp))
        .collect();

    let mut paired = PairedStep::default();
    for id in order {
        let call = calls[id];
        let response = responses.get(id);
        let rendered = response.map(|resp| resp.content.as_text());

        paired.tool_calls.push(ToolCallSummary {
            id: id.to_string(),
            name: call.tool_name.clone(),
            args: call.arguments_map(),
            kind: SummaryKind::ToolCall,
        });

        if call.tool_name == rag_tool {
            if let Some(text) = rendered.as_deref().filter(|t| !t.is_empty()) {
                paired.rag_chunks.extend(extract_rag_chunks(text, DEFAULT_RAG_TOOL));
            }
        }

        paired.tool_results.push(ToolResultSummary {
            id: id.to_string(),
            status: if response.is_some() {
                ToolStatus::Success
            } else {
                ToolStatus::Failure
            },
            content: rendered,
            kind: SummaryKind::ToolResult,
            round: DEFAULT_ROUND,
        });
    }

    paired
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn call(id: &str, tool: &str) -> ToolCall {
        ToolCall {
            call_id: id.into(),
            tool_name: tool.into(),
            arguments: json!({"query": id}),
        }
    }

    fn response(id: &str, text: &str) -> ToolResponse {
        ToolResponse {
            call_id: id.into(),
            tool_name: None,
            content: text.into(),
        }
    }

    #[test]
    fn follows_call_order_not_response_order() {
        let step = ToolExecutionStep {
            tool_calls: vec![call("a", "x"), call("b", "y"), call("c", "z")],
            tool_responses: vec![response("c", "3"), response("a", "1")],
        };
        let paired = pair_tool_calls(&step, DEFAULT_RAG_TOOL);

        let call_ids: Vec<_> = paired.tool_calls.iter().map(|c| c.id.as_str()).collect();
        let result_ids: Vec<_> = paired.tool_results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(call_ids, ["a", "b", "c"]);
        assert_eq!(result_ids, ["a", "b", "c"]);

        assert_eq!(paired.tool_results[0].status, ToolStatus::Success);
        assert_eq!(paired.tool_results[0].content.as_deref(), Some("1"));
        assert_eq!(paired.tool_results[1].status, ToolStatus::Failure);
        assert_eq!(paired.tool_results[1].content, None);
        assert_eq!(paired.tool_results[2].content.as_deref(), Some("3"));
        assert!(paired.tool_results.iter().all(|r| r.round == DEFAULT_ROUND));
    }

    #[test]
    fn duplicate_ids_do_not_crash() {
        let mut second = call("a", "x");
        second.arguments = json!({"query": "second"});
        let step = ToolExecutionStep {
            tool_calls: vec![call("a", "x"), call("b", "x"), second],
            tool_responses: vec![response("a", "first"), response("a", "last")],
        };
        let paired = pair_tool_calls(&step, DEFAULT_RAG_TOOL);

        assert_eq!(paired.tool_calls.len(), 2);
        assert_eq!(paired.tool_calls[0].id, "a");
        assert_eq!(paired.tool_calls[0].args["query"], "second");
        assert_eq!(paired.tool_results[0].content.as_deref(), Some("last"));
    }

    #[test]
    fn retrieval_tool_responses_feed_chunks() {
        let step = ToolExecutionStep {
            tool_calls: vec![call("r1", DEFAULT_RAG_TOOL), call("o", "other"), call("r2", DEFAULT_RAG_TOOL)],
            tool_responses: vec![
                response("r1", r#"{"chunks":[{"content":"one"}]}"#),
                response("o", r#"{"chunks":[{"content":"ignored"}]}"#),
                response("r2", "free text evidence"),
            ],
        };
        let paired = pair_tool_calls(&step, DEFAULT_RAG_TOOL);

        let contents: Vec<_> = paired.rag_chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, ["one", "free text evidence"]);
    }

    #[test]
    fn empty_or_missing_retrieval_response_adds_no_chunks() {
        let step = ToolExecutionStep {
            tool_calls: vec![call("r1", DEFAULT_RAG_TOOL), call("r2", DEFAULT_RAG_TOOL)],
            tool_responses: vec![response("r1", "")],
        };
        let paired = pair_tool_calls(&step, DEFAULT_RAG_TOOL);

        assert!(paired.rag_chunks.is_empty());
        assert_eq!(paired.tool_results[0].status, ToolStatus::Success);
        assert_eq!(paired.tool_results[0].content.as_deref(), Some(""));
        assert_eq!(paired.tool_results[1].status, ToolStatus::Failure);
    }

    #[test]
    fn custom_retrieval_tool_name() {
        let step = ToolExecutionStep {
            tool_calls: vec![call("r", "file_search")],
            tool_responses: vec![response("r", "evidence")],
        };
        let paired = pair_tool_calls(&step, "file_search");
        assert_eq!(paired.rag_chunks, vec![RagChunk::raw("evidence", DEFAULT_RAG_TOOL)]);
    }

    #[test]
    fn empty_step_yields_empty_pairs() {
        let paired = pair_tool_calls(&ToolExecutionStep::default(), DEFAULT_RAG_TOOL);
        assert_eq!(paired, PairedStep::default());
    }
}
