//! Retrieval-chunk extraction from raw tool output.
//!
//! Retrieval tools answer in one of three shapes:
//!
//! ```text
//! {"chunks": [{"content": "...", "source": "...", "score": 0.9}, ...]}
//! [{"content": "...", "source": "...", "score": 0.9}, ...]
//! free text
//! ```
//!
//! Anything that is not JSON becomes a single chunk holding the raw text.
//! When decoded JSON has an entry of the wrong shape, the chunks read
//! before it are kept and the raw text is appended as one more chunk, so
//! extraction never fails.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::types::RagChunk;

/// Why a decoded document could not be read as chunks.
#[derive(Debug, Error)]
enum ShapeError {
    #[error("`chunks` is not a list")]
    ChunksNotList,
    #[error("`chunks` entry is not an object")]
    EntryNotObject,
    #[error("chunk field `{0}` has an unexpected type")]
    WrongType(&'static str),
}

/// Extract evidence chunks from a retrieval tool's response text.
///
/// `default_source` is attributed to chunks built from raw, unstructured
/// text. Returns an empty list for blank input and for JSON documents that
/// carry no chunks.
#[must_use]
pub fn extract_rag_chunks(text: &str, default_source: &str) -> Vec<RagChunk> {
    let document: Value = match serde_json::from_str(text) {
        Ok(doc) => doc,
        Err(_) => return raw_chunk(text, default_source),
    };

    let mut chunks = Vec::new();
    if let Err(e) = chunks_from_document(&document, &mut chunks) {
        debug!(error = %e, kept = chunks.len(), "retrieval response has unexpected shape, appending raw text");
        chunks.extend(raw_chunk(text, default_source));
    }
    chunks
}

fn raw_chunk(text: &str, source: &str) -> Vec<RagChunk> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        vec![RagChunk::raw(text, source)]
    }
}

/// Push the chunks of `document` onto `out` in order, stopping at the first
/// entry with the wrong shape.
fn chunks_from_document(document: &Value, out: &mut Vec<RagChunk>) -> Result<(), ShapeError> {
    match document {
        Value::Object(map) => match map.get("chunks") {
            Some(Value::Array(entries)) => {
                for entry in entries {
                    let fields = entry.as_object().ok_or(ShapeError::EntryNotObject)?;
                    out.push(chunk_from_fields(fields, String::new)?);
                }
                Ok(())
            }
            Some(_) => Err(ShapeError::ChunksNotList),
            None => Ok(()),
        },
        // Bare list: non-object entries are skipped, and an entry without
        // `content` keeps its whole JSON text as content.
        Value::Array(entries) => {
            for (entry, fields) in entries.iter().filter_map(|e| e.as_object().map(|f| (e, f))) {
                out.push(chunk_from_fields(fields, || entry.to_string())?);
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn chunk_from_fields(
    fields: &Map<String, Value>,
    missing_content: impl FnOnce() -> String,
) -> Result<RagChunk, ShapeError> {
    let content = match fields.get("content") {
        None => missing_content(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(ShapeError::WrongType("content")),
    };

    let source = match fields.get("source") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(ShapeError::WrongType("source")),
    };

    let score = match fields.get("score") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => Some(
            s.trim()
                .parse::<f64>()
                .map_err(|_| ShapeError::WrongType("score"))?,
        ),
        Some(_) => return Err(ShapeError::WrongType("score")),
    };

    Ok(RagChunk {
        content,
        source,
        score,
    })
}
