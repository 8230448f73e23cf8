//! Normalization of backend fragment shapes.
//!
//! Transports deliver whatever their backend speaks. A [`StreamParser`] maps
//! those shapes onto canonical [`StreamChunk`]s and is the one place new wire
//! formats are added. Canonical input passes through untouched and anything
//! unrecognized is dropped without an error.

use chunkflow_core::{StreamChunk, ToolCallPayload};
use serde_json::Value;

/// A fragment as received from a source, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingChunk {
    /// An already-canonical fragment.
    Canonical(StreamChunk),
    /// A backend-native JSON fragment.
    Json(Value),
}

impl From<StreamChunk> for IncomingChunk {
    fn from(chunk: StreamChunk) -> Self {
        Self::Canonical(chunk)
    }
}

impl From<Value> for IncomingChunk {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Maps incoming fragments to canonical fragments.
pub trait StreamParser: Send + Sync {
    /// Normalize one fragment. `None` drops it.
    fn parse_chunk(&self, incoming: IncomingChunk) -> Option<StreamChunk>;
}

impl<F> StreamParser for F
where
    F: Fn(IncomingChunk) -> Option<StreamChunk> + Send + Sync,
{
    fn parse_chunk(&self, incoming: IncomingChunk) -> Option<StreamChunk> {
        self(incoming)
    }
}

/// The default normalizer.
///
/// Understands the canonical JSON form plus the adapter shapes
/// `{"type": "content", "content": ..}` and
/// `{"type": "tool_call", "index": .., "toolCall": {..}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStreamParser;

impl StreamParser for DefaultStreamParser {
    fn parse_chunk(&self, incoming: IncomingChunk) -> Option<StreamChunk> {
        match incoming {
            IncomingChunk::Canonical(chunk) => Some(chunk),
            IncomingChunk::Json(value) => {
                let chunk = normalize_json(&value);
                if chunk.is_none() {
                    tracing::trace!(chunk = %value, "Dropping unrecognized chunk");
                }
                chunk
            }
        }
    }
}

fn normalize_json(value: &Value) -> Option<StreamChunk> {
    let tag = value.get("type").and_then(Value::as_str)?;

    match tag {
        "content" => value
            .get("content")
            .and_then(Value::as_str)
            .filter(|content| !content.is_empty())
            .map(StreamChunk::text),
        "tool_call" => tool_call_chunk(value),
        "tool-call-delta" => canonical(value).or_else(|| tool_call_chunk(value)),
        "approval-requested" => canonical(value).or_else(|| nested_approval(value)),
        _ if StreamChunk::is_canonical_kind(tag) => canonical(value),
        _ => None,
    }
}

fn canonical(value: &Value) -> Option<StreamChunk> {
    StreamChunk::from_value(value.clone()).ok()
}

fn tool_call_chunk(value: &Value) -> Option<StreamChunk> {
    let tool_call: ToolCallPayload = serde_json::from_value(value.get("toolCall")?.clone()).ok()?;
    let tool_call_index = value
        .get("index")
        .or_else(|| value.get("toolCallIndex"))
        .and_then(Value::as_u64)
        .and_then(|index| usize::try_from(index).ok());

    Some(StreamChunk::ToolCallDelta {
        tool_call_index,
        tool_call,
    })
}

/// Approval requests from servers that nest the id as `approval: {id}`.
fn nested_approval(value: &Value) -> Option<StreamChunk> {
    let field = |name: &str| value.get(name).and_then(Value::as_str);

    Some(StreamChunk::approval_requested(
        field("toolCallId")?,
        field("toolName")?,
        value.get("input").cloned().unwrap_or(Value::Null),
        value.get("approval")?.get("id")?.as_str()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(value: Value) -> Option<StreamChunk> {
        DefaultStreamParser.parse_chunk(value.into())
    }

    #[test]
    fn test_canonical_chunks_pass_through_unchanged() {
        let chunks = vec![
            StreamChunk::text("Hello"),
            StreamChunk::tool_call_delta("call_1", "search", "{\"q\""),
            StreamChunk::done(),
            StreamChunk::approval_requested("call_1", "rm", json!({"path": "/tmp"}), "ap_1"),
            StreamChunk::tool_input_available("call_1", "search", json!({"q": "rust"})),
        ];

        for chunk in chunks {
            assert_eq!(DefaultStreamParser.parse_chunk(chunk.clone().into()), Some(chunk.clone()));

            // the JSON form of a canonical chunk normalizes to the same chunk
            let value = serde_json::to_value(&chunk).unwrap();
            assert_eq!(parse(value), Some(chunk));
        }
    }

    #[test]
    fn test_content_becomes_text() {
        assert_eq!(
            parse(json!({"type": "content", "content": "Hello", "delta": "Hello"})),
            Some(StreamChunk::text("Hello"))
        );
        assert_eq!(parse(json!({"type": "content", "content": ""})), None);
        assert_eq!(parse(json!({"type": "content"})), None);
    }

    #[test]
    fn test_tool_call_becomes_delta() {
        let chunk = parse(json!({
            "type": "tool_call",
            "index": 2,
            "toolCall": {
                "id": "call_9",
                "type": "function",
                "function": {"name": "lookup", "arguments": "{\"id\":"}
            }
        }));

        assert_eq!(
            chunk,
            Some(StreamChunk::ToolCallDelta {
                tool_call_index: Some(2),
                tool_call: ToolCallPayload::new("call_9", "lookup", "{\"id\":"),
            })
        );
    }

    #[test]
    fn test_tool_call_index_fallback() {
        let chunk = parse(json!({
            "type": "tool_call",
            "toolCallIndex": 1,
            "toolCall": {"id": "call_1", "function": {"name": "f", "arguments": ""}}
        }))
        .unwrap();
        assert!(matches!(
            chunk,
            StreamChunk::ToolCallDelta {
                tool_call_index: Some(1),
                ..
            }
        ));

        assert_eq!(parse(json!({"type": "tool_call", "index": 0})), None);
    }

    #[test]
    fn test_nested_approval_shape() {
        let chunk = parse(json!({
            "type": "approval-requested",
            "toolCallId": "call_1",
            "toolName": "delete_file",
            "input": {"path": "a.txt"},
            "approval": {"id": "ap_7", "needsApproval": true}
        }));
        assert_eq!(
            chunk,
            Some(StreamChunk::approval_requested(
                "call_1",
                "delete_file",
                json!({"path": "a.txt"}),
                "ap_7"
            ))
        );
    }

    #[test]
    fn test_unrecognized_shapes_are_dropped() {
        assert_eq!(parse(json!({"type": "reasoning", "text": "hmm"})), None);
        assert_eq!(parse(json!({"content": "no tag"})), None);
        assert_eq!(parse(json!("just a string")), None);
        assert_eq!(parse(json!({"type": "text"})), None);
        assert_eq!(parse(json!({"type": "tool-input-available", "toolName": "f"})), None);
    }

    #[test]
    fn test_closure_parser() {
        let only_text = |incoming: IncomingChunk| match incoming {
            IncomingChunk::Canonical(chunk @ StreamChunk::Text { .. }) => Some(chunk),
            _ => None,
        };
        assert_eq!(
            only_text.parse_chunk(StreamChunk::text("a").into()),
            Some(StreamChunk::text("a"))
        );
        assert_eq!(only_text.parse_chunk(StreamChunk::done().into()), None);
    }
}
