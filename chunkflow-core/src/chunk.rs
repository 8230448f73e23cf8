//! Canonical stream fragments.
//!
//! Every backend wire format is mapped onto [`StreamChunk`] before it reaches
//! the stream processor. The JSON form uses a kebab-case `type` tag and
//! camelCase fields:
//!
//! ```json
//! {"type": "text", "content": "Hello"}
//! {"type": "tool-call-delta", "toolCallIndex": 0,
//!  "toolCall": {"id": "call_1", "type": "function",
//!               "function": {"name": "get_weather", "arguments": "{\"ci"}}}
//! {"type": "done", "finishReason": "tool_calls"}
//! ```

use crate::errors::{ChunkflowError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One canonical fragment of a model response stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamChunk {
    /// Text content, either a delta or a full running snapshot.
    Text {
        /// The text carried by this fragment.
        content: String,
    },

    /// A piece of a tool call.
    #[serde(rename_all = "camelCase")]
    ToolCallDelta {
        /// Backend-assigned position. Informational only; the processor
        /// orders calls by first-seen id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_index: Option<usize>,
        /// The tool call piece.
        tool_call: ToolCallPayload,
    },

    /// The backend finished a response turn.
    #[serde(rename_all = "camelCase")]
    Done {
        /// Finish reason reported by the backend, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },

    /// A tool call needs user approval before it runs.
    #[serde(rename_all = "camelCase")]
    ApprovalRequested {
        /// The tool call awaiting approval.
        tool_call_id: String,
        /// Name of the tool.
        tool_name: String,
        /// Tool input.
        #[serde(default)]
        input: Value,
        /// Identifier to answer the approval with.
        approval_id: String,
    },

    /// Tool input is complete and available for client-side execution.
    #[serde(rename_all = "camelCase")]
    ToolInputAvailable {
        /// The tool call.
        tool_call_id: String,
        /// Name of the tool.
        tool_name: String,
        /// Tool input.
        #[serde(default)]
        input: Value,
    },
}

impl StreamChunk {
    /// Tags of every canonical fragment kind.
    pub const KINDS: [&'static str; 5] = [
        "text",
        "tool-call-delta",
        "done",
        "approval-requested",
        "tool-input-available",
    ];

    /// Create a text fragment.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Create a tool call delta fragment.
    pub fn tool_call_delta(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self::ToolCallDelta {
            tool_call_index: None,
            tool_call: ToolCallPayload::new(id, name, arguments),
        }
    }

    /// Create a done fragment.
    pub fn done() -> Self {
        Self::Done {
            finish_reason: None,
        }
    }

    /// Create an approval request fragment.
    pub fn approval_requested(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: Value,
        approval_id: impl Into<String>,
    ) -> Self {
        Self::ApprovalRequested {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            input,
            approval_id: approval_id.into(),
        }
    }

    /// Create a tool input available fragment.
    pub fn tool_input_available(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: Value,
    ) -> Self {
        Self::ToolInputAvailable {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            input,
        }
    }

    /// The wire tag of this fragment.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ToolCallDelta { .. } => "tool-call-delta",
            Self::Done { .. } => "done",
            Self::ApprovalRequested { .. } => "approval-requested",
            Self::ToolInputAvailable { .. } => "tool-input-available",
        }
    }

    /// Check whether `tag` names a canonical fragment kind.
    #[must_use]
    pub fn is_canonical_kind(tag: &str) -> bool {
        Self::KINDS.contains(&tag)
    }

    /// Deserialize a canonical fragment from its JSON form.
    pub fn from_value(value: Value) -> Result<Self> {
        match value.get("type").and_then(Value::as_str) {
            Some(tag) if Self::is_canonical_kind(tag) => Ok(serde_json::from_value(value)?),
            Some(tag) => Err(ChunkflowError::invalid_fragment(format!(
                "unknown fragment type `{tag}`"
            ))),
            None => Err(ChunkflowError::invalid_fragment("missing `type` tag")),
        }
    }
}

/// The tool call piece carried by a tool call delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallPayload {
    /// Tool call id; identity of the call for the whole session.
    pub id: String,
    /// Call type, `"function"` when present.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    /// Function name and arguments text.
    pub function: FunctionPayload,
}

impl ToolCallPayload {
    /// Create a function tool call payload.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: Some("function".to_string()),
            function: FunctionPayload {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Function name and arguments text of a tool call piece.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionPayload {
    /// Function name. Backends usually send it only on the first piece.
    #[serde(default)]
    pub name: String,
    /// Arguments text delta.
    #[serde(default)]
    pub arguments: String,
}
