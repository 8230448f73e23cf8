//! Tool call records and their lifecycle.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Lifecycle of a tool call's argument assembly.
///
/// States only move forward: `AwaitingInput` → `InputStreaming` →
/// `InputComplete`. The ordering derived here follows that walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCallState {
    /// The call started but no arguments arrived yet.
    AwaitingInput,
    /// Arguments are arriving.
    InputStreaming,
    /// Arguments are final; the record is frozen.
    InputComplete,
}

impl ToolCallState {
    /// The kebab-case name of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingInput => "awaiting-input",
            Self::InputStreaming => "input-streaming",
            Self::InputComplete => "input-complete",
        }
    }

    /// Check if this is the terminal state.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::InputComplete)
    }
}

impl fmt::Display for ToolCallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool call assembled from streamed deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRecord {
    /// Tool call id.
    pub id: String,
    /// Function name.
    pub name: String,
    /// Raw arguments text accumulated so far.
    pub arguments: String,
    /// Lifecycle state.
    pub state: ToolCallState,
    /// Best-effort parse of `arguments`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_arguments: Option<Value>,
}

impl ToolCallRecord {
    /// Create a record with no arguments yet.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: String::new(),
            state: ToolCallState::AwaitingInput,
            parsed_arguments: None,
        }
    }

    /// Check if the record reached `InputComplete`.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Move to `next` if it is later in the lifecycle. Never moves backwards.
    pub fn advance(&mut self, next: ToolCallState) {
        if next > self.state {
            self.state = next;
        }
    }

    /// Convert to the API wire shape.
    #[must_use]
    pub fn to_tool_call(&self) -> ToolCall {
        ToolCall::function(self.id.clone(), self.name.clone(), self.arguments.clone())
    }
}

/// A completed tool call in API wire shape.
///
/// ```json
/// {"id": "call_1", "type": "function", "function": {"name": "f", "arguments": "{}"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool call id.
    pub id: String,
    /// Call type, always `"function"`.
    #[serde(rename = "type")]
    pub call_type: String,
    /// Function name and final arguments.
    pub function: FunctionCall,
}

impl ToolCall {
    /// Create a function tool call.
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

impl From<&ToolCallRecord> for ToolCall {
    fn from(record: &ToolCallRecord) -> Self {
        record.to_tool_call()
    }
}

/// Function name and raw arguments of a completed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name.
    pub name: String,
    /// Raw arguments JSON text.
    pub arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_order() {
        assert!(ToolCallState::AwaitingInput < ToolCallState::InputStreaming);
        assert!(ToolCallState::InputStreaming < ToolCallState::InputComplete);
        assert!(ToolCallState::InputComplete.is_complete());
        assert!(!ToolCallState::InputStreaming.is_complete());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(ToolCallState::AwaitingInput.to_string(), "awaiting-input");
        assert_eq!(
            serde_json::to_value(ToolCallState::InputStreaming).unwrap(),
            json!("input-streaming")
        );
        let state: ToolCallState = serde_json::from_value(json!("input-complete")).unwrap();
        assert_eq!(state, ToolCallState::InputComplete);
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut record = ToolCallRecord::new("call_1", "search");
        record.advance(ToolCallState::InputComplete);
        record.advance(ToolCallState::InputStreaming);
        assert_eq!(record.state, ToolCallState::InputComplete);
    }

    #[test]
    fn test_to_tool_call() {
        let mut record = ToolCallRecord::new("call_1", "search");
        record.arguments = r#"{"q":"rust"}"#.to_string();

        let call = ToolCall::from(&record);
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({
                "id": "call_1",
                "type": "function",
                "function": {"name": "search", "arguments": "{\"q\":\"rust\"}"}
            })
        );
    }

    #[test]
    fn test_record_serialization_skips_absent_parse() {
        let record = ToolCallRecord::new("call_1", "search");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["state"], "awaiting-input");
        assert!(value.get("parsedArguments").is_none());
    }
}
