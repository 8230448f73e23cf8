//! Processor notification events.
//!
//! Each variant mirrors one handler slot of
//! [`StreamHandlers`](crate::handlers::StreamHandlers). Events are what an
//! event-sink handler receives, and they serialize cleanly for forwarding to
//! a UI.

use chunkflow_core::{ToolCallRecord, ToolCallState};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Notifications emitted while processing a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessorEvent {
    /// Accumulated text changed.
    TextUpdate {
        /// Full text so far.
        text: String,
    },

    /// A tool call was seen for the first time.
    ToolCallStart {
        /// Ledger index of the call.
        index: usize,
        /// Tool call id.
        id: String,
        /// Function name.
        name: String,
    },

    /// A tool call's state or arguments changed.
    ToolCallStateChange {
        /// Ledger index of the call.
        index: usize,
        /// Tool call id.
        id: String,
        /// Function name.
        name: String,
        /// Lifecycle state after the change.
        state: ToolCallState,
        /// Raw arguments so far.
        arguments: String,
        /// Best-effort parse of the arguments.
        parsed_arguments: Option<JsonValue>,
    },

    /// New arguments text arrived for a tool call.
    ToolCallDelta {
        /// Ledger index of the call.
        index: usize,
        /// Arguments text delta.
        delta: String,
    },

    /// A tool call reached `input-complete`.
    ToolCallComplete {
        /// Ledger index of the call.
        index: usize,
        /// Tool call id.
        id: String,
        /// Function name.
        name: String,
        /// Final raw arguments.
        arguments: String,
    },

    /// The backend asked for approval of a tool call.
    ApprovalRequested {
        /// Tool call id.
        tool_call_id: String,
        /// Tool name.
        tool_name: String,
        /// Tool input.
        input: JsonValue,
        /// Approval id.
        approval_id: String,
    },

    /// Tool input is available for client-side execution.
    ToolInputAvailable {
        /// Tool call id.
        tool_call_id: String,
        /// Tool name.
        tool_name: String,
        /// Tool input.
        input: JsonValue,
    },

    /// The source ended.
    StreamEnd {
        /// Final text.
        text: String,
        /// Completed tool calls, if any completed.
        tool_calls: Option<Vec<ToolCallRecord>>,
    },
}

impl ProcessorEvent {
    /// Ledger index of the tool call this event refers to, if any.
    #[must_use]
    pub fn tool_call_index(&self) -> Option<usize> {
        match self {
            Self::ToolCallStart { index, .. }
            | Self::ToolCallStateChange { index, .. }
            | Self::ToolCallDelta { index, .. }
            | Self::ToolCallComplete { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Id of the tool call this event refers to, if it carries one.
    #[must_use]
    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Self::ToolCallStart { id, .. }
            | Self::ToolCallStateChange { id, .. }
            | Self::ToolCallComplete { id, .. } => Some(id),
            Self::ApprovalRequested { tool_call_id, .. }
            | Self::ToolInputAvailable { tool_call_id, .. } => Some(tool_call_id),
            _ => None,
        }
    }

    /// Get the text if this is a text update.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::TextUpdate { text } => Some(text),
            _ => None,
        }
    }

    /// Check if this is the final event of a run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::StreamEnd { .. })
    }
}

impl fmt::Display for ProcessorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TextUpdate { text } => write!(f, "{text}"),
            Self::ToolCallStart { index, name, .. } => write!(f, "[tool_start #{index}] {name}"),
            Self::ToolCallStateChange { index, state, .. } => {
                write!(f, "[tool_state #{index}] {state}")
            }
            Self::ToolCallDelta { delta, .. } => write!(f, "{delta}"),
            Self::ToolCallComplete { index, name, .. } => {
                write!(f, "[tool_complete #{index}] {name}")
            }
            Self::ApprovalRequested { tool_name, .. } => write!(f, "[approval] {tool_name}"),
            Self::ToolInputAvailable { tool_name, .. } => write!(f, "[tool_input] {tool_name}"),
            Self::StreamEnd { .. } => write!(f, "[stream_end]"),
        }
    }
}
