//! # chunkflow-core
//!
//! Core types for the chunkflow stream processor.
//!
//! - **Chunks**: the canonical fragment variants every backend is mapped to
//! - **Tool calls**: records, lifecycle states and the API wire shape
//! - **Partial JSON**: best-effort parsing of truncated argument text
//! - **Errors**: the shared error type
//!
//! ## Example
//!
//! ```rust
//! use chunkflow_core::{parse_partial_json, StreamChunk, ToolCallRecord, ToolCallState};
//!
//! let chunk = StreamChunk::tool_call_delta("call_1", "get_weather", r#"{"city":"Os"#);
//! assert_eq!(chunk.kind(), "tool-call-delta");
//!
//! let mut record = ToolCallRecord::new("call_1", "get_weather");
//! record.arguments.push_str(r#"{"city":"Os"#);
//! record.parsed_arguments = parse_partial_json(&record.arguments);
//! record.advance(ToolCallState::InputStreaming);
//! assert_eq!(record.parsed_arguments.unwrap()["city"], "Os");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod chunk;
pub mod errors;
pub mod partial_json;
pub mod tool_call;

pub use chunk::{FunctionPayload, StreamChunk, ToolCallPayload};
pub use errors::{ChunkflowError, Result};
pub use partial_json::{parse_partial_json, JsonParser, PartialJsonParser};
pub use tool_call::{FunctionCall, ToolCall, ToolCallRecord, ToolCallState};

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::chunk::{FunctionPayload, StreamChunk, ToolCallPayload};
    pub use crate::errors::{ChunkflowError, Result};
    pub use crate::partial_json::{parse_partial_json, JsonParser, PartialJsonParser};
    pub use crate::tool_call::{FunctionCall, ToolCall, ToolCallRecord, ToolCallState};
}
