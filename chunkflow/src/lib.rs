//! # chunkflow
//!
//! Turn a streamed model response into one coherent session.
//!
//! Model backends deliver responses as fragments: text deltas or snapshots,
//! pieces of tool call arguments, lifecycle markers. chunkflow folds those
//! fragments into accumulated text plus an ordered set of tool calls, each
//! with a lifecycle (`awaiting-input → input-streaming → input-complete`),
//! and reports every change through handler callbacks.
//!
//! ## Quick Start
//!
//! ```ignore
//! use chunkflow::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let adapter = FetchServerSentEvents::new("http://localhost:3000/api/chat");
//!     let handlers = StreamHandlers::new()
//!         .on_text_update(|text| println!("{text}"))
//!         .on_tool_call_state_change(|index, _id, name, state, _raw, parsed| {
//!             println!("#{index} {name} {state}: {parsed:?}");
//!         });
//!
//!     let mut processor = StreamProcessor::new(handlers).with_chunk_strategy(PunctuationStrategy);
//!     let messages = vec![serde_json::json!({"role": "user", "content": "Hi"})];
//!     let source = adapter.connect(messages, None);
//!     let result = processor.process(source).await?;
//!
//!     println!("{}", result.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|--------|
//! | `client` | HTTP connection adapters (reqwest) | ✅ |
//!
//! ## Architecture
//!
//! - [`chunkflow_core`]: fragments, tool call records, partial JSON parsing
//! - [`chunkflow_streaming`]: the processor, emission strategies, decoders
//! - `chunkflow_client`: connection adapters (feature `client`)

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub mod direct;

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Fragments, tool call records and partial JSON parsing.
pub use chunkflow_core as core;

/// The stream processor and its pluggable parts.
pub use chunkflow_streaming as streaming;

/// Connection adapters.
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub use chunkflow_client as client;

// ============================================================================
// Type Re-exports (Flat)
// ============================================================================

// Core
pub use chunkflow_core::{
    parse_partial_json, ChunkflowError, FunctionCall, FunctionPayload, JsonParser,
    PartialJsonParser, StreamChunk, ToolCall, ToolCallPayload, ToolCallRecord, ToolCallState,
};

// Streaming
pub use chunkflow_streaming::{
    BatchStrategy, ChunkStrategy, ChunkStrategyConfig, CompositeStrategy, DecodedStream,
    DefaultStreamParser, ImmediateStrategy, IncomingChunk, NdjsonStream, ProcessResult,
    ProcessorEvent, PunctuationStrategy, SseStream, StreamError, StreamHandlers, StreamParser,
    StreamProcessor, StreamProcessorOptions, ThrottleStrategy, WordBoundaryStrategy,
};

// Client
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub use chunkflow_client::{
    ChunkSource, ClientError, ConnectionAdapter, ConnectionOptions, DirectStream,
    FetchHttpStream, FetchServerSentEvents,
};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        ChunkStrategy, ChunkStrategyConfig, ProcessResult, ProcessorEvent, PunctuationStrategy,
        StreamChunk, StreamHandlers, StreamProcessor, StreamProcessorOptions, ToolCallRecord,
        ToolCallState,
    };

    #[cfg(feature = "client")]
    pub use crate::{
        ClientError, ConnectionAdapter, ConnectionOptions, DirectStream, FetchHttpStream,
        FetchServerSentEvents,
    };
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use futures::stream;
    use pretty_assertions::assert_eq;
    use std::convert::Infallible;

    #[tokio::test]
    async fn test_prelude_end_to_end() {
        let mut processor = StreamProcessor::new(StreamHandlers::new());
        let chunks = vec![
            StreamChunk::text("Looking it up"),
            StreamChunk::tool_call_delta("call_1", "search", r#"{"q":"rust"}"#),
        ];

        let result = processor
            .process(stream::iter(chunks.into_iter().map(Ok::<_, Infallible>)))
            .await
            .unwrap();

        assert_eq!(result.content, "Looking it up");
        let calls = result.tool_calls.unwrap();
        assert_eq!(calls[0].state, ToolCallState::InputComplete);
    }
}
