//! # chunkflow-streaming
//!
//! The chunkflow stream processing engine.
//!
//! This crate turns an incrementally delivered model response into one
//! coherent session: accumulated text, an ordered set of tool calls each
//! with a lifecycle, and notifications as things change.
//!
//! ## Core Concepts
//!
//! - **[`StreamProcessor`]**: consumes a fragment source and runs the tool call state machine
//! - **[`StreamHandlers`]**: optional notification slots the processor reports to
//! - **[`ChunkStrategy`]**: decides when text updates fire
//! - **[`StreamParser`]**: maps backend fragment shapes onto canonical chunks
//! - **Codecs**: SSE-style and NDJSON decoders over byte streams
//!
//! ## Example - Processing a Stream
//!
//! ```rust
//! use chunkflow_core::StreamChunk;
//! use chunkflow_streaming::{PunctuationStrategy, StreamHandlers, StreamProcessor};
//! use futures::stream;
//! use std::convert::Infallible;
//!
//! # async fn example() {
//! let handlers = StreamHandlers::new()
//!     .on_text_update(|text| println!("{text}"))
//!     .on_tool_call_complete(|index, _id, name, arguments| {
//!         println!("tool #{index}: {name}({arguments})");
//!     });
//!
//! let mut processor = StreamProcessor::new(handlers).with_chunk_strategy(PunctuationStrategy);
//!
//! let chunks = vec![StreamChunk::text("Hello"), StreamChunk::text(", world.")];
//! let result = processor
//!     .process(stream::iter(chunks.into_iter().map(Ok::<_, Infallible>)))
//!     .await
//!     .unwrap();
//! assert_eq!(result.content, "Hello, world.");
//! # }
//! ```
//!
//! ## Example - Decoding a Body
//!
//! ```rust
//! use chunkflow_streaming::codec::{LineDecoder, SseLineDecoder};
//!
//! let mut decoder = SseLineDecoder::new();
//! let values = decoder
//!     .feed_str("data: {\"type\":\"content\",\"content\":\"hi\"}\n\ndata: [DONE]\n")
//!     .unwrap();
//! assert_eq!(values.len(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod error;
pub mod events;
pub mod handlers;
pub mod parser;
pub mod processor;
pub mod strategy;

// Re-exports
pub use codec::{
    DecodedStream, LineDecoder, NdjsonDecoder, NdjsonStream, SseLineDecoder, SseStream,
    Utf8Buffer,
};
pub use error::{StreamError, StreamResult};
pub use events::ProcessorEvent;
pub use handlers::StreamHandlers;
pub use parser::{DefaultStreamParser, IncomingChunk, StreamParser};
pub use processor::{ProcessResult, StreamProcessor, StreamProcessorOptions};
pub use strategy::{
    BatchStrategy, ChunkStrategy, ChunkStrategyConfig, CompositeStrategy, ImmediateStrategy,
    PunctuationStrategy, ThrottleStrategy, WordBoundaryStrategy,
};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        ChunkStrategy, ChunkStrategyConfig, DecodedStream, DefaultStreamParser, ImmediateStrategy,
        IncomingChunk, ProcessResult, ProcessorEvent, StreamError, StreamHandlers, StreamParser,
        StreamProcessor, StreamProcessorOptions, StreamResult,
    };
}
