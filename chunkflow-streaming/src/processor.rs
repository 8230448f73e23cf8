//! The stream processing engine.
//!
//! [`StreamProcessor`] consumes a fragment source and folds it into one
//! session: accumulated text plus an ordered set of tool calls, each walking
//! `awaiting-input → input-streaming → input-complete`. Every change is
//! reported through [`StreamHandlers`] as it happens.
//!
//! ## Rules
//!
//! - A text fragment completes every open tool call first. If the
//!   accumulated text is a prefix of the incoming text it is treated as a
//!   snapshot and replaces the accumulator; otherwise it is appended.
//! - A tool call's public index is its position in first-seen order. It
//!   never changes within a run, whatever index the backend reports.
//! - `done` completes every open tool call but does not end the run.
//! - When the source ends, open calls are completed, pending text is
//!   flushed, and stream-end fires with the final state.
//!
//! ## Example
//!
//! ```rust
//! use chunkflow_core::StreamChunk;
//! use chunkflow_streaming::{StreamHandlers, StreamProcessor};
//! use futures::stream;
//! use std::convert::Infallible;
//!
//! # async fn example() {
//! let mut processor = StreamProcessor::new(
//!     StreamHandlers::new().on_text_update(|text| println!("{text}")),
//! );
//!
//! let chunks = vec![
//!     StreamChunk::text("Checking "),
//!     StreamChunk::tool_call_delta("call_1", "get_weather", r#"{"city":"Oslo"}"#),
//!     StreamChunk::done(),
//! ];
//! let result = processor
//!     .process(stream::iter(chunks.into_iter().map(Ok::<_, Infallible>)))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(result.content, "Checking ");
//! assert_eq!(result.tool_calls.unwrap()[0].arguments, r#"{"city":"Oslo"}"#);
//! # }
//! ```

use crate::handlers::StreamHandlers;
use crate::parser::{DefaultStreamParser, IncomingChunk, StreamParser};
use crate::strategy::{ChunkStrategy, ImmediateStrategy};
use chunkflow_core::{
    JsonParser, PartialJsonParser, StreamChunk, ToolCall, ToolCallPayload, ToolCallRecord,
    ToolCallState,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Final aggregate of one processing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResult {
    /// Final accumulated text.
    pub content: String,
    /// Completed tool calls in first-seen order, `None` if there were none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRecord>>,
}

impl ProcessResult {
    /// Check if the run produced any tool calls.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }

    /// The completed tool calls in API wire shape.
    #[must_use]
    pub fn api_tool_calls(&self) -> Vec<ToolCall> {
        self.tool_calls
            .iter()
            .flatten()
            .map(ToolCallRecord::to_tool_call)
            .collect()
    }
}

/// Options bundle for [`StreamProcessor::with_options`].
///
/// Unset pluggable parts fall back to [`ImmediateStrategy`],
/// [`DefaultStreamParser`] and [`PartialJsonParser`].
#[derive(Default)]
pub struct StreamProcessorOptions {
    /// Notification handlers.
    pub handlers: StreamHandlers,
    /// Text emission cadence.
    pub chunk_strategy: Option<Box<dyn ChunkStrategy>>,
    /// Fragment shape normalizer.
    pub parser: Option<Box<dyn StreamParser>>,
    /// Tool call argument parser.
    pub json_parser: Option<Box<dyn JsonParser>>,
}

impl StreamProcessorOptions {
    /// Create options with the given handlers and default parts.
    #[must_use]
    pub fn new(handlers: StreamHandlers) -> Self {
        Self {
            handlers,
            ..Self::default()
        }
    }

    /// Set the emission cadence.
    #[must_use]
    pub fn with_chunk_strategy(mut self, strategy: impl ChunkStrategy + 'static) -> Self {
        self.chunk_strategy = Some(Box::new(strategy));
        self
    }

    /// Set the fragment normalizer.
    #[must_use]
    pub fn with_parser(mut self, parser: impl StreamParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Set the argument parser.
    #[must_use]
    pub fn with_json_parser(mut self, parser: impl JsonParser + 'static) -> Self {
        self.json_parser = Some(Box::new(parser));
        self
    }
}

impl fmt::Debug for StreamProcessorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamProcessorOptions")
            .field("handlers", &self.handlers)
            .field("chunk_strategy", &self.chunk_strategy.is_some())
            .field("parser", &self.parser.is_some())
            .field("json_parser", &self.json_parser.is_some())
            .finish()
    }
}

/// Folds a fragment stream into text and tool calls.
///
/// One run at a time: [`process`](Self::process) borrows the processor
/// mutably, and every run starts from an empty session.
pub struct StreamProcessor {
    handlers: StreamHandlers,
    strategy: Box<dyn ChunkStrategy>,
    parser: Box<dyn StreamParser>,
    json_parser: Box<dyn JsonParser>,
}

impl StreamProcessor {
    /// Create a processor with default parts.
    #[must_use]
    pub fn new(handlers: StreamHandlers) -> Self {
        Self::with_options(StreamProcessorOptions::new(handlers))
    }

    /// Create a processor from an options bundle.
    #[must_use]
    pub fn with_options(options: StreamProcessorOptions) -> Self {
        Self {
            handlers: options.handlers,
            strategy: options
                .chunk_strategy
                .unwrap_or_else(|| Box::new(ImmediateStrategy)),
            parser: options
                .parser
                .unwrap_or_else(|| Box::new(DefaultStreamParser)),
            json_parser: options
                .json_parser
                .unwrap_or_else(|| Box::new(PartialJsonParser)),
        }
    }

    /// Replace the emission cadence.
    #[must_use]
    pub fn with_chunk_strategy(mut self, strategy: impl ChunkStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Replace the fragment normalizer.
    #[must_use]
    pub fn with_parser(mut self, parser: impl StreamParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Replace the argument parser.
    #[must_use]
    pub fn with_json_parser(mut self, parser: impl JsonParser + 'static) -> Self {
        self.json_parser = Box::new(parser);
        self
    }

    /// The handlers this processor reports to.
    pub fn handlers(&self) -> &StreamHandlers {
        &self.handlers
    }

    /// Consume `source` to its end.
    ///
    /// The first error the source yields is returned as-is; fragments before
    /// it have already been applied and notified, and stream-end does not
    /// fire.
    pub async fn process<S, T, E>(&mut self, source: S) -> Result<ProcessResult, E>
    where
        S: Stream<Item = Result<T, E>>,
        T: Into<IncomingChunk>,
    {
        let mut session = Session::default();
        self.strategy.reset();

        let mut source = std::pin::pin!(source);
        while let Some(item) = source.next().await {
            let Some(chunk) = self.parser.parse_chunk(item?.into()) else {
                continue;
            };
            tracing::trace!(kind = chunk.kind(), "Processing chunk");
            self.apply(&mut session, chunk);
        }

        Ok(self.finish(session))
    }

    fn apply(&mut self, session: &mut Session, chunk: StreamChunk) {
        match chunk {
            StreamChunk::Text { content } => self.handle_text(session, &content),
            StreamChunk::ToolCallDelta { tool_call, .. } => {
                self.handle_tool_call_delta(session, tool_call);
            }
            StreamChunk::Done { finish_reason } => {
                tracing::debug!(?finish_reason, "Response turn finished");
                self.complete_tool_calls_except(session, None);
            }
            StreamChunk::ApprovalRequested {
                tool_call_id,
                tool_name,
                input,
                approval_id,
            } => {
                self.handlers
                    .approval_requested(&tool_call_id, &tool_name, &input, &approval_id);
            }
            StreamChunk::ToolInputAvailable {
                tool_call_id,
                tool_name,
                input,
            } => {
                self.handlers
                    .tool_input_available(&tool_call_id, &tool_name, &input);
            }
        }
    }

    fn handle_text(&mut self, session: &mut Session, content: &str) {
        self.complete_tool_calls_except(session, None);

        let text = &mut session.text;
        if content.starts_with(text.full.as_str()) {
            text.full.clear();
        }
        text.full.push_str(content);

        if self.strategy.should_emit(content, &text.full) {
            self.emit_text(text);
        }
    }

    fn handle_tool_call_delta(&mut self, session: &mut Session, tool_call: ToolCallPayload) {
        let ToolCallPayload { id, function, .. } = tool_call;
        let delta = function.arguments;

        let Some(record) = session.calls.get_mut(&id) else {
            self.start_tool_call(session, id, function.name, delta);
            return;
        };
        let Some(index) = session.ledger.index_of(&id) else {
            return;
        };

        if record.is_complete() {
            tracing::debug!(index, id = %id, "Ignoring delta for completed tool call");
            return;
        }

        record.arguments.push_str(&delta);
        if !delta.is_empty() {
            record.advance(ToolCallState::InputStreaming);
        }
        record.parsed_arguments = parse_arguments(self.json_parser.as_ref(), &record.arguments);

        self.handlers.tool_call_state_change(index, record);
        if !delta.is_empty() {
            self.handlers.tool_call_delta(index, &delta);
        }
    }

    fn start_tool_call(&self, session: &mut Session, id: String, name: String, arguments: String) {
        let mut record = ToolCallRecord::new(id.clone(), name);
        if !arguments.is_empty() {
            record.advance(ToolCallState::InputStreaming);
            record.parsed_arguments = parse_arguments(self.json_parser.as_ref(), &arguments);
        }
        record.arguments = arguments;

        let index = session.ledger.push(id.clone());
        tracing::debug!(
            index,
            id = %id,
            name = %record.name,
            state = %record.state,
            "Tool call started"
        );

        self.handlers.tool_call_start(index, &record.id, &record.name);
        self.handlers.tool_call_state_change(index, &record);
        if !record.arguments.is_empty() {
            self.handlers.tool_call_delta(index, &record.arguments);
        }

        session.calls.insert(id, record);
    }

    /// Complete every open tool call except `except`, in first-seen order.
    fn complete_tool_calls_except(&self, session: &mut Session, except: Option<&str>) {
        let Session { calls, ledger, .. } = session;

        for (index, id) in ledger.iter().enumerate() {
            if except == Some(id) {
                continue;
            }
            let Some(record) = calls.get_mut(id) else {
                continue;
            };
            if record.is_complete() {
                continue;
            }

            record.advance(ToolCallState::InputComplete);
            record.parsed_arguments = parse_arguments(self.json_parser.as_ref(), &record.arguments);
            tracing::debug!(index, id = %id, "Tool call input complete");

            self.handlers.tool_call_state_change(index, record);
            self.handlers.tool_call_complete(index, record);
        }
    }

    fn emit_text(&self, text: &mut TextAccumulator) {
        if text.full != text.last_emitted {
            self.handlers.text_update(&text.full);
            text.last_emitted.clone_from(&text.full);
        }
    }

    fn finish(&self, mut session: Session) -> ProcessResult {
        self.complete_tool_calls_except(&mut session, None);
        self.emit_text(&mut session.text);

        let Session {
            text,
            mut calls,
            ledger,
        } = session;
        let completed: Vec<ToolCallRecord> = ledger
            .iter()
            .filter_map(|id| calls.remove(id))
            .filter(ToolCallRecord::is_complete)
            .collect();
        let tool_calls = (!completed.is_empty()).then_some(completed);

        tracing::debug!(
            content_len = text.full.len(),
            tool_calls = tool_calls.as_ref().map_or(0, Vec::len),
            "Stream ended"
        );
        self.handlers.stream_end(&text.full, tool_calls.as_deref());

        ProcessResult {
            content: text.full,
            tool_calls,
        }
    }
}

impl fmt::Debug for StreamProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamProcessor")
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

fn parse_arguments(parser: &dyn JsonParser, arguments: &str) -> Option<Value> {
    if arguments.trim().is_empty() {
        None
    } else {
        parser.parse(arguments)
    }
}

/// State of one processing run.
#[derive(Debug, Default)]
struct Session {
    text: TextAccumulator,
    calls: HashMap<String, ToolCallRecord>,
    ledger: CallLedger,
}

#[derive(Debug, Default)]
struct TextAccumulator {
    full: String,
    last_emitted: String,
}

/// Tool call ids in first-seen order. Append-only.
#[derive(Debug, Default)]
struct CallLedger {
    ids: Vec<String>,
}

impl CallLedger {
    fn push(&mut self, id: String) -> usize {
        self.ids.push(id);
        self.ids.len() - 1
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|known| known == id)
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
