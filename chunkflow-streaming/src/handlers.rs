//! Notification handler slots.
//!
//! Every slot is optional and independent; the processor calls whichever are
//! set, synchronously, and ignores what they return. Handlers that need to
//! mutate state should capture it behind a lock.
//!
//! ```rust
//! use chunkflow_streaming::StreamHandlers;
//!
//! let handlers = StreamHandlers::new()
//!     .on_text_update(|text| println!("{text}"))
//!     .on_tool_call_complete(|index, id, name, arguments| {
//!         println!("#{index} {id} {name}({arguments})");
//!     });
//! ```

use crate::events::ProcessorEvent;
use chunkflow_core::{ToolCallRecord, ToolCallState};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// `(full_text)`
pub type TextUpdateFn = Arc<dyn Fn(&str) + Send + Sync>;
/// `(index, id, name)`
pub type ToolCallStartFn = Arc<dyn Fn(usize, &str, &str) + Send + Sync>;
/// `(index, id, name, state, raw_arguments, parsed_arguments)`
pub type ToolCallStateChangeFn =
    Arc<dyn Fn(usize, &str, &str, ToolCallState, &str, Option<&Value>) + Send + Sync>;
/// `(index, arguments_delta)`
pub type ToolCallDeltaFn = Arc<dyn Fn(usize, &str) + Send + Sync>;
/// `(index, id, name, final_arguments)`
pub type ToolCallCompleteFn = Arc<dyn Fn(usize, &str, &str, &str) + Send + Sync>;
/// `(tool_call_id, tool_name, input, approval_id)`
pub type ApprovalRequestedFn = Arc<dyn Fn(&str, &str, &Value, &str) + Send + Sync>;
/// `(tool_call_id, tool_name, input)`
pub type ToolInputAvailableFn = Arc<dyn Fn(&str, &str, &Value) + Send + Sync>;
/// `(final_text, completed_tool_calls)`
pub type StreamEndFn = Arc<dyn Fn(&str, Option<&[ToolCallRecord]>) + Send + Sync>;

/// The set of notification handlers a processor reports to.
#[derive(Clone, Default)]
pub struct StreamHandlers {
    text_update: Option<TextUpdateFn>,
    tool_call_start: Option<ToolCallStartFn>,
    tool_call_state_change: Option<ToolCallStateChangeFn>,
    tool_call_delta: Option<ToolCallDeltaFn>,
    tool_call_complete: Option<ToolCallCompleteFn>,
    approval_requested: Option<ApprovalRequestedFn>,
    tool_input_available: Option<ToolInputAvailableFn>,
    stream_end: Option<StreamEndFn>,
}

impl StreamHandlers {
    /// Create a handler set with every slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill every slot with a closure forwarding a [`ProcessorEvent`] to `sink`.
    pub fn from_event_sink<F>(sink: F) -> Self
    where
        F: Fn(ProcessorEvent) + Send + Sync + 'static,
    {
        let sink = Arc::new(sink);

        let s = Arc::clone(&sink);
        let handlers = Self::new().on_text_update(move |text| {
            s(ProcessorEvent::TextUpdate {
                text: text.to_string(),
            });
        });

        let s = Arc::clone(&sink);
        let handlers = handlers.on_tool_call_start(move |index, id, name| {
            s(ProcessorEvent::ToolCallStart {
                index,
                id: id.to_string(),
                name: name.to_string(),
            });
        });

        let s = Arc::clone(&sink);
        let handlers =
            handlers.on_tool_call_state_change(move |index, id, name, state, arguments, parsed| {
                s(ProcessorEvent::ToolCallStateChange {
                    index,
                    id: id.to_string(),
                    name: name.to_string(),
                    state,
                    arguments: arguments.to_string(),
                    parsed_arguments: parsed.cloned(),
                });
            });

        let s = Arc::clone(&sink);
        let handlers = handlers.on_tool_call_delta(move |index, delta| {
            s(ProcessorEvent::ToolCallDelta {
                index,
                delta: delta.to_string(),
            });
        });

        let s = Arc::clone(&sink);
        let handlers = handlers.on_tool_call_complete(move |index, id, name, arguments| {
            s(ProcessorEvent::ToolCallComplete {
                index,
                id: id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            });
        });

        let s = Arc::clone(&sink);
        let handlers =
            handlers.on_approval_requested(move |tool_call_id, tool_name, input, approval_id| {
                s(ProcessorEvent::ApprovalRequested {
                    tool_call_id: tool_call_id.to_string(),
                    tool_name: tool_name.to_string(),
                    input: input.clone(),
                    approval_id: approval_id.to_string(),
                });
            });

        let s = Arc::clone(&sink);
        let handlers = handlers.on_tool_input_available(move |tool_call_id, tool_name, input| {
            s(ProcessorEvent::ToolInputAvailable {
                tool_call_id: tool_call_id.to_string(),
                tool_name: tool_name.to_string(),
                input: input.clone(),
            });
        });

        handlers.on_stream_end(move |text, tool_calls| {
            sink(ProcessorEvent::StreamEnd {
                text: text.to_string(),
                tool_calls: tool_calls.map(<[ToolCallRecord]>::to_vec),
            });
        })
    }

    /// Set the text update handler.
    #[must_use]
    pub fn on_text_update(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.text_update = Some(Arc::new(f));
        self
    }

    /// Set the tool call start handler.
    #[must_use]
    pub fn on_tool_call_start(
        mut self,
        f: impl Fn(usize, &str, &str) + Send + Sync + 'static,
    ) -> Self {
        self.tool_call_start = Some(Arc::new(f));
        self
    }

    /// Set the tool call state change handler.
    #[must_use]
    pub fn on_tool_call_state_change(
        mut self,
        f: impl Fn(usize, &str, &str, ToolCallState, &str, Option<&Value>) + Send + Sync + 'static,
    ) -> Self {
        self.tool_call_state_change = Some(Arc::new(f));
        self
    }

    /// Set the tool call delta handler.
    #[must_use]
    pub fn on_tool_call_delta(mut self, f: impl Fn(usize, &str) + Send + Sync + 'static) -> Self {
        self.tool_call_delta = Some(Arc::new(f));
        self
    }

    /// Set the tool call complete handler.
    #[must_use]
    pub fn on_tool_call_complete(
        mut self,
        f: impl Fn(usize, &str, &str, &str) + Send + Sync + 'static,
    ) -> Self {
        self.tool_call_complete = Some(Arc::new(f));
        self
    }

    /// Set the approval requested handler.
    #[must_use]
    pub fn on_approval_requested(
        mut self,
        f: impl Fn(&str, &str, &Value, &str) + Send + Sync + 'static,
    ) -> Self {
        self.approval_requested = Some(Arc::new(f));
        self
    }

    /// Set the tool input available handler.
    #[must_use]
    pub fn on_tool_input_available(
        mut self,
        f: impl Fn(&str, &str, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.tool_input_available = Some(Arc::new(f));
        self
    }

    /// Set the stream end handler.
    #[must_use]
    pub fn on_stream_end(
        mut self,
        f: impl Fn(&str, Option<&[ToolCallRecord]>) + Send + Sync + 'static,
    ) -> Self {
        self.stream_end = Some(Arc::new(f));
        self
    }

    pub(crate) fn text_update(&self, text: &str) {
        if let Some(f) = &self.text_update {
            f(text);
        }
    }

    pub(crate) fn tool_call_start(&self, index: usize, id: &str, name: &str) {
        if let Some(f) = &self.tool_call_start {
            f(index, id, name);
        }
    }

    pub(crate) fn tool_call_state_change(&self, index: usize, record: &ToolCallRecord) {
        if let Some(f) = &self.tool_call_state_change {
            f(
                index,
                &record.id,
                &record.name,
                record.state,
                &record.arguments,
                record.parsed_arguments.as_ref(),
            );
        }
    }

    pub(crate) fn tool_call_delta(&self, index: usize, delta: &str) {
        if let Some(f) = &self.tool_call_delta {
            f(index, delta);
        }
    }

    pub(crate) fn tool_call_complete(&self, index: usize, record: &ToolCallRecord) {
        if let Some(f) = &self.tool_call_complete {
            f(index, &record.id, &record.name, &record.arguments);
        }
    }

    pub(crate) fn approval_requested(
        &self,
        tool_call_id: &str,
        tool_name: &str,
        input: &Value,
        approval_id: &str,
    ) {
        if let Some(f) = &self.approval_requested {
            f(tool_call_id, tool_name, input, approval_id);
        }
    }

    pub(crate) fn tool_input_available(&self, tool_call_id: &str, tool_name: &str, input: &Value) {
        if let Some(f) = &self.tool_input_available {
            f(tool_call_id, tool_name, input);
        }
    }

    pub(crate) fn stream_end(&self, text: &str, tool_calls: Option<&[ToolCallRecord]>) {
        if let Some(f) = &self.stream_end {
            f(text, tool_calls);
        }
    }
}

impl fmt::Debug for StreamHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandlers")
            .field("text_update", &self.text_update.is_some())
            .field("tool_call_start", &self.tool_call_start.is_some())
            .field("tool_call_state_change", &self.tool_call_state_change.is_some())
            .field("tool_call_delta", &self.tool_call_delta.is_some())
            .field("tool_call_complete", &self.tool_call_complete.is_some())
            .field("approval_requested", &self.approval_requested.is_some())
            .field("tool_input_available", &self.tool_input_available.is_some())
            .field("stream_end", &self.stream_end.is_some())
            .finish()
    }
}
