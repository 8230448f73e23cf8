//! Line-oriented transport decoders.
//!
//! HTTP bodies arrive as arbitrary byte slices. The decoders here reassemble
//! them into lines and each line into one backend-native JSON fragment, ready
//! for [`StreamProcessor::process`](crate::processor::StreamProcessor::process).
//!
//! - [`SseLineDecoder`]: `data: {...}` lines, `[DONE]` sentinel
//! - [`NdjsonDecoder`]: one JSON document per line
//!
//! [`DecodedStream`] drives either decoder from a byte stream.

mod ndjson;
mod sse;

pub use ndjson::NdjsonDecoder;
pub use sse::{SseLineDecoder, DONE_SENTINEL};

use crate::error::{StreamError, StreamResult};
use bytes::Bytes;
use futures::{ready, Stream};
use pin_project_lite::pin_project;
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Longest line a decoder will hold while waiting for its newline.
pub const MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Turns decoded text into JSON fragments, one line at a time.
pub trait LineDecoder {
    /// Feed text. Returns the fragments of every line completed by it.
    fn feed_str(&mut self, text: &str) -> StreamResult<Vec<Value>>;

    /// Signal end of input. Returns fragments from any held partial line.
    fn finish(&mut self) -> StreamResult<Vec<Value>>;
}

/// Splits text into `\n`-terminated lines, holding the partial last line.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    /// Append `text` and drain every completed line, without terminators.
    pub(crate) fn push(&mut self, text: &str) -> StreamResult<Vec<String>> {
        self.buffer.push_str(text);

        let lines = match self.buffer.rfind('\n') {
            Some(last_newline) => {
                let rest = self.buffer.split_off(last_newline + 1);
                let complete = std::mem::replace(&mut self.buffer, rest);
                complete.lines().map(str::to_string).collect()
            }
            None => Vec::new(),
        };

        if self.buffer.len() > MAX_BUFFER_SIZE {
            self.buffer.clear();
            return Err(StreamError::BufferOverflow {
                limit: MAX_BUFFER_SIZE,
            });
        }
        Ok(lines)
    }

    /// Take whatever partial line is held.
    pub(crate) fn take_rest(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

/// Incremental UTF-8 decoding.
///
/// A multi-byte character split across reads is held until its remaining
/// bytes arrive. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Buffer {
    pending: Vec<u8>,
}

impl Utf8Buffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes`, keeping an incomplete trailing character for later.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                    break;
                }
                Err(err) => {
                    let valid_end = start + err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        out
    }

    /// Flush any held bytes, replacing an incomplete character with U+FFFD.
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

pin_project! {
    /// Stream adapter decoding a byte stream into JSON fragments.
    ///
    /// Transport errors pass through unchanged; decoder errors are converted
    /// into the transport's error type.
    pub struct DecodedStream<S, D> {
        #[pin]
        inner: S,
        utf8: Utf8Buffer,
        decoder: D,
        pending: VecDeque<Value>,
        finished: bool,
    }
}

/// Decodes an SSE-style byte stream.
pub type SseStream<S> = DecodedStream<S, SseLineDecoder>;

/// Decodes an NDJSON byte stream.
pub type NdjsonStream<S> = DecodedStream<S, NdjsonDecoder>;

impl<S, D> DecodedStream<S, D> {
    /// Wrap `inner` with `decoder`.
    pub fn new(inner: S, decoder: D) -> Self {
        Self {
            inner,
            utf8: Utf8Buffer::new(),
            decoder,
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

impl<S> DecodedStream<S, SseLineDecoder> {
    /// Decode `inner` as SSE-style `data:` lines.
    pub fn sse(inner: S) -> Self {
        Self::new(inner, SseLineDecoder::new())
    }
}

impl<S> DecodedStream<S, NdjsonDecoder> {
    /// Decode `inner` as newline-delimited JSON.
    pub fn ndjson(inner: S) -> Self {
        Self::new(inner, NdjsonDecoder::new())
    }
}

impl<S, D, E> Stream for DecodedStream<S, D>
where
    S: Stream<Item = Result<Bytes, E>>,
    D: LineDecoder,
    E: From<StreamError>,
{
    type Item = Result<Value, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(value) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(value)));
            }
            if *this.finished {
                return Poll::Ready(None);
            }

            let decoded = match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(bytes)) => {
                    let text = this.utf8.decode(&bytes);
                    this.decoder.feed_str(&text)
                }
                Some(Err(err)) => return Poll::Ready(Some(Err(err))),
                None => {
                    *this.finished = true;
                    let tail = this.utf8.finish();
                    this.decoder.feed_str(&tail).and_then(|mut values| {
                        values.extend(this.decoder.finish()?);
                        Ok(values)
                    })
                }
            };

            match decoded {
                Ok(values) => this.pending.extend(values),
                Err(err) => return Poll::Ready(Some(Err(err.into()))),
            }
        }
    }
}
