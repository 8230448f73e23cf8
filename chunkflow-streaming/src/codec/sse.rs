//! SSE-style line decoding.
//!
//! Backends in this family write one fragment per `data: ` line and close
//! with `data: [DONE]`. Event names, ids and comments are not used, so lines
//! are handled individually instead of being grouped into events.

use super::{LineBuffer, LineDecoder};
use crate::error::StreamResult;
use serde_json::Value;

/// The end-of-stream sentinel.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Decodes `data: {...}` lines into JSON fragments.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    lines: LineBuffer,
}

impl SseLineDecoder {
    /// Create a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one line.
    ///
    /// Blank lines and the `[DONE]` sentinel yield `None`, as do lines that
    /// are not valid JSON (logged at warn level). A line without the
    /// `data: ` prefix is parsed as-is.
    pub fn decode_line(line: &str) -> Option<Value> {
        if line.trim().is_empty() {
            return None;
        }

        let data = line.strip_prefix("data: ").unwrap_or(line);
        if data.trim() == DONE_SENTINEL {
            return None;
        }

        match serde_json::from_str(data) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(line = %data, error = %err, "Failed to parse SSE data");
                None
            }
        }
    }
}

impl LineDecoder for SseLineDecoder {
    fn feed_str(&mut self, text: &str) -> StreamResult<Vec<Value>> {
        Ok(self
            .lines
            .push(text)?
            .iter()
            .filter_map(|line| Self::decode_line(line))
            .collect())
    }

    fn finish(&mut self) -> StreamResult<Vec<Value>> {
        Ok(Self::decode_line(&self.lines.take_rest()).into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("data: {\"a\":1}", Some(json!({"a": 1})))]
    #[case("{\"a\":1}", Some(json!({"a": 1})))]
    #[case("data: {\"a\":1}\r", Some(json!({"a": 1})))]
    #[case("data: [DONE]", None)]
    #[case("[DONE]", None)]
    #[case("", None)]
    #[case("   ", None)]
    #[case("data: {\"a\":", None)]
    #[case("event: message", None)]
    fn test_decode_line(#[case] line: &str, #[case] expected: Option<Value>) {
        assert_eq!(SseLineDecoder::decode_line(line), expected);
    }

    #[test]
    fn test_feed_across_reads() {
        let mut decoder = SseLineDecoder::new();

        assert_eq!(decoder.feed_str("data: {\"type\":\"con").unwrap(), Vec::<Value>::new());
        assert_eq!(
            decoder.feed_str("tent\",\"content\":\"Hi\"}\n\ndata: {\"type\":\"done\"}\n").unwrap(),
            vec![
                json!({"type": "content", "content": "Hi"}),
                json!({"type": "done"}),
            ]
        );
        assert_eq!(decoder.finish().unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn test_malformed_line_does_not_stop_decoding() {
        let mut decoder = SseLineDecoder::new();
        let values = decoder
            .feed_str("data: nope\ndata: {\"ok\":true}\ndata: [DONE]\n")
            .unwrap();
        assert_eq!(values, vec![json!({"ok": true})]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = SseLineDecoder::new();
        assert!(decoder.feed_str("data: {\"last\":1}").unwrap().is_empty());
        assert_eq!(decoder.finish().unwrap(), vec![json!({"last": 1})]);
    }
}
