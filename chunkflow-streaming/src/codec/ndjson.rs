//! Newline-delimited JSON decoding.

use super::{LineBuffer, LineDecoder};
use crate::error::StreamResult;
use serde_json::Value;

/// Decodes one JSON document per line.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    lines: LineBuffer,
}

impl NdjsonDecoder {
    /// Create a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn decode_line(line: &str) -> Option<Value> {
        if line.trim().is_empty() {
            return None;
        }
        match serde_json::from_str(line) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(line = %line, error = %err, "Failed to parse NDJSON line");
                None
            }
        }
    }
}

impl LineDecoder for NdjsonDecoder {
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
    use serde_json::json;

    #[test]
    fn test_lines_and_blank_lines() {
        let mut decoder = NdjsonDecoder::new();
        let values = decoder
            .feed_str("{\"type\":\"content\",\"content\":\"a\"}\n\n  \n{\"type\":\"done\"}\n")
            .unwrap();
        assert_eq!(
            values,
            vec![json!({"type": "content", "content": "a"}), json!({"type": "done"})]
        );
    }

    #[test]
    fn test_partial_line_waits_for_newline() {
        let mut decoder = NdjsonDecoder::new();
        assert!(decoder.feed_str("{\"n\":").unwrap().is_empty());
        assert_eq!(decoder.feed_str("1}\n{\"n\"").unwrap(), vec![json!({"n": 1})]);
        assert_eq!(decoder.feed_str(":2}").unwrap(), Vec::<Value>::new());
        assert_eq!(decoder.finish().unwrap(), vec![json!({"n": 2})]);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let mut decoder = NdjsonDecoder::new();
        let values = decoder.feed_str("data: {}\n{\"ok\":1}\n").unwrap();
        assert_eq!(values, vec![json!({"ok": 1})]);

        decoder.feed_str("{broken").unwrap();
        assert!(decoder.finish().unwrap().is_empty());
    }

    #[test]
    fn test_blank_remainder_on_finish() {
        let mut decoder = NdjsonDecoder::new();
        decoder.feed_str("{}\n   ").unwrap();
        assert!(decoder.finish().unwrap().is_empty());
    }
}
