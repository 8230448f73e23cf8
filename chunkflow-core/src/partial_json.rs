//! Best-effort parsing of incomplete JSON.
//!
//! Tool call arguments arrive a few characters at a time, so most of the
//! strings we see while a call is streaming are truncated JSON documents.
//! [`parse_partial_json`] recovers the deepest value the valid prefix can
//! represent: unterminated strings, arrays and objects are closed, and a
//! trailing token that cannot be completed (a dangling key, a half-written
//! escape, `tru`, `1e`) is discarded.
//!
//! ```rust
//! use chunkflow_core::partial_json::parse_partial_json;
//! use serde_json::json;
//!
//! assert_eq!(parse_partial_json(r#"{"city":"Par"#), Some(json!({"city": "Par"})));
//! assert_eq!(parse_partial_json(r#"{"units":["c","#), Some(json!({"units": ["c"]})));
//! assert_eq!(parse_partial_json("not json"), None);
//! ```

use serde_json::Value;

/// A parser for tool call argument text.
///
/// The stream processor re-parses the full accumulated arguments after every
/// delta, so implementations must be pure: the result may depend only on
/// `text`.
pub trait JsonParser: Send + Sync {
    /// Parse `text`, returning `None` when nothing usable can be recovered.
    fn parse(&self, text: &str) -> Option<Value>;
}

/// The default [`JsonParser`], backed by [`parse_partial_json`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialJsonParser;

impl JsonParser for PartialJsonParser {
    fn parse(&self, text: &str) -> Option<Value> {
        parse_partial_json(text)
    }
}

impl<F> JsonParser for F
where
    F: Fn(&str) -> Option<Value> + Send + Sync,
{
    fn parse(&self, text: &str) -> Option<Value> {
        self(text)
    }
}

/// Parse a possibly truncated JSON document.
///
/// Strict parsing is tried first. When that fails the text is scanned to
/// find where its prefix can be closed into a valid document, and the
/// repaired document is parsed instead. Never panics.
pub fn parse_partial_json(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    Scanner::new(text)
        .run()
        .candidates()
        .find_map(|candidate| serde_json::from_str(&candidate).ok())
}

/// What an open object expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectSlot {
    FirstKey,
    Key,
    Colon,
    Value,
    CommaOrEnd,
}

/// What an open array expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArraySlot {
    FirstValue,
    Value,
    CommaOrEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object(ObjectSlot),
    Array(ArraySlot),
}

/// A point where the input can be cut and closed with `suffix`.
#[derive(Debug, Clone)]
struct Cut {
    end: usize,
    suffix: String,
}

enum Step {
    Continue,
    Stop,
    /// A value string ran into the end of the input.
    Unterminated(Cut),
}

struct Repair<'a> {
    text: &'a str,
    tail: Option<Cut>,
    safe: Option<Cut>,
}

impl Repair<'_> {
    /// Repaired documents, deepest first.
    fn candidates(&self) -> impl Iterator<Item = String> + '_ {
        self.tail
            .iter()
            .chain(self.safe.iter())
            .map(|cut| format!("{}{}", &self.text[..cut.end], cut.suffix))
    }
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    stack: Vec<Frame>,
    root_done: bool,
    safe: Option<Cut>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            stack: Vec::new(),
            root_done: false,
            safe: None,
        }
    }

    fn run(mut self) -> Repair<'a> {
        let tail = loop {
            self.skip_whitespace();
            let Some(&byte) = self.bytes.get(self.pos) else {
                break None;
            };
            match self.step(byte) {
                Step::Continue => {}
                Step::Stop => break None,
                Step::Unterminated(cut) => break Some(cut),
            }
        };

        Repair {
            text: self.text,
            tail,
            safe: self.safe,
        }
    }

    fn step(&mut self, byte: u8) -> Step {
        match (self.stack.last().copied(), byte) {
            (Some(Frame::Object(ObjectSlot::FirstKey | ObjectSlot::CommaOrEnd)), b'}')
            | (Some(Frame::Array(ArraySlot::FirstValue | ArraySlot::CommaOrEnd)), b']') => {
                self.pos += 1;
                self.stack.pop();
                self.value_done();
                Step::Continue
            }
            (Some(Frame::Object(ObjectSlot::FirstKey | ObjectSlot::Key)), b'"') => {
                self.string(false)
            }
            (Some(Frame::Object(ObjectSlot::Colon)), b':') => {
                self.pos += 1;
                self.replace_top(Frame::Object(ObjectSlot::Value));
                Step::Continue
            }
            (Some(Frame::Object(ObjectSlot::CommaOrEnd)), b',') => {
                self.pos += 1;
                self.replace_top(Frame::Object(ObjectSlot::Key));
                Step::Continue
            }
            (Some(Frame::Array(ArraySlot::CommaOrEnd)), b',') => {
                self.pos += 1;
                self.replace_top(Frame::Array(ArraySlot::Value));
                Step::Continue
            }
            _ if self.expects_value() => self.value(byte),
            _ => Step::Stop,
        }
    }

    fn expects_value(&self) -> bool {
        match self.stack.last() {
            None => !self.root_done,
            Some(Frame::Object(slot)) => *slot == ObjectSlot::Value,
            Some(Frame::Array(slot)) => matches!(slot, ArraySlot::FirstValue | ArraySlot::Value),
        }
    }

    fn value(&mut self, byte: u8) -> Step {
        match byte {
            b'{' => {
                self.pos += 1;
                self.stack.push(Frame::Object(ObjectSlot::FirstKey));
                self.mark_safe();
                Step::Continue
            }
            b'[' => {
                self.pos += 1;
                self.stack.push(Frame::Array(ArraySlot::FirstValue));
                self.mark_safe();
                Step::Continue
            }
            b'"' => self.string(true),
            b'-' | b'0'..=b'9' => self.number(),
            b't' | b'f' | b'n' => self.literal(),
            _ => Step::Stop,
        }
    }

    fn string(&mut self, is_value: bool) -> Step {
        let mut i = self.pos + 1;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'"' => {
                    self.pos = i + 1;
                    if is_value {
                        self.value_done();
                    } else {
                        self.replace_top(Frame::Object(ObjectSlot::Colon));
                    }
                    return Step::Continue;
                }
                b'\\' => {
                    let escape_len = match self.bytes.get(i + 1) {
                        Some(b'u') => match self.unicode_escape(i) {
                            // a high surrogate is kept only together with its low half
                            Some(0xD800..=0xDBFF) => match self.unicode_escape(i + 6) {
                                Some(0xDC00..=0xDFFF) => 12,
                                _ if i + 12 > self.bytes.len() => 12,
                                _ => return Step::Stop,
                            },
                            Some(0xDC00..=0xDFFF) => return Step::Stop,
                            Some(_) => 6,
                            None if i + 6 > self.bytes.len() => 6,
                            None => return Step::Stop,
                        },
                        _ => 2,
                    };
                    if i + escape_len > self.bytes.len() {
                        // half-written escape: cut before the backslash
                        return self.unterminated(is_value, i);
                    }
                    i += escape_len;
                }
                _ => i += 1,
            }
        }
        self.unterminated(is_value, self.bytes.len())
    }

    /// The code unit of a complete `\uXXXX` escape starting at `at`.
    fn unicode_escape(&self, at: usize) -> Option<u16> {
        let escape = self.bytes.get(at..at + 6)?;
        if !escape.starts_with(b"\\u") || !escape[2..].iter().all(u8::is_ascii_hexdigit) {
            return None;
        }
        let hex = std::str::from_utf8(&escape[2..]).ok()?;
        u16::from_str_radix(hex, 16).ok()
    }

    fn unterminated(&self, is_value: bool, end: usize) -> Step {
        if !is_value {
            return Step::Stop;
        }
        let mut suffix = String::from('"');
        suffix.push_str(&self.closers());
        Step::Unterminated(Cut { end, suffix })
    }

    fn number(&mut self) -> Step {
        let start = self.pos;
        let mut end = start;
        while end < self.bytes.len()
            && matches!(self.bytes[end], b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E')
        {
            end += 1;
        }

        let token = &self.text[start..end];
        if !serde_json::from_str::<Value>(token).is_ok_and(|v| v.is_number()) {
            return Step::Stop;
        }
        self.pos = end;
        self.value_done();
        Step::Continue
    }

    fn literal(&mut self) -> Step {
        let start = self.pos;
        let mut end = start;
        while end < self.bytes.len() && self.bytes[end].is_ascii_alphabetic() {
            end += 1;
        }

        if !matches!(&self.text[start..end], "true" | "false" | "null") {
            return Step::Stop;
        }
        self.pos = end;
        self.value_done();
        Step::Continue
    }

    fn value_done(&mut self) {
        match self.stack.last_mut() {
            None => self.root_done = true,
            Some(frame @ Frame::Object(_)) => *frame = Frame::Object(ObjectSlot::CommaOrEnd),
            Some(frame @ Frame::Array(_)) => *frame = Frame::Array(ArraySlot::CommaOrEnd),
        }
        self.mark_safe();
    }

    fn replace_top(&mut self, frame: Frame) {
        if let Some(top) = self.stack.last_mut() {
            *top = frame;
        }
    }

    fn mark_safe(&mut self) {
        self.safe = Some(Cut {
            end: self.pos,
            suffix: self.closers(),
        });
    }

    fn closers(&self) -> String {
        self.stack
            .iter()
            .rev()
            .map(|frame| match frame {
                Frame::Object(_) => '}',
                Frame::Array(_) => ']',
            })
            .collect()
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len()
            && matches!(self.bytes[self.pos], b' ' | b'\t' | b'\n' | b'\r')
        {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(r#"{"x":1}"#, json!({"x": 1}))]
    #[case(r#"{"x":1"#, json!({"x": 1}))]
    #[case(r#"{"x":1,"#, json!({"x": 1}))]
    #[case(r#"{"x":1,"y""#, json!({"x": 1}))]
    #[case(r#"{"x":1,"y":"#, json!({"x": 1}))]
    #[case(r#"{"name":"Jo"#, json!({"name": "Jo"}))]
    #[case(r#"{"name":""#, json!({"name": ""}))]
    #[case(r#"{"a":[1,2,"#, json!({"a": [1, 2]}))]
    #[case(r#"{"a":[1,{"b":2"#, json!({"a": [1, {"b": 2}]}))]
    #[case(r#"{"a":{"b":"#, json!({"a": {}}))]
    #[case(r#"{"ok":tr"#, json!({}))]
    #[case(r#"{"ok":true"#, json!({"ok": true}))]
    #[case(r#"{"n":null,"f":fals"#, json!({"n": null}))]
    #[case(r#"{"n":-"#, json!({}))]
    #[case(r#"{"n":1.5e"#, json!({}))]
    #[case(r#"{"n":-12.5"#, json!({"n": -12.5}))]
    #[case(r#"[{"a":1},{"#, json!([{"a": 1}, {}]))]
    #[case(r#"["a","b"#, json!(["a", "b"]))]
    #[case(r#""hello"#, json!("hello"))]
    #[case("{", json!({}))]
    #[case("[", json!([]))]
    fn test_truncated_documents(#[case] input: &str, #[case] expected: Value) {
        assert_eq!(parse_partial_json(input), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("not json")]
    #[case("}")]
    #[case("-")]
    #[case("tru")]
    fn test_unrecoverable(#[case] input: &str) {
        assert_eq!(parse_partial_json(input), None);
    }

    #[test]
    fn test_half_written_escapes_are_dropped() {
        assert_eq!(
            parse_partial_json(r#"{"path":"C:\"#),
            Some(json!({"path": "C:"}))
        );
        assert_eq!(
            parse_partial_json(r#"{"s":"caf\u00"#),
            Some(json!({"s": "caf"}))
        );
        assert_eq!(
            parse_partial_json(r#"{"s":"a\nb"#),
            Some(json!({"s": "a\nb"}))
        );
    }

    #[rstest]
    #[case(r#"{"s":"hi \ud83d"#, json!({"s": "hi "}))]
    #[case(r#"{"s":"hi \ud83d\ude"#, json!({"s": "hi "}))]
    #[case(r#"{"s":"hi \ud83d\"#, json!({"s": "hi "}))]
    #[case(r#"{"a":1,"s":"x\ud83d"#, json!({"a": 1, "s": "x"}))]
    #[case(r#"{"s":"hi \ud83d\ude00"#, json!({"s": "hi \u{1F600}"}))]
    #[case(r#"{"s":"hi \ud83d\ude00!"}"#, json!({"s": "hi \u{1F600}!"}))]
    fn test_split_surrogate_pairs(#[case] input: &str, #[case] expected: Value) {
        assert_eq!(parse_partial_json(input), Some(expected));
    }

    #[test]
    fn test_unpaired_surrogate_falls_back_to_last_safe_value() {
        assert_eq!(
            parse_partial_json(r#"{"a":1,"s":"x\udc00 and more text"}"#),
            Some(json!({"a": 1}))
        );
        assert_eq!(
            parse_partial_json(r#"{"a":1,"s":"x\ud83d and more text"}"#),
            Some(json!({"a": 1}))
        );
    }

    #[test]
    fn test_escaped_quote_does_not_end_string() {
        assert_eq!(
            parse_partial_json(r#"{"q":"say \"hi"#),
            Some(json!({"q": "say \"hi"}))
        );
    }

    #[test]
    fn test_multibyte_text_is_kept() {
        assert_eq!(
            parse_partial_json(r#"{"city":"Zürich", "note":"日本"#),
            Some(json!({"city": "Zürich", "note": "日本"}))
        );
    }

    #[test]
    fn test_trailing_garbage_keeps_complete_value() {
        assert_eq!(parse_partial_json(r#"{"a":1} trailing"#), Some(json!({"a": 1})));
    }

    #[test]
    fn test_whitespace_between_tokens() {
        assert_eq!(
            parse_partial_json("{ \"a\" : [ 1 ,\n 2 "),
            Some(json!({"a": [1, 2]}))
        );
    }

    #[test]
    fn test_pure_function_of_input() {
        let first = parse_partial_json(r#"{"a":"b"#);
        let _ = parse_partial_json("garbage");
        let second = parse_partial_json(r#"{"a":"b"#);
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_prefix_is_safe() {
        let doc = concat!(
            r#"{"query":"rust \"async\"","limit":10,"#,
            r#""filters":[{"lang":"en"},null,true],"score":-1.5e3}"#,
        );
        for end in 0..=doc.len() {
            if doc.is_char_boundary(end) {
                let _ = parse_partial_json(&doc[..end]);
            }
        }
        assert_eq!(
            parse_partial_json(doc),
            serde_json::from_str::<Value>(doc).ok()
        );
    }

    #[test]
    fn test_parser_trait_impls() {
        let parser = PartialJsonParser;
        assert_eq!(parser.parse(r#"{"a":1"#), Some(json!({"a": 1})));

        let strict = |text: &str| serde_json::from_str::<Value>(text).ok();
        assert_eq!(strict.parse(r#"{"a":1"#), None);
        assert_eq!(strict.parse(r#"{"a":1}"#), Some(json!({"a": 1})));
    }
}
