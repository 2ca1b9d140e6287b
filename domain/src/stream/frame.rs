//! Wire frames of a streamed chat completion.
//!
//! The completion endpoint emits server-sent-event style lines:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//! data: [DONE]
//! ```
//!
//! Only `choices[0].delta.content` is read. Everything else in the payload is
//! ignored, and the payload is decoded into a strict schema ([`ChunkFrame`])
//! so a malformed body is rejected at this boundary instead of leaking
//! untyped values into the accumulator.

use serde::Deserialize;

/// Prefix that marks an event-data line.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that signals the end of the streamed data.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Decoded body of a `data:` line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChunkFrame {
    #[serde(default)]
    pub choices: Option<Vec<ChunkChoice>>,
}

/// One element of `choices`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<ChunkDelta>,
}

/// Incremental part of a choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChunkFrame {
    /// `choices[0].delta.content`, if present and non-empty.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .as_deref()?
            .first()?
            .delta
            .as_ref()?
            .content
            .as_deref()
            .filter(|c| !c.is_empty())
    }
}

/// How a single line was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// A `data:` line whose payload decoded into a [`ChunkFrame`].
    Frame,
    /// `data: [DONE]`.
    Sentinel,
    /// A `data:` line whose payload is not a valid frame.
    Malformed,
    /// Anything without the `data: ` prefix (blank lines, comments, `event:`).
    Ignored,
}

/// One parsed unit from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaEvent {
    /// The line as received (without its terminator).
    pub raw_line: String,
    pub kind: LineKind,
    /// Decoded body when the line is a data frame other than the sentinel.
    pub payload: Option<ChunkFrame>,
    /// Extracted text increment.
    pub content_fragment: Option<String>,
}

impl DeltaEvent {
    /// Classify and decode one line.
    ///
    /// Never fails: a payload that is not valid JSON (or does not fit the
    /// frame schema) yields a [`LineKind::Malformed`] event with no fragment.
    pub fn parse(raw_line: impl Into<String>) -> Self {
        let raw_line = raw_line.into();

        let Some(data) = raw_line.strip_prefix(DATA_PREFIX) else {
            return Self::without_payload(raw_line, LineKind::Ignored);
        };

        if data == DONE_SENTINEL {
            return Self::without_payload(raw_line, LineKind::Sentinel);
        }

        match serde_json::from_str::<ChunkFrame>(data) {
            Ok(frame) => {
                let content_fragment = frame.content().map(str::to_owned);
                Self {
                    raw_line,
                    kind: LineKind::Frame,
                    payload: Some(frame),
                    content_fragment,
                }
            }
            Err(e) => {
                tracing::trace!("Skipping malformed frame ({}): {}", e, data);
                Self::without_payload(raw_line, LineKind::Malformed)
            }
        }
    }

    fn without_payload(raw_line: String, kind: LineKind) -> Self {
        Self {
            raw_line,
            kind,
            payload: None,
            content_fragment: None,
        }
    }

    /// The text increment, if this event carries one.
    pub fn fragment(&self) -> Option<&str> {
        self.content_fragment.as_deref()
    }

    pub fn is_sentinel(&self) -> bool {
        self.kind == LineKind::Sentinel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_delta() {
        let event = DeltaEvent::parse(r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#);
        assert_eq!(event.kind, LineKind::Frame);
        assert_eq!(event.fragment(), Some("Hel"));
        assert!(event.payload.is_some());
    }

    #[test]
    fn ignores_unrelated_fields() {
        let event = DeltaEvent::parse(
            r#"data: {"id":"c1","model":"m","choices":[{"index":0,"delta":{"role":"assistant","content":"x"},"finish_reason":null}]}"#,
        );
        assert_eq!(event.fragment(), Some("x"));
    }

    #[test]
    fn sentinel_has_no_payload() {
        let event = DeltaEvent::parse("data: [DONE]");
        assert!(event.is_sentinel());
        assert!(event.payload.is_none());
        assert!(event.fragment().is_none());
    }

    #[test]
    fn invalid_json_is_malformed() {
        let event = DeltaEvent::parse("data: not-json");
        assert_eq!(event.kind, LineKind::Malformed);
        assert!(event.fragment().is_none());
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let event = DeltaEvent::parse(r#"data: {"choices":"nope"}"#);
        assert_eq!(event.kind, LineKind::Malformed);
    }

    #[test]
    fn missing_content_yields_no_fragment() {
        for line in [
            r#"data: {}"#,
            r#"data: {"choices":[]}"#,
            r#"data: {"choices":null}"#,
            r#"data: {"choices":[{}]}"#,
            r#"data: {"choices":[{"delta":{}}]}"#,
            r#"data: {"choices":[{"delta":{"content":null}}]}"#,
            r#"data: {"choices":[{"delta":{"content":""}}]}"#,
        ] {
            let event = DeltaEvent::parse(line);
            assert_eq!(event.kind, LineKind::Frame, "{line}");
            assert!(event.fragment().is_none(), "{line}");
        }
    }

    #[test]
    fn only_first_choice_is_read() {
        let event = DeltaEvent::parse(
            r#"data: {"choices":[{"delta":{"content":"a"}},{"delta":{"content":"b"}}]}"#,
        );
        assert_eq!(event.fragment(), Some("a"));
    }

    #[test]
    fn lines_without_prefix_are_ignored() {
        for line in ["", ": keep-alive", "event: message", "data:{\"choices\":[]}"] {
            assert_eq!(DeltaEvent::parse(line).kind, LineKind::Ignored, "{line}");
        }
    }

    #[test]
    fn raw_line_is_preserved() {
        let line = "data: not-json";
        assert_eq!(DeltaEvent::parse(line).raw_line, line);
    }
}
