//! Byte-to-line decoding for streamed responses.
//!
//! Chunks arrive at arbitrary byte boundaries, so both a multi-byte UTF-8
//! character and a logical line may be split across two chunks. The
//! decoders here keep the incomplete tail of each chunk and complete it when
//! the next chunk arrives.

use super::frame::DeltaEvent;

/// Stateful UTF-8 decoder.
///
/// Incomplete sequences at the end of a chunk are held back until the next
/// chunk. Invalid bytes are replaced with U+FFFD instead of failing.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, returning all text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            // Truncated sequence: wait for the next chunk.
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush at end of stream. A dangling partial sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Splits decoded text into lines, buffering an unterminated tail.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and drain every complete line (terminator removed,
    /// trailing `\r` stripped).
    pub fn push(&mut self, text: &str) -> Vec<String> {
        // The held-back tail never contains '\n'; only new text is scanned.
        let mut from = self.buf.len();
        self.buf.push_str(text);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buf[from..].find('\n') {
            let end = from + pos;
            lines.push(self.buf[start..end].trim_end_matches('\r').to_string());
            start = end + 1;
            from = start;
        }
        self.buf.drain(..start);
        lines
    }

    /// Take the unterminated remainder, if any.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buf);
        let rest = rest.trim_end_matches('\r');
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }
}

/// Chunk-in, events-out decoder combining [`Utf8ChunkDecoder`],
/// [`LineBuffer`] and [`DeltaEvent::parse`].
#[derive(Debug, Default)]
pub struct StreamDecoder {
    utf8: Utf8ChunkDecoder,
    lines: LineBuffer,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of bytes and return the events for every line it
    /// completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DeltaEvent> {
        let text = self.utf8.decode(chunk);
        self.lines
            .push(&text)
            .into_iter()
            .map(DeltaEvent::parse)
            .collect()
    }

    /// Flush buffered bytes and the last unterminated line at end of stream.
    pub fn finish(&mut self) -> Vec<DeltaEvent> {
        let tail = self.utf8.finish();
        let mut events: Vec<DeltaEvent> = self
            .lines
            .push(&tail)
            .into_iter()
            .map(DeltaEvent::parse)
            .collect();
        if let Some(last) = self.lines.finish() {
            events.push(DeltaEvent::parse(last));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::frame::LineKind;

    #[test]
    fn decodes_ascii_in_one_go() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(b"hello"), "hello");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn holds_back_split_multibyte_character() {
        // 'é' = 0xC3 0xA9, '😀' = F0 9F 98 80
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xC3]), "a");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(&[0xA9, b'b', 0xF0, 0x9F]), "éb");
        assert_eq!(decoder.decode(&[0x98]), "");
        assert_eq!(decoder.decode(&[0x80]), "😀");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn replaces_invalid_bytes() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn finish_flushes_dangling_sequence() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(&[0xE3, 0x81]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[test]
    fn line_buffer_keeps_partial_line() {
        let mut lines = LineBuffer::new();
        assert!(lines.push("data: {\"a\"").is_empty());
        assert_eq!(lines.push(":1}\r\nnext\n"), vec!["data: {\"a\":1}", "next"]);
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn line_buffer_drains_many_lines_from_one_chunk() {
        let mut lines = LineBuffer::new();
        let body: String = (0..10_000).map(|i| format!("line {}\r\n", i)).collect();

        let out = lines.push(&format!("{}tail", body));

        assert_eq!(out.len(), 10_000);
        assert_eq!(out[0], "line 0");
        assert_eq!(out[9_999], "line 9999");
        assert_eq!(lines.push(" end\n"), vec!["tail end"]);
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn line_buffer_grows_tail_one_byte_at_a_time() {
        let mut lines = LineBuffer::new();
        for c in "data: abc".chars() {
            assert!(lines.push(&c.to_string()).is_empty());
        }
        assert_eq!(lines.push("\r"), Vec::<String>::new());
        assert_eq!(lines.push("\n"), vec!["data: abc"]);
    }

    #[test]
    fn line_buffer_returns_unterminated_tail() {
        let mut lines = LineBuffer::new();
        assert_eq!(lines.push("a\nb"), vec!["a"]);
        assert_eq!(lines.finish(), Some("b".to_string()));
    }

    #[test]
    fn stream_decoder_handles_line_split_across_chunks() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed(b"data: {\"choices\":[{\"del").is_empty());
        let events = decoder.feed(b"ta\":{\"content\":\"hi\"}}]}\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fragment(), Some("hi"));
    }

    #[test]
    fn stream_decoder_parses_final_unterminated_line() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed(b"data: [DONE]").is_empty());
        let events = decoder.finish();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, LineKind::Sentinel);
    }
}
