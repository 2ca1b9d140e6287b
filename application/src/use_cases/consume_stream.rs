//! Consume Stream use case.
//!
//! Reads a streamed chat completion chunk by chunk, reports the growing
//! assistant text to a [`StreamSubscriber`] and hands the final text to a
//! [`ReplyPersister`] exactly once.
//!
//! Chunks are processed strictly in arrival order by a single task. The only
//! suspension points are the next chunk read and the final persistence call.

use crate::ports::completion_endpoint::{ByteStream, TransportError};
use crate::ports::reply_persister::ReplyPersister;
use crate::ports::stream_subscriber::StreamSubscriber;
use futures::StreamExt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use xylos_domain::{AccumulatedMessage, DeltaEvent, LineKind, StreamDecoder, StreamPhase};

/// Errors that end a stream before it completes normally.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The connection failed mid-stream. Text emitted before the failure
    /// stays valid and is carried in `partial`.
    #[error("Response stream interrupted: {source}")]
    Transport {
        #[source]
        source: TransportError,
        partial: String,
        persisted: bool,
    },

    #[error("Response stream cancelled")]
    Cancelled { partial: String },
}

impl StreamError {
    /// Text accumulated before the stream stopped.
    pub fn partial(&self) -> &str {
        match self {
            StreamError::Transport { partial, .. } | StreamError::Cancelled { partial } => partial,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamError::Cancelled { .. })
    }
}

/// Result of a stream that reached its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Concatenation of every content fragment.
    pub text: String,
    /// Number of fragments received.
    pub fragments: usize,
    /// Always [`StreamPhase::Done`] for a returned outcome.
    pub phase: StreamPhase,
    /// Whether the final text was accepted by the persister.
    pub persisted: bool,
}

/// Per-response state. Each consumption owns its own.
#[derive(Default)]
struct ConsumerState {
    phase: StreamPhase,
    decoder: StreamDecoder,
    message: AccumulatedMessage,
    sentinel_seen: bool,
}

impl ConsumerState {
    fn advance(&mut self, next: StreamPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal stream transition {} -> {}",
            self.phase,
            next
        );
        trace!("Stream phase {} -> {}", self.phase, next);
        self.phase = next;
    }

    fn apply(&mut self, events: Vec<DeltaEvent>, subscriber: &mut dyn StreamSubscriber) {
        for event in events {
            if self.sentinel_seen {
                trace!("Ignoring line after [DONE]: {}", event.raw_line);
                continue;
            }
            match event.kind {
                LineKind::Sentinel => {
                    debug!("Received end-of-stream marker");
                    self.sentinel_seen = true;
                }
                LineKind::Malformed | LineKind::Ignored => {}
                LineKind::Frame => {
                    if let Some(fragment) = event.fragment() {
                        let text = self.message.append(fragment);
                        subscriber.on_text(text);
                    }
                }
            }
        }
    }
}

/// Use case for consuming one streamed reply.
#[derive(Debug, Clone)]
pub struct StreamConsumer {
    persist_partial_on_error: bool,
}

impl Default for StreamConsumer {
    fn default() -> Self {
        Self {
            persist_partial_on_error: true,
        }
    }
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether text received before a transport failure is still persisted.
    pub fn with_persist_partial_on_error(mut self, persist: bool) -> Self {
        self.persist_partial_on_error = persist;
        self
    }

    /// Consume `stream` to its end.
    ///
    /// Every appended fragment produces one `subscriber.on_text` call with
    /// the full accumulated text. When the stream ends and text exists it is
    /// persisted once; a persistence failure is logged and does not fail the
    /// stream. Once `cancel` fires no more chunks are read and nothing is
    /// persisted.
    pub async fn consume(
        &self,
        mut stream: ByteStream,
        subscriber: &mut dyn StreamSubscriber,
        persister: &dyn ReplyPersister,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, StreamError> {
        let mut state = ConsumerState::default();
        state.advance(StreamPhase::Streaming);

        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(Self::cancelled(state));
                }
                item = stream.next() => item,
            };

            match item {
                Some(Ok(chunk)) => {
                    trace!("Received chunk of {} bytes", chunk.len());
                    let events = state.decoder.feed(&chunk);
                    state.apply(events, subscriber);
                }
                Some(Err(source)) => {
                    return Err(self.fail(state, source, persister).await);
                }
                None => break,
            }
        }

        let events = state.decoder.finish();
        state.apply(events, subscriber);

        if cancel.is_cancelled() {
            return Err(Self::cancelled(state));
        }

        state.advance(StreamPhase::Finalizing);
        let persisted = persist_once(&state.message, persister).await;
        state.advance(StreamPhase::Done);

        debug!(
            "Stream finished: {} fragments, {} chars",
            state.message.fragments(),
            state.message.text().chars().count()
        );

        Ok(StreamOutcome {
            fragments: state.message.fragments(),
            text: state.message.into_text(),
            phase: state.phase,
            persisted,
        })
    }

    async fn fail(
        &self,
        mut state: ConsumerState,
        source: TransportError,
        persister: &dyn ReplyPersister,
    ) -> StreamError {
        debug!("Response stream failed: {}", source);

        let persisted = if state.message.is_empty() {
            state.advance(StreamPhase::Done);
            false
        } else {
            state.advance(StreamPhase::Finalizing);
            let persisted = if self.persist_partial_on_error {
                persist_once(&state.message, persister).await
            } else {
                false
            };
            state.advance(StreamPhase::Done);
            persisted
        };

        StreamError::Transport {
            source,
            partial: state.message.into_text(),
            persisted,
        }
    }

    fn cancelled(mut state: ConsumerState) -> StreamError {
        state.advance(StreamPhase::Cancelled);
        debug!(
            "Stream cancelled after {} fragments",
            state.message.fragments()
        );
        StreamError::Cancelled {
            partial: state.message.into_text(),
        }
    }
}

async fn persist_once(message: &AccumulatedMessage, persister: &dyn ReplyPersister) -> bool {
    if message.is_empty() {
        return false;
    }
    match persister.persist(message.text()).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Reply not persisted: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::reply_persister::{NoPersistence, PersistError};
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingPersister {
        saved: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingPersister {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn saved(&self) -> Vec<String> {
            self.saved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplyPersister for RecordingPersister {
        async fn persist(&self, text: &str) -> Result<(), PersistError> {
            self.saved.lock().unwrap().push(text.to_string());
            if self.fail {
                Err(PersistError("store offline".into()))
            } else {
                Ok(())
            }
        }
    }

    fn bytes_stream(chunks: Vec<&[u8]>) -> ByteStream {
        let items: Vec<Result<Bytes, TransportError>> = chunks
            .into_iter()
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        stream::iter(items).boxed()
    }

    fn text_stream(chunks: &[&str]) -> ByteStream {
        bytes_stream(chunks.iter().map(|c| c.as_bytes()).collect())
    }

    fn frame(content: &str) -> String {
        format!(
            "data: {}\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    async fn run(
        stream: ByteStream,
        persister: &dyn ReplyPersister,
    ) -> (Result<StreamOutcome, StreamError>, Vec<String>) {
        let mut seen = Vec::new();
        let mut subscriber = |text: &str| seen.push(text.to_string());
        let result = StreamConsumer::new()
            .consume(stream, &mut subscriber, persister, &CancellationToken::new())
            .await;
        (result, seen)
    }

    #[tokio::test]
    async fn test_two_fragments_then_done() {
        let persister = RecordingPersister::default();
        let chunks = [frame("Hel"), frame("lo"), "data: [DONE]\n".to_string()];
        let chunks: Vec<&str> = chunks.iter().map(String::as_str).collect();

        let (result, seen) = run(text_stream(&chunks), &persister).await;

        let outcome = result.unwrap();
        assert_eq!(seen, vec!["Hel", "Hello"]);
        assert_eq!(outcome.text, "Hello");
        assert_eq!(outcome.fragments, 2);
        assert_eq!(outcome.phase, StreamPhase::Done);
        assert!(outcome.persisted);
        assert_eq!(persister.saved(), vec!["Hello"]);
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped() {
        let persister = RecordingPersister::default();
        let body = format!("{}data: not-json\n{}data: [DONE]\n", frame("A"), frame("B"));

        let (result, seen) = run(text_stream(&[&body]), &persister).await;

        assert_eq!(seen, vec!["A", "AB"]);
        assert_eq!(result.unwrap().text, "AB");
        assert_eq!(persister.saved(), vec!["AB"]);
    }

    #[tokio::test]
    async fn test_lines_without_prefix_and_without_content_are_ignored() {
        let persister = RecordingPersister::default();
        let body = format!(
            ": keep-alive\n\nevent: ping\ndata: {{\"choices\":[]}}\ndata: {{\"choices\":[{{\"delta\":{{}}}}]}}\ndata: {{\"choices\":[{{\"delta\":{{\"content\":\"\"}}}}]}}\n{}data: [DONE]\n",
            frame("ok")
        );

        let (result, seen) = run(text_stream(&[&body]), &persister).await;

        assert_eq!(seen, vec!["ok"]);
        assert_eq!(result.unwrap().fragments, 1);
    }

    #[tokio::test]
    async fn test_multibyte_character_split_across_chunks() {
        let persister = RecordingPersister::default();
        let body = format!("{}data: [DONE]\n", frame("caf\u{e9} \u{1f600}"));
        let bytes = body.as_bytes();
        let e_acute = body.find('\u{e9}').unwrap();
        let emoji = body.find('\u{1f600}').unwrap();
        let chunks = vec![
            &bytes[..e_acute + 1],
            &bytes[e_acute + 1..emoji + 2],
            &bytes[emoji + 2..],
        ];

        let (result, seen) = run(bytes_stream(chunks), &persister).await;

        assert_eq!(seen, vec!["caf\u{e9} \u{1f600}"]);
        assert!(!result.unwrap().text.contains('\u{fffd}'));
    }

    #[tokio::test]
    async fn test_line_split_across_chunks() {
        let persister = RecordingPersister::default();
        let body = format!("{}{}data: [DONE]\n", frame("one "), frame("two"));
        let (head, tail) = body.split_at(20);

        let (result, seen) = run(text_stream(&[head, tail]), &persister).await;

        assert_eq!(seen, vec!["one ", "one two"]);
        assert_eq!(result.unwrap().text, "one two");
    }

    #[tokio::test]
    async fn test_emissions_are_monotonic() {
        let persister = RecordingPersister::default();
        let body: String = ["a", "bc", "def", "g"].iter().map(|c| frame(c)).collect();

        let (_, seen) = run(text_stream(&[&body]), &persister).await;

        for pair in seen.windows(2) {
            assert!(pair[1].starts_with(&pair[0]));
            assert!(pair[1].len() > pair[0].len());
        }
        assert_eq!(seen.last().map(String::as_str), Some("abcdefg"));
    }

    #[tokio::test]
    async fn test_frames_after_sentinel_are_ignored() {
        let persister = RecordingPersister::default();
        let body = format!("{}data: [DONE]\n{}", frame("kept"), frame(" dropped"));

        let (result, seen) = run(text_stream(&[&body]), &persister).await;

        assert_eq!(seen, vec!["kept"]);
        assert_eq!(result.unwrap().text, "kept");
    }

    #[tokio::test]
    async fn test_unterminated_last_line_is_processed() {
        let persister = RecordingPersister::default();
        let body = frame("tail");
        let body = body.trim_end_matches('\n');

        let (result, seen) = run(text_stream(&[body]), &persister).await;

        assert_eq!(seen, vec!["tail"]);
        assert_eq!(persister.saved(), vec!["tail"]);
        assert_eq!(result.unwrap().text, "tail");
    }

    #[tokio::test]
    async fn test_empty_stream_is_not_persisted() {
        let persister = RecordingPersister::default();

        let (result, seen) = run(text_stream(&["data: [DONE]\n"]), &persister).await;

        let outcome = result.unwrap();
        assert!(seen.is_empty());
        assert!(outcome.text.is_empty());
        assert!(!outcome.persisted);
        assert!(persister.saved().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_fail_stream() {
        let persister = RecordingPersister::failing();

        let (result, _) = run(text_stream(&[&frame("hi")]), &persister).await;

        let outcome = result.unwrap();
        assert_eq!(outcome.text, "hi");
        assert!(!outcome.persisted);
        assert_eq!(persister.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_after_text_persists_partial() {
        let persister = RecordingPersister::default();
        let first = frame("partial");
        let items: Vec<Result<Bytes, TransportError>> = vec![
            Ok(Bytes::from(first)),
            Err(TransportError::ConnectionReset("peer closed".into())),
            Ok(Bytes::from(frame(" never"))),
        ];

        let (result, seen) = run(stream::iter(items).boxed(), &persister).await;

        assert_eq!(seen, vec!["partial"]);
        match result {
            Err(StreamError::Transport {
                partial, persisted, ..
            }) => {
                assert_eq!(partial, "partial");
                assert!(persisted);
            }
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(persister.saved(), vec!["partial"]);
    }

    #[tokio::test]
    async fn test_transport_error_without_partial_persistence() {
        let persister = RecordingPersister::default();
        let items: Vec<Result<Bytes, TransportError>> = vec![
            Ok(Bytes::from(frame("partial"))),
            Err(TransportError::Read("eof".into())),
        ];
        let mut subscriber = |_: &str| {};

        let result = StreamConsumer::new()
            .with_persist_partial_on_error(false)
            .consume(
                stream::iter(items).boxed(),
                &mut subscriber,
                &persister,
                &CancellationToken::new(),
            )
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.partial(), "partial");
        assert!(persister.saved().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_before_any_text() {
        let persister = RecordingPersister::default();
        let items: Vec<Result<Bytes, TransportError>> =
            vec![Err(TransportError::Read("boom".into()))];

        let (result, seen) = run(stream::iter(items).boxed(), &persister).await;

        assert!(seen.is_empty());
        match result.unwrap_err() {
            StreamError::Transport {
                partial, persisted, ..
            } => {
                assert!(partial.is_empty());
                assert!(!persisted);
            }
            other => panic!("expected transport error, got {:?}", other),
        }
        assert!(persister.saved().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_before_start_reads_nothing() {
        let persister = RecordingPersister::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut seen = Vec::new();
        let mut subscriber = |text: &str| seen.push(text.to_string());

        let result = StreamConsumer::new()
            .consume(text_stream(&[&frame("x")]), &mut subscriber, &persister, &cancel)
            .await;

        assert!(result.unwrap_err().is_cancelled());
        assert!(seen.is_empty());
        assert!(persister.saved().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_skips_persistence() {
        let persister = RecordingPersister::default();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let first: Result<Bytes, TransportError> = Ok(Bytes::from(frame("Hel")));
        let body = stream::iter(vec![first]).chain(stream::pending()).boxed();
        let mut seen = Vec::new();
        let mut subscriber = |text: &str| {
            seen.push(text.to_string());
            trigger.cancel();
        };

        let result = StreamConsumer::new()
            .consume(body, &mut subscriber, &persister, &cancel)
            .await;

        match result.unwrap_err() {
            StreamError::Cancelled { partial } => assert_eq!(partial, "Hel"),
            other => panic!("expected cancellation, got {:?}", other),
        }
        assert_eq!(seen, vec!["Hel"]);
        assert!(persister.saved().is_empty());
    }

    #[tokio::test]
    async fn test_no_persistence_port() {
        let (result, _) = run(text_stream(&[&frame("x")]), &NoPersistence).await;
        assert!(result.unwrap().persisted);
    }

    /// Frames mixed with lines that must not change the result.
    fn noisy_body() -> String {
        let mut body = String::new();
        body.push_str(": ping\r\n");
        body.push_str(&frame("h\u{e9}llo "));
        body.push_str("data: not-json\n");
        body.push_str("event: x\n\n");
        body.push_str(&frame("w\u{f6}rld \u{1f600}"));
        body.push_str("data: {\"choices\":\"bad\"}\r\n");
        body.push_str(&frame("!"));
        body.push_str("data: [DONE]\n");
        body
    }

    const NOISY_EMISSIONS: [&str; 3] = [
        "h\u{e9}llo ",
        "h\u{e9}llo w\u{f6}rld \u{1f600}",
        "h\u{e9}llo w\u{f6}rld \u{1f600}!",
    ];

    #[tokio::test]
    async fn test_every_two_cut_split_gives_same_result() {
        let body = noisy_body();
        let bytes = body.as_bytes();

        for i in 0..=bytes.len() {
            for j in i..=bytes.len() {
                let persister = RecordingPersister::default();
                let chunks = vec![&bytes[..i], &bytes[i..j], &bytes[j..]];

                let (result, seen) = run(bytes_stream(chunks), &persister).await;

                assert_eq!(seen, NOISY_EMISSIONS, "split at {} and {}", i, j);
                assert_eq!(
                    result.unwrap().text,
                    NOISY_EMISSIONS[2],
                    "split at {} and {}",
                    i,
                    j
                );
                assert_eq!(persister.saved(), vec![NOISY_EMISSIONS[2]]);
            }
        }
    }

    #[tokio::test]
    async fn test_byte_at_a_time_gives_same_result() {
        let body = noisy_body();
        let persister = RecordingPersister::default();
        let chunks: Vec<&[u8]> = body.as_bytes().chunks(1).collect();

        let (result, seen) = run(bytes_stream(chunks), &persister).await;

        assert_eq!(seen, NOISY_EMISSIONS);
        assert_eq!(result.unwrap().fragments, 3);
        assert_eq!(persister.saved(), vec![NOISY_EMISSIONS[2]]);
    }

    #[tokio::test]
    async fn test_invalid_lines_anywhere_do_not_change_result() {
        let frames = [frame("a"), frame("bc"), frame("d")];
        let junk = [
            "data: not-json\n",
            "data: {\"choices\":\"bad\"}\n",
            ": ping\r\n",
            "event: x\n",
            "\n",
            "data: {\"choices\":[]}\n",
        ];

        for slot in 0..=frames.len() {
            for line in junk {
                let mut body = String::new();
                for (k, f) in frames.iter().enumerate() {
                    if k == slot {
                        body.push_str(line);
                    }
                    body.push_str(f);
                }
                if slot == frames.len() {
                    body.push_str(line);
                }
                body.push_str("data: [DONE]\n");
                let persister = RecordingPersister::default();

                let (result, seen) = run(text_stream(&[&body]), &persister).await;

                assert_eq!(seen, vec!["a", "abc", "abcd"], "{:?} at {}", line, slot);
                assert_eq!(result.unwrap().text, "abcd");
            }
        }
    }

    /// Log sink for checking what reaches the console at the default level.
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test]
    async fn test_failures_leave_reporting_to_the_caller() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let persister = RecordingPersister::failing();
        let items: Vec<Result<Bytes, TransportError>> = vec![
            Ok(Bytes::from(frame("partial"))),
            Err(TransportError::ConnectionReset("peer closed".into())),
        ];

        let (result, _) = run(stream::iter(items).boxed(), &persister).await;

        match result.unwrap_err() {
            StreamError::Transport { persisted, .. } => assert!(!persisted),
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(persister.saved(), vec!["partial"]);
        assert_eq!(log.contents(), "");
    }
}
