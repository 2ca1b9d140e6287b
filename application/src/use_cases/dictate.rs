//! Dictate use case.
//!
//! Runs one speech capture and appends the recognized text to the draft
//! message.

use crate::ports::speech::{SpeechError, SpeechListener, SpeechRecognizer};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use xylos_domain::append_transcript;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DictateError {
    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error("Dictation cancelled")]
    Cancelled,
}

type Outcome = Result<String, SpeechError>;

/// Forwards the first outcome to a oneshot channel and drops the rest.
struct OneShotListener {
    tx: Mutex<Option<oneshot::Sender<Outcome>>>,
}

impl OneShotListener {
    fn deliver(&self, outcome: Outcome) {
        let sender = match self.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(tx) = sender {
            let _ = tx.send(outcome);
        }
    }
}

impl SpeechListener for OneShotListener {
    fn on_result(&self, transcript: String) {
        self.deliver(Ok(transcript));
    }

    fn on_error(&self, error: SpeechError) {
        self.deliver(Err(error));
    }
}

pub struct DictateUseCase {
    recognizer: Arc<dyn SpeechRecognizer>,
}

impl DictateUseCase {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Capture one utterance and return `draft` with it appended.
    pub async fn execute(
        &self,
        draft: &str,
        cancel: &CancellationToken,
    ) -> Result<String, DictateError> {
        let (tx, rx) = oneshot::channel();
        let listener = Arc::new(OneShotListener {
            tx: Mutex::new(Some(tx)),
        });
        self.recognizer.start(listener)?;
        debug!("Listening for speech");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.recognizer.stop();
                return Err(DictateError::Cancelled);
            }
            outcome = rx => outcome.unwrap_or(Err(SpeechError::Stopped)),
        };

        let transcript = outcome?;
        debug!("Recognized {} chars", transcript.len());
        Ok(append_transcript(draft, &transcript))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    enum Reply {
        Text(&'static str),
        Error(SpeechError),
        Silent,
        Drop,
    }

    struct FakeRecognizer {
        reply: Reply,
        stopped: AtomicBool,
        held: Mutex<Option<Arc<dyn SpeechListener>>>,
    }

    impl FakeRecognizer {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                stopped: AtomicBool::new(false),
                held: Mutex::new(None),
            }
        }
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn start(&self, listener: Arc<dyn SpeechListener>) -> Result<(), SpeechError> {
            match &self.reply {
                Reply::Text(t) => {
                    listener.on_result(t.to_string());
                    listener.on_error(SpeechError::Stopped);
                }
                Reply::Error(e) => listener.on_error(e.clone()),
                Reply::Silent => *self.held.lock().unwrap() = Some(listener),
                Reply::Drop => {}
            }
            Ok(())
        }

        fn stop(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_appends_with_separator() {
        let use_case = DictateUseCase::new(Arc::new(FakeRecognizer::new(Reply::Text("world"))));
        let draft = use_case
            .execute("hello", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(draft, "hello world");
    }

    #[tokio::test]
    async fn test_empty_draft_has_no_separator() {
        let use_case = DictateUseCase::new(Arc::new(FakeRecognizer::new(Reply::Text("hi"))));
        let draft = use_case.execute("", &CancellationToken::new()).await.unwrap();
        assert_eq!(draft, "hi");
    }

    #[tokio::test]
    async fn test_recognition_error() {
        let use_case = DictateUseCase::new(Arc::new(FakeRecognizer::new(Reply::Error(
            SpeechError::Recognition("no-speech".into()),
        ))));
        let err = use_case
            .execute("draft", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DictateError::Speech(SpeechError::Recognition("no-speech".into()))
        );
    }

    #[tokio::test]
    async fn test_listener_dropped_without_outcome() {
        let use_case = DictateUseCase::new(Arc::new(FakeRecognizer::new(Reply::Drop)));
        let err = use_case
            .execute("", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, DictateError::Speech(SpeechError::Stopped));
    }

    #[tokio::test]
    async fn test_cancel_stops_recognizer() {
        let recognizer = Arc::new(FakeRecognizer::new(Reply::Silent));
        let use_case = DictateUseCase::new(recognizer.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = use_case.execute("", &cancel).await.unwrap_err();

        assert_eq!(err, DictateError::Cancelled);
        assert!(recognizer.stopped.load(Ordering::SeqCst));
    }
}
