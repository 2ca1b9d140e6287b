//! Speech-to-text capability port
//!
//! A narrow, one-shot interface: after [`SpeechRecognizer::start`] the
//! recognizer reports exactly one final transcript or one error to its
//! [`SpeechListener`], then stops on its own.

use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("Speech recognition is not supported: {0}")]
    Unsupported(String),

    #[error("Could not recognize speech: {0}")]
    Recognition(String),

    #[error("Recognition already in progress")]
    Busy,

    #[error("Recognition stopped")]
    Stopped,
}

/// Receives the outcome of one recognition.
pub trait SpeechListener: Send + Sync {
    fn on_result(&self, transcript: String);
    fn on_error(&self, error: SpeechError);
}

/// One-shot speech recognition.
pub trait SpeechRecognizer: Send + Sync {
    /// Begin listening. The outcome is delivered to `listener`.
    fn start(&self, listener: Arc<dyn SpeechListener>) -> Result<(), SpeechError>;

    /// Stop listening early. The listener receives [`SpeechError::Stopped`]
    /// unless a result was already delivered.
    fn stop(&self);
}
