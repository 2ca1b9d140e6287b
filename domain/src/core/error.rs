//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Message is empty")]
    EmptyInput,

    #[error("No active conversation")]
    NoConversation,

    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid conversation mode: {0} (expected personal, career, team or family)")]
    InvalidMode(String),

    #[error("Unsupported image type: {0}")]
    UnsupportedImageType(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Password is empty")]
    EmptyPassword,

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
