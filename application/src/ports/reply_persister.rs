//! Reply persistence port
//!
//! The final text of a streamed reply is handed to a [`ReplyPersister`]
//! exactly once, after the stream ends.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Failed to persist reply: {0}")]
pub struct PersistError(pub String);

/// Receives the completed assistant reply.
#[async_trait]
pub trait ReplyPersister: Send + Sync {
    async fn persist(&self, text: &str) -> Result<(), PersistError>;
}

/// Persister that keeps nothing.
pub struct NoPersistence;

#[async_trait]
impl ReplyPersister for NoPersistence {
    async fn persist(&self, _text: &str) -> Result<(), PersistError> {
        Ok(())
    }
}
