//! Conversation store port
//!
//! Durable storage of conversations and their messages lives in an external
//! service; this port is the whole contract the application relies on.

use async_trait::async_trait;
use thiserror::Error;
use xylos_domain::{Conversation, ConversationId, ConversationMode, Role, StoredMessage, UserId};

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("Not signed in")]
    Unauthorized,

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Storage for conversations and messages.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a conversation owned by `owner`.
    async fn create(
        &self,
        owner: &UserId,
        mode: ConversationMode,
    ) -> Result<Conversation, StoreError>;

    /// All conversations of `owner`, most recently updated first.
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Conversation>, StoreError>;

    /// Messages of a conversation, oldest first.
    async fn messages(&self, conversation_id: &ConversationId)
    -> Result<Vec<StoredMessage>, StoreError>;

    /// Earliest user message of a conversation, used as its preview.
    async fn first_user_message(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<StoredMessage>, StoreError>;

    /// Append a message to a conversation.
    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<(), StoreError>;

    /// Delete a conversation and its messages.
    async fn delete(&self, conversation_id: &ConversationId) -> Result<(), StoreError>;
}
