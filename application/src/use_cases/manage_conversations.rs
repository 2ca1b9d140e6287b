//! Manage Conversations use case.
//!
//! Create, open, list and delete the conversations of the signed-in user.

use crate::ports::conversation_store::{ConversationStore, StoreError};
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use xylos_domain::{
    Conversation, ConversationId, ConversationMode, ConversationSummary, Transcript, UserId,
    transcript_from_stored,
};

#[derive(Error, Debug)]
pub enum ManageConversationsError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct ManageConversationsUseCase {
    store: Arc<dyn ConversationStore>,
}

impl ManageConversationsUseCase {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Create an empty conversation.
    pub async fn start_new(
        &self,
        owner: &UserId,
        mode: ConversationMode,
    ) -> Result<Conversation, ManageConversationsError> {
        let conversation = self.store.create(owner, mode).await?;
        info!("Started {} conversation {}", mode, conversation.id);
        Ok(conversation)
    }

    /// Load a conversation's messages as a transcript, oldest first.
    pub async fn load(&self, id: &ConversationId) -> Result<Transcript, ManageConversationsError> {
        let messages = self.store.messages(id).await?;
        debug!("Loaded {} messages for conversation {}", messages.len(), id);
        Ok(transcript_from_stored(&messages))
    }

    /// All conversations of `owner` with their previews, most recent first.
    ///
    /// Previews are fetched concurrently. A conversation whose preview cannot
    /// be read is still listed, with the empty-conversation preview.
    pub async fn list_with_previews(
        &self,
        owner: &UserId,
    ) -> Result<Vec<ConversationSummary>, ManageConversationsError> {
        let conversations = self.store.list_by_owner(owner).await?;

        let previews = join_all(
            conversations
                .iter()
                .map(|c| self.store.first_user_message(&c.id)),
        )
        .await;

        Ok(conversations
            .into_iter()
            .zip(previews)
            .map(|(conversation, preview)| {
                let first = match preview {
                    Ok(first) => first,
                    Err(e) => {
                        warn!("Failed to load preview for {}: {}", conversation.id, e);
                        None
                    }
                };
                ConversationSummary::new(conversation, first.as_ref())
            })
            .collect())
    }

    pub async fn delete(&self, id: &ConversationId) -> Result<(), ManageConversationsError> {
        self.store.delete(id).await?;
        info!("Deleted conversation {}", id);
        Ok(())
    }
}
