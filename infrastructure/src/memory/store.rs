//! [`ConversationStore`] kept in memory for the lifetime of the process.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;
use xylos_application::{ConversationStore, StoreError};
use xylos_domain::{Conversation, ConversationId, ConversationMode, Role, StoredMessage, UserId};

#[derive(Default)]
struct State {
    conversations: Vec<Conversation>,
    messages: Vec<StoredMessage>,
}

#[derive(Default)]
pub struct InMemoryConversationStore {
    state: Mutex<State>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(
        &self,
        owner: &UserId,
        mode: ConversationMode,
    ) -> Result<Conversation, StoreError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: ConversationId::new(Uuid::new_v4().to_string()),
            user_id: owner.clone(),
            mode,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .await
            .conversations
            .push(conversation.clone());
        Ok(conversation)
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Conversation>, StoreError> {
        let state = self.state.lock().await;
        let mut list: Vec<Conversation> = state
            .conversations
            .iter()
            .filter(|c| &c.user_id == owner)
            .cloned()
            .collect();
        // newest first among equal timestamps
        list.reverse();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(list)
    }

    async fn messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let state = self.state.lock().await;
        if !state.conversations.iter().any(|c| &c.id == conversation_id) {
            return Err(StoreError::NotFound(conversation_id.clone()));
        }
        Ok(state
            .messages
            .iter()
            .filter(|m| &m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn first_user_message(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<StoredMessage>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .find(|m| &m.conversation_id == conversation_id && m.role == Role::User)
            .cloned())
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let conversation = state
            .conversations
            .iter_mut()
            .find(|c| &c.id == conversation_id)
            .ok_or_else(|| StoreError::NotFound(conversation_id.clone()))?;
        conversation.updated_at = now;
        state.messages.push(StoredMessage {
            conversation_id: conversation_id.clone(),
            role,
            content: content.to_string(),
            created_at: now,
        });
        Ok(())
    }

    async fn delete(&self, conversation_id: &ConversationId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.conversations.retain(|c| &c.id != conversation_id);
        state
            .messages
            .retain(|m| &m.conversation_id != conversation_id);
        Ok(())
    }
}
