//! In-process fakes shared by the use case tests.

use crate::ports::completion_endpoint::{ByteStream, CompletionEndpoint, EndpointError, TransportError};
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::conversation_store::{ConversationStore, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, TimeZone, Utc};
use futures::{StreamExt, stream};
use std::collections::HashSet;
use std::sync::Mutex;
use xylos_domain::{
    CompletionRequest, Conversation, ConversationId, ConversationMode, Role, StoredMessage, UserId,
};

pub fn frame(content: &str) -> String {
    format!(
        "data: {}\n",
        serde_json::json!({"choices": [{"delta": {"content": content}}]})
    )
}

pub enum Script {
    Body(Vec<String>),
    FailAfter(Vec<String>),
    Reject(u16, String),
}

/// Endpoint replaying a fixed script and recording every request.
pub struct ScriptedEndpoint {
    script: Mutex<Option<Script>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedEndpoint {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(Some(script)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(fragments: &[&str]) -> Self {
        let mut body: Vec<String> = fragments.iter().map(|f| frame(f)).collect();
        body.push("data: [DONE]\n".to_string());
        Self::new(Script::Body(body))
    }
}

#[async_trait]
impl CompletionEndpoint for ScriptedEndpoint {
    async fn open_stream(&self, request: &CompletionRequest) -> Result<ByteStream, EndpointError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self
            .script
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Script::Body(Vec::new()));
        let (chunks, fail) = match script {
            Script::Reject(status, message) => {
                return Err(EndpointError::Rejected { status, message });
            }
            Script::Body(chunks) => (chunks, false),
            Script::FailAfter(chunks) => (chunks, true),
        };
        let mut items: Vec<Result<Bytes, TransportError>> =
            chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
        if fail {
            items.push(Err(TransportError::ConnectionReset("reset".into())));
        }
        Ok(stream::iter(items).boxed())
    }
}

#[derive(Default)]
struct StoreState {
    conversations: Vec<Conversation>,
    messages: Vec<StoredMessage>,
    failing_previews: HashSet<ConversationId>,
    next_id: usize,
    clock: i64,
}

/// Minimal store with a deterministic clock.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
    pub fail_appends: bool,
}

impl FakeStore {
    pub fn failing_appends() -> Self {
        Self {
            fail_appends: true,
            ..Default::default()
        }
    }

    pub fn fail_preview_for(&self, id: &ConversationId) {
        self.state.lock().unwrap().failing_previews.insert(id.clone());
    }

    pub fn stored(&self) -> Vec<StoredMessage> {
        self.state.lock().unwrap().messages.clone()
    }
}

#[async_trait]
impl ConversationStore for FakeStore {
    async fn create(
        &self,
        owner: &UserId,
        mode: ConversationMode,
    ) -> Result<Conversation, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.clock += 1;
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(state.clock);
        let conversation = Conversation {
            id: ConversationId::new(format!("c{}", state.next_id)),
            user_id: owner.clone(),
            mode,
            created_at: at,
            updated_at: at,
        };
        state.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Conversation>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut list: Vec<Conversation> = state
            .conversations
            .iter()
            .filter(|c| &c.user_id == owner)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(list)
    }

    async fn messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let state = self.state.lock().unwrap();
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
        let state = self.state.lock().unwrap();
        if state.failing_previews.contains(conversation_id) {
            return Err(StoreError::RequestFailed("preview unavailable".into()));
        }
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
        if self.fail_appends {
            return Err(StoreError::RequestFailed("insert rejected".into()));
        }
        let mut state = self.state.lock().unwrap();
        state.clock += 1;
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(state.clock);
        if let Some(c) = state
            .conversations
            .iter_mut()
            .find(|c| &c.id == conversation_id)
        {
            c.updated_at = at;
        }
        state.messages.push(StoredMessage {
            conversation_id: conversation_id.clone(),
            role,
            content: content.to_string(),
            created_at: at,
        });
        Ok(())
    }

    async fn delete(&self, conversation_id: &ConversationId) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.conversations.retain(|c| &c.id != conversation_id);
        state.messages.retain(|m| &m.conversation_id != conversation_id);
        Ok(())
    }
}

/// Logger that keeps event types in memory.
#[derive(Default)]
pub struct RecordingLogger {
    pub events: Mutex<Vec<(&'static str, serde_json::Value)>>,
}

impl RecordingLogger {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }
}

impl ConversationLogger for RecordingLogger {
    fn log(&self, event: ConversationEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.event_type, event.payload));
    }
}
