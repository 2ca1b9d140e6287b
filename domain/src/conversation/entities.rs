//! Conversation entities as stored by the conversation store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::mode::ConversationMode;
use crate::chat::entities::{ChatMessage, Role, Transcript};

/// Preview shown for a conversation without any user message yet.
pub const EMPTY_PREVIEW: &str = "New conversation";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a conversation, assigned by the store.
    ConversationId
);

string_id!(
    /// Identifier of an authenticated user, assigned by the auth service.
    UserId
);

/// A conversation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: UserId,
    #[serde(default)]
    pub mode: ConversationMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted chat message row. Content is always plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub conversation_id: ConversationId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone().into(),
        }
    }
}

/// Rebuild a transcript from stored rows (already in ascending order).
pub fn transcript_from_stored(messages: &[StoredMessage]) -> Transcript {
    Transcript::from_messages(messages.iter().map(StoredMessage::to_chat_message).collect())
}

/// A conversation together with the preview shown in history lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub preview: String,
}

impl ConversationSummary {
    /// Preview is the earliest user message, or [`EMPTY_PREVIEW`].
    pub fn new(conversation: Conversation, first_user_message: Option<&StoredMessage>) -> Self {
        let preview = first_user_message
            .map(|m| m.content.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| EMPTY_PREVIEW.to_string());
        Self {
            conversation,
            preview,
        }
    }
}
