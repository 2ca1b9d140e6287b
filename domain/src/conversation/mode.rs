//! Workspace mode a conversation was started in.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::DomainError;

/// Workspace a conversation belongs to.
///
/// Only recorded with the conversation; it does not change chat behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationMode {
    #[default]
    Personal,
    Career,
    Team,
    Family,
}

impl ConversationMode {
    pub const ALL: [ConversationMode; 4] = [
        ConversationMode::Personal,
        ConversationMode::Career,
        ConversationMode::Team,
        ConversationMode::Family,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationMode::Personal => "personal",
            ConversationMode::Career => "career",
            ConversationMode::Team => "team",
            ConversationMode::Family => "family",
        }
    }
}

impl fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConversationMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "personal" => Ok(ConversationMode::Personal),
            "career" => Ok(ConversationMode::Career),
            "team" => Ok(ConversationMode::Team),
            "family" => Ok(ConversationMode::Family),
            _ => Err(DomainError::InvalidMode(s.to_string())),
        }
    }
}
