//! Chat parameters - use case behaviour control.
//!
//! [`ChatParams`] groups the static knobs that shape a chat exchange.
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use xylos_domain::ConversationMode;

/// Chat exchange parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatParams {
    /// Mode given to newly created conversations.
    pub mode: ConversationMode,
    /// Whether text received before a transport failure is still persisted.
    pub persist_partial_on_error: bool,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            mode: ConversationMode::default(),
            persist_partial_on_error: true,
        }
    }
}

impl ChatParams {
    pub fn with_mode(mut self, mode: ConversationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_persist_partial_on_error(mut self, persist: bool) -> Self {
        self.persist_partial_on_error = persist;
        self
    }
}
