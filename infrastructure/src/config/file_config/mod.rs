//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod backend;
mod chat;
mod logging;
mod output;
mod speech;

pub use backend::FileBackendConfig;
pub use chat::FileChatConfig;
pub use logging::{FileLoggingConfig, expand_home};
pub use output::FileOutputConfig;
pub use speech::FileSpeechConfig;

use serde::{Deserialize, Serialize};
use xylos_domain::ConfigIssue;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Hosted backend endpoint and key
    pub backend: FileBackendConfig,
    /// Chat behaviour
    pub chat: FileChatConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Speech-to-text command
    pub speech: FileSpeechConfig,
    /// Transcript and diagnostic log locations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// With `offline` set the backend is not contacted, so a missing
    /// `backend.url` is only a warning.
    pub fn validate(&self, offline: bool) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.backend.validate(offline));
        issues.extend(self.chat.parse_mode().1);
        issues
    }
}
