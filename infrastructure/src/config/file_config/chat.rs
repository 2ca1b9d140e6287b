//! Chat configuration from TOML (`[chat]` section)

use serde::{Deserialize, Serialize};
use xylos_domain::{ConfigIssue, ConfigIssueCode, ConversationMode, Severity};

/// Raw chat configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    /// Mode for new conversations (personal, career, team, family)
    pub mode: String,
    /// Show a spinner while waiting for the first fragment
    pub show_progress: bool,
    /// Path to the REPL history file
    pub history_file: Option<String>,
    /// Keep text received before a dropped connection
    pub persist_partial_on_error: bool,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        Self {
            mode: ConversationMode::default().to_string(),
            show_progress: true,
            history_file: None,
            persist_partial_on_error: true,
        }
    }
}

impl FileChatConfig {
    /// Parse `mode`, falling back to the default mode with a warning.
    pub fn parse_mode(&self) -> (ConversationMode, Vec<ConfigIssue>) {
        match self.mode.parse::<ConversationMode>() {
            Ok(mode) => (mode, Vec::new()),
            Err(_) => (
                ConversationMode::default(),
                vec![ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::InvalidEnumValue {
                        field: "chat.mode".to_string(),
                        value: self.mode.clone(),
                        valid_values: ConversationMode::ALL
                            .iter()
                            .map(|m| m.to_string())
                            .collect(),
                    },
                    message: format!(
                        "chat.mode: unknown value '{}', falling back to '{}'",
                        self.mode,
                        ConversationMode::default()
                    ),
                }],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_case_insensitive() {
        let config = FileChatConfig {
            mode: "Career".into(),
            ..Default::default()
        };
        let (mode, issues) = config.parse_mode();
        assert_eq!(mode, ConversationMode::Career);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_parse_mode_unknown_falls_back() {
        let config = FileChatConfig {
            mode: "work".into(),
            ..Default::default()
        };
        let (mode, issues) = config.parse_mode();
        assert_eq!(mode, ConversationMode::Personal);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }
}
