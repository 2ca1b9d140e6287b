//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL conversation transcript file
    pub transcript: Option<String>,
    /// Directory for daily rolling diagnostic logs
    pub directory: Option<String>,
}

impl FileLoggingConfig {
    pub fn transcript_path(&self) -> Option<PathBuf> {
        self.transcript.as_deref().map(expand_home)
    }

    pub fn directory_path(&self) -> Option<PathBuf> {
        self.directory.as_deref().map(expand_home)
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
