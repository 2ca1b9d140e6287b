//! Speech configuration from TOML (`[speech]` section)

use serde::{Deserialize, Serialize};

/// External speech-to-text command.
///
/// The command records one utterance and prints the transcript on stdout.
/// Dictation is unavailable while `command` is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSpeechConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
}
