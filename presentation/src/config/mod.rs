//! Presentation-level configuration
//!
//! Configuration for output formatting and REPL behavior.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use xylos_domain::OutputFormat;

/// Output configuration for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format for listings
    pub format: OutputFormat,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
        }
    }
}

/// REPL configuration for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Show progress indicators
    pub show_progress: bool,
    /// Path to history file
    pub history_file: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
        }
    }
}

impl ReplConfig {
    /// Configured history file, or `$XDG_DATA_HOME/xylos/history.txt`.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("xylos").join("history.txt")))
    }
}
