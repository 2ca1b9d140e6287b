//! Progress reporting for chat exchanges

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use xylos_application::ChatProgressNotifier;

/// Shows a spinner until the first fragment of the reply arrives
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
    message: String,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
            message: "Thinking...".to_string(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Start the spinner outside a chat exchange, e.g. for image generation.
    pub fn start(&self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_message(self.message.clone());
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(old) = slot.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    /// Remove the spinner from the terminal.
    pub fn clear(&self) {
        if let Some(pb) = self.spinner.lock().ok().and_then(|mut slot| slot.take()) {
            pb.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatProgressNotifier for ProgressReporter {
    fn on_request_sent(&self) {
        self.start();
    }

    fn on_first_fragment(&self) {
        self.clear();
    }

    fn on_reply_finished(&self, _success: bool) {
        self.clear();
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ChatProgressNotifier for SimpleProgress {
    fn on_request_sent(&self) {
        eprintln!("{} {}", "->".cyan(), "Waiting for reply".bold());
    }

    fn on_reply_finished(&self, success: bool) {
        if !success {
            eprintln!("  {} {}", "x".red(), "Reply failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_lifecycle() {
        let reporter = ProgressReporter::new().with_message("Drawing...");
        reporter.on_request_sent();
        assert!(reporter.spinner.lock().unwrap().is_some());

        reporter.on_first_fragment();
        assert!(reporter.spinner.lock().unwrap().is_none());

        // Finishing after the spinner is gone is a no-op.
        reporter.on_reply_finished(true);
        assert!(reporter.spinner.lock().unwrap().is_none());
    }

    #[test]
    fn test_restart_replaces_spinner() {
        let reporter = ProgressReporter::new();
        reporter.start();
        reporter.start();
        reporter.clear();
        assert!(reporter.spinner.lock().unwrap().is_none());
    }
}
