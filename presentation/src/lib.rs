//! Presentation layer for xylos
//!
//! This crate contains CLI definitions, output formatters,
//! progress reporters, prompts and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod config;
pub mod input;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatRepl, SlashCommand, cancel_on_ctrl_c, image_stem};
pub use cli::commands::{Cli, Command, OutputFormat};
pub use config::{OutputConfig, ReplConfig};
pub use input::credentials::{prompt_line, prompt_password, read_password_stdin};
pub use output::console::ConsoleFormatter;
pub use output::image::{
    ImageFileError, ImageLocation, read_attachment, read_avatar, store_generated,
};
pub use output::stream::StreamPrinter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
