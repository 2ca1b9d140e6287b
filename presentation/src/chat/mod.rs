//! Interactive chat module
//!
//! Provides a readline-based interactive chat interface.

mod command;
mod repl;

pub use command::SlashCommand;
pub use repl::{ChatRepl, cancel_on_ctrl_c, image_stem};
