//! Slash commands understood by the chat REPL

use std::path::PathBuf;
use xylos_domain::{ConversationId, ConversationMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    New(Option<ConversationMode>),
    History,
    Open(ConversationId),
    Delete(ConversationId),
    Image(PathBuf),
    Mic,
    Generate(String),
    Help,
    Quit,
}

impl SlashCommand {
    /// Parse a line starting with `/`. The error is shown to the user.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        match name {
            "/quit" | "/exit" | "/q" => Ok(SlashCommand::Quit),
            "/help" | "/h" | "/?" => Ok(SlashCommand::Help),
            "/history" => Ok(SlashCommand::History),
            "/mic" => Ok(SlashCommand::Mic),
            "/new" if arg.is_empty() => Ok(SlashCommand::New(None)),
            "/new" => arg
                .parse()
                .map(|mode| SlashCommand::New(Some(mode)))
                .map_err(|e: xylos_domain::DomainError| e.to_string()),
            "/open" => required(name, arg, "<id>").map(|id| SlashCommand::Open(id.into())),
            "/delete" => required(name, arg, "<id>").map(|id| SlashCommand::Delete(id.into())),
            "/image" => required(name, arg, "<path>").map(|p| SlashCommand::Image(PathBuf::from(p))),
            "/generate" => {
                required(name, arg, "<prompt>").map(|p| SlashCommand::Generate(p.to_string()))
            }
            _ => Err(format!(
                "Unknown command: {}\nType /help for available commands",
                name
            )),
        }
    }
}

fn required<'a>(name: &str, arg: &'a str, usage: &str) -> Result<&'a str, String> {
    if arg.is_empty() {
        Err(format!("Usage: {} {}", name, usage))
    } else {
        Ok(arg)
    }
}
