//! Console output formatter for conversations and errors

use crate::config::OutputConfig;
use colored::Colorize;
use xylos_domain::core::string::one_line;
use xylos_domain::{ConversationMode, ConversationSummary, OutputFormat, Transcript, Role};

const PREVIEW_WIDTH: usize = 60;

/// Formats conversations and notices for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Turn off colors for the whole process when configured
    pub fn apply_color(config: &OutputConfig) {
        if !config.color {
            colored::control::set_override(false);
        }
    }

    /// Format the conversation history in the requested format
    pub fn format_history(summaries: &[ConversationSummary], format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => Self::history_text(summaries),
            OutputFormat::Json => Self::history_json(summaries),
        }
    }

    fn history_text(summaries: &[ConversationSummary]) -> String {
        if summaries.is_empty() {
            return format!("{}\n", "No conversations yet.".dimmed());
        }

        let mut output = String::new();
        output.push_str(&Self::section_header("Conversations"));
        for summary in summaries {
            let conversation = &summary.conversation;
            output.push_str(&format!(
                "  {}  {}  {:<8} {}\n",
                conversation.id.as_str().yellow(),
                conversation
                    .updated_at
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
                    .dimmed(),
                conversation.mode.as_str(),
                one_line(&summary.preview, PREVIEW_WIDTH)
            ));
        }
        output
    }

    /// Format as JSON
    fn history_json(summaries: &[ConversationSummary]) -> String {
        serde_json::to_string_pretty(summaries).unwrap_or_else(|_| "[]".to_string())
    }

    /// Replay a loaded transcript, e.g. after opening a conversation
    pub fn format_transcript(transcript: &Transcript) -> String {
        let mut output = String::new();
        for message in transcript.messages() {
            let label = match message.role {
                Role::User => "You:".cyan().bold(),
                Role::Assistant => "Xylos:".green().bold(),
            };
            output.push_str(&format!("{} {}\n\n", label, message.text()));
        }
        output
    }

    pub fn welcome(mode: ConversationMode, offline: bool) -> String {
        let mut output = String::new();
        output.push('\n');
        output.push_str("╭─────────────────────────────────────────────╮\n");
        output.push_str("│               Xylos - Chat Mode             │\n");
        output.push_str("╰─────────────────────────────────────────────╯\n");
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Mode:".cyan().bold(), mode));
        if offline {
            output.push_str(&format!(
                "{}\n",
                "Offline: conversations are kept in memory only".yellow()
            ));
        }
        output.push('\n');
        output.push_str("Type /help for commands.\n");
        output
    }

    pub fn help() -> String {
        let mut output = String::new();
        output.push('\n');
        output.push_str(&format!("{}\n", "Commands:".cyan().bold()));
        output.push_str("  /new [mode]         - Start a new conversation\n");
        output.push_str("  /history            - List your conversations\n");
        output.push_str("  /open <id>          - Continue a conversation\n");
        output.push_str("  /delete <id>        - Delete a conversation\n");
        output.push_str("  /image <path>       - Attach an image to the next message\n");
        output.push_str("  /mic                - Dictate into the input line\n");
        output.push_str("  /generate <prompt>  - Generate an image\n");
        output.push_str("  /help, /h, /?       - Show this help\n");
        output.push_str("  /quit, /exit, /q    - Exit chat\n");
        output.push('\n');
        output.push_str(&format!(
            "{}\n",
            "Press Ctrl-C while a reply streams to stop it.".dimmed()
        ));
        output
    }

    /// One-line error notice
    pub fn error(message: &str) -> String {
        format!("{} {}", "Error:".red().bold(), message)
    }

    /// One-line warning notice
    pub fn warning(message: &str) -> String {
        format!("{} {}", "Warning:".yellow().bold(), message)
    }

    /// One-line success notice
    pub fn success(message: &str) -> String {
        format!("{} {}", "v".green(), message)
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }
}
