//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

impl From<OutputFormat> for xylos_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => xylos_domain::OutputFormat::Text,
            OutputFormat::Json => xylos_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for xylos
#[derive(Parser, Debug)]
#[command(name = "xylos")]
#[command(author, version, about = "Streaming AI chat from the terminal")]
#[command(long_about = r#"
Xylos is a terminal client for a hosted AI chat backend. Replies stream in
as they are generated and every conversation is saved to your account.

Configuration files are loaded from (in priority order):
1. XYLOS_<SECTION>__<KEY>          Environment variables
2. --config <path>                 Explicit config file
3. ./xylos.toml or ./.xylos.toml   Project-level config
4. ~/.config/xylos/config.toml     Global config

Example:
  xylos login
  xylos chat
  xylos ask "Summarize the plot of Hamlet in two lines"
  xylos ask --image diagram.png "What does this diagram show?"
  xylos --offline chat
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format for listings
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Keep conversations in memory and skip sign-in (chat still needs the backend)
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start an interactive chat (default)
    Chat {
        /// Continue an existing conversation
        #[arg(long, value_name = "ID")]
        conversation: Option<String>,

        /// Mode for a new conversation (personal, career, team, family)
        #[arg(long, value_name = "MODE")]
        mode: Option<String>,
    },

    /// Send one message and print the streamed reply
    Ask {
        /// The message to send
        message: String,

        /// Attach an image to the message
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,

        /// Continue an existing conversation instead of starting a new one
        #[arg(long, value_name = "ID")]
        conversation: Option<String>,
    },

    /// Generate an image from a prompt
    Image {
        /// What to draw
        prompt: String,

        /// Directory for inline images returned by the backend
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
    },

    /// List your conversations, most recent first
    History,

    /// Delete a conversation
    Delete {
        /// Conversation id
        id: String,
    },

    /// Create an account
    Signup {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        name: Option<String>,

        /// Profile picture to upload (png, jpg, gif or webp)
        #[arg(long, value_name = "PATH")]
        avatar: Option<PathBuf>,

        /// Read the password from stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },

    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,

        /// Read the password from stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },

    /// Sign out and forget the stored session
    Logout,
}
