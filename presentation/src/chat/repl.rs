//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::chat::command::SlashCommand;
use crate::output::image::{ImageLocation, read_attachment, store_generated};
use crate::output::stream::StreamPrinter;
use crate::{ConsoleFormatter, ProgressReporter};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use xylos_application::{
    ChatProgressNotifier, DictateError, DictateUseCase, GenerateImageUseCase,
    ManageConversationsUseCase, NoChatProgress, SendMessageInput, SendMessageUseCase,
};
use xylos_domain::{
    ConversationId, ConversationMode, ImageAttachment, OutputFormat, Transcript, UserId,
};

/// Interactive chat REPL
pub struct ChatRepl {
    send: SendMessageUseCase,
    conversations: ManageConversationsUseCase,
    images: Option<GenerateImageUseCase>,
    dictation: Option<DictateUseCase>,
    owner: UserId,
    mode: ConversationMode,
    show_progress: bool,
    offline: bool,
    history_file: Option<PathBuf>,
    image_dir: PathBuf,
    initial_conversation: Option<ConversationId>,

    conversation_id: Option<ConversationId>,
    transcript: Transcript,
    attachment: Option<ImageAttachment>,
    draft: String,
}

impl ChatRepl {
    /// Create a new ChatRepl
    pub fn new(
        send: SendMessageUseCase,
        conversations: ManageConversationsUseCase,
        owner: UserId,
    ) -> Self {
        Self {
            send,
            conversations,
            images: None,
            dictation: None,
            owner,
            mode: ConversationMode::default(),
            show_progress: true,
            offline: false,
            history_file: None,
            image_dir: PathBuf::from("."),
            initial_conversation: None,
            conversation_id: None,
            transcript: Transcript::new(),
            attachment: None,
            draft: String::new(),
        }
    }

    /// Mode used for conversations started from this REPL
    pub fn with_mode(mut self, mode: ConversationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_file = path;
        self
    }

    /// Enable `/generate`; inline images are saved under `dir`
    pub fn with_image_generation(mut self, images: GenerateImageUseCase, dir: PathBuf) -> Self {
        self.images = Some(images);
        self.image_dir = dir;
        self
    }

    /// Enable `/mic`
    pub fn with_dictation(mut self, dictation: DictateUseCase) -> Self {
        self.dictation = Some(dictation);
        self
    }

    /// Open this conversation before the first prompt
    pub fn with_conversation(mut self, id: Option<ConversationId>) -> Self {
        self.initial_conversation = id;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        if let Some(ref path) = self.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        print!("{}", ConsoleFormatter::welcome(self.mode, self.offline));

        if let Some(id) = self.initial_conversation.take() {
            self.open(id).await;
        }

        loop {
            let draft = std::mem::take(&mut self.draft);
            let readline = if draft.is_empty() {
                rl.readline(&self.prompt())
            } else {
                rl.readline_with_initial(&self.prompt(), (draft.as_str(), ""))
            };

            match readline {
                Ok(line) => {
                    let trimmed = line.trim();

                    // Skip empty lines
                    if trimmed.is_empty() {
                        continue;
                    }

                    // Handle commands
                    if trimmed.starts_with('/') {
                        match SlashCommand::parse(trimmed) {
                            Ok(command) => {
                                // Dictation extends the line that was pre-filled.
                                if command == SlashCommand::Mic {
                                    self.draft = draft;
                                }
                                if self.handle_command(command).await {
                                    break;
                                }
                            }
                            Err(message) => println!("{}", message),
                        }
                        continue;
                    }

                    let _ = rl.add_history_entry(line.as_str());
                    self.send_message(&line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("{}", ConsoleFormatter::error(&format!("{:?}", err)));
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_file {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn prompt(&self) -> String {
        if self.attachment.is_some() {
            format!("{} [image] > ", self.mode)
        } else {
            format!("{} > ", self.mode)
        }
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&mut self, command: SlashCommand) -> bool {
        match command {
            SlashCommand::Quit => {
                println!("Bye!");
                return true;
            }
            SlashCommand::Help => print!("{}", ConsoleFormatter::help()),
            SlashCommand::New(mode) => {
                if let Some(mode) = mode {
                    self.mode = mode;
                }
                self.reset();
                if self.ensure_conversation().await.is_some() {
                    println!("Started a new {} conversation", self.mode);
                }
            }
            SlashCommand::History => {
                match self.conversations.list_with_previews(&self.owner).await {
                    Ok(list) => print!(
                        "{}",
                        ConsoleFormatter::format_history(&list, OutputFormat::Text)
                    ),
                    Err(e) => eprintln!("{}", ConsoleFormatter::error(&e.to_string())),
                }
            }
            SlashCommand::Open(id) => self.open(id).await,
            SlashCommand::Delete(id) => match self.conversations.delete(&id).await {
                Ok(()) => {
                    if self.conversation_id.as_ref() == Some(&id) {
                        self.reset();
                    }
                    println!("{}", ConsoleFormatter::success(&format!("Deleted {}", id)));
                }
                Err(e) => eprintln!("{}", ConsoleFormatter::error(&e.to_string())),
            },
            SlashCommand::Image(path) => {
                let path = expand_tilde(&path);
                match read_attachment(&path) {
                    Ok(attachment) => {
                        println!(
                            "{}",
                            ConsoleFormatter::success(&format!(
                                "Attached {} ({} bytes) to your next message",
                                path.display(),
                                attachment.byte_len()
                            ))
                        );
                        self.attachment = Some(attachment);
                    }
                    Err(e) => eprintln!("{}", ConsoleFormatter::error(&e.to_string())),
                }
            }
            SlashCommand::Mic => self.dictate().await,
            SlashCommand::Generate(prompt) => self.generate(&prompt).await,
        }
        false
    }

    /// Drop the current conversation and any pending attachment.
    fn reset(&mut self) {
        self.conversation_id = None;
        self.transcript.clear();
        self.attachment = None;
    }

    async fn ensure_conversation(&mut self) -> Option<ConversationId> {
        if let Some(ref id) = self.conversation_id {
            return Some(id.clone());
        }
        match self.conversations.start_new(&self.owner, self.mode).await {
            Ok(conversation) => {
                self.conversation_id = Some(conversation.id.clone());
                Some(conversation.id)
            }
            Err(e) => {
                eprintln!(
                    "{}",
                    ConsoleFormatter::error(&format!("Could not start a conversation: {}", e))
                );
                None
            }
        }
    }

    async fn open(&mut self, id: ConversationId) {
        match self.conversations.load(&id).await {
            Ok(transcript) => {
                println!();
                print!("{}", ConsoleFormatter::format_transcript(&transcript));
                self.transcript = transcript;
                self.conversation_id = Some(id);
                self.attachment = None;
            }
            Err(e) => eprintln!("{}", ConsoleFormatter::error(&e.to_string())),
        }
    }

    async fn send_message(&mut self, text: &str) {
        let Some(conversation_id) = self.ensure_conversation().await else {
            return;
        };
        println!();

        let mut input = SendMessageInput::new(text, Some(conversation_id));
        if let Some(attachment) = self.attachment.take() {
            input = input.with_attachment(attachment);
        }

        let spinner = ProgressReporter::new();
        let progress: &dyn ChatProgressNotifier = if self.show_progress {
            &spinner
        } else {
            &NoChatProgress
        };

        let cancel = CancellationToken::new();
        let interrupt = cancel_on_ctrl_c(&cancel);
        let mut printer = StreamPrinter::stdout();

        let result = self
            .send
            .execute(input, &mut self.transcript, &mut printer, progress, &cancel)
            .await;
        interrupt.abort();
        printer.finish();

        match result {
            Ok(outcome) => {
                debug!("Reply finished with {} fragments", outcome.fragments);
                if !outcome.persisted && !outcome.text.is_empty() {
                    eprintln!(
                        "{}",
                        ConsoleFormatter::warning("The reply could not be saved")
                    );
                }
            }
            Err(e) if e.is_cancelled() => println!("{}", ConsoleFormatter::warning("Stopped")),
            Err(e) => eprintln!("{}", ConsoleFormatter::error(&e.to_string())),
        }
        println!();
    }

    async fn dictate(&mut self) {
        let Some(ref dictation) = self.dictation else {
            eprintln!(
                "{}",
                ConsoleFormatter::error(
                    "Speech input is not configured (set [speech] command in the config)"
                )
            );
            return;
        };

        println!("Listening... (Ctrl-C to stop)");
        let cancel = CancellationToken::new();
        let interrupt = cancel_on_ctrl_c(&cancel);
        let result = dictation.execute(&self.draft, &cancel).await;
        interrupt.abort();

        match result {
            Ok(draft) => self.draft = draft,
            Err(DictateError::Cancelled) => println!("^C"),
            Err(e) => eprintln!("{}", ConsoleFormatter::error(&e.to_string())),
        }
    }

    async fn generate(&self, prompt: &str) {
        let Some(ref images) = self.images else {
            eprintln!(
                "{}",
                ConsoleFormatter::error("Image generation is not available offline")
            );
            return;
        };

        let spinner = ProgressReporter::new().with_message("Generating image...");
        if self.show_progress {
            spinner.start();
        }
        let result = images.execute(prompt).await;
        spinner.clear();

        match result {
            Ok(image) => match store_generated(&image, &self.image_dir, &image_stem()) {
                Ok(ImageLocation::Saved(path)) => println!(
                    "{}",
                    ConsoleFormatter::success(&format!("Saved image to {}", path.display()))
                ),
                Ok(ImageLocation::Remote(url)) => println!("{}", url),
                Err(e) => eprintln!("{}", ConsoleFormatter::error(&e.to_string())),
            },
            Err(e) => eprintln!("{}", ConsoleFormatter::error(&e.to_string())),
        }
    }
}

/// Cancel `token` when Ctrl-C is pressed. Abort the handle once done.
pub fn cancel_on_ctrl_c(token: &CancellationToken) -> JoinHandle<()> {
    let token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => token.cancel(),
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    })
}

/// File name stem for a generated image, with millisecond resolution.
pub fn image_stem() -> String {
    format!(
        "xylos-image-{}",
        chrono::Local::now().format("%Y%m%d-%H%M%S-%3f")
    )
}

fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
