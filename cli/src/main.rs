//! CLI entrypoint for xylos
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};
use xylos_application::{
    AuthenticateUseCase, ChatParams, ChatProgressNotifier, CompletionEndpoint, ConversationLogger,
    ConversationStore, DictateUseCase, GenerateImageUseCase, ManageConversationsUseCase,
    NoChatProgress, NoConversationLogger, SendMessageInput, SendMessageUseCase, StreamConsumer,
};
use xylos_domain::{ConversationId, ConversationMode, Transcript, UserId};
use xylos_infrastructure::{
    BackendClient, BackendSettings, CommandSpeechRecognizer, ConfigLoader, FileConfig,
    FileSessionStore, HttpAuthGateway, HttpCompletionEndpoint, HttpImageGenerator,
    InMemoryConversationStore, JsonlConversationLogger, RestConversationStore, expand_home,
};
use xylos_presentation::{
    ChatRepl, Cli, Command, ConsoleFormatter, ImageLocation, OutputConfig, ProgressReporter,
    ReplConfig, SimpleProgress, StreamPrinter, cancel_on_ctrl_c, image_stem, prompt_line,
    prompt_password, read_attachment, read_avatar, read_password_stdin, store_generated,
};

/// Owner of conversations kept in memory with `--offline`.
const LOCAL_USER: &str = "local";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let _log_guard = init_logging(cli.verbose, config.logging.directory_path().as_deref());
    info!("Starting xylos");

    let output = OutputConfig {
        format: cli
            .output
            .map(Into::into)
            .unwrap_or_else(|| config.output.format.unwrap_or_default()),
        color: config.output.color,
    };
    ConsoleFormatter::apply_color(&output);

    let (mode, _) = config.chat.parse_mode();
    let params = ChatParams::default()
        .with_mode(mode)
        .with_persist_partial_on_error(config.chat.persist_partial_on_error);
    let mut fatal = false;
    for issue in config.validate(cli.offline) {
        if issue.is_error() {
            error!("{}", issue.message);
            fatal = true;
        } else {
            warn!("{}", issue.message);
        }
    }

    let command = cli.command.clone().unwrap_or(Command::Chat {
        conversation: None,
        mode: None,
    });

    // Account commands talk to the auth service only.
    match command {
        Command::Signup {
            email,
            name,
            avatar,
            password_stdin,
        } => return signup(&config, email, name, avatar, password_stdin).await,
        Command::Login {
            email,
            password_stdin,
        } => return login(&config, email, password_stdin).await,
        Command::Logout => return logout(&config).await,
        _ => {}
    }

    if fatal {
        bail!("Invalid configuration (see the errors above, or use --offline)");
    }

    // === Dependency Injection ===
    let services = Services::connect(&config, cli.offline).await?;
    let logger = transcript_logger(&config);
    let show_progress = config.chat.show_progress && !cli.quiet;

    match command {
        Command::Chat {
            conversation,
            mode: mode_arg,
        } => {
            let params = match mode_arg {
                Some(m) => params.with_mode(m.parse::<ConversationMode>()?),
                None => params,
            };
            let repl_config = ReplConfig {
                show_progress,
                history_file: config.chat.history_file.as_deref().map(expand_home),
            };

            let mut repl = ChatRepl::new(
                services.send_message(&params, logger)?,
                ManageConversationsUseCase::new(services.store.clone()),
                services.owner.clone(),
            )
            .with_mode(params.mode)
            .with_progress(repl_config.show_progress)
            .with_offline(cli.offline)
            .with_history_file(repl_config.history_path())
            .with_conversation(conversation.map(ConversationId::new));

            if let Some(images) = services.image_generator() {
                repl = repl.with_image_generation(images, PathBuf::from("."));
            }
            if let Some(dictation) = dictation(&config) {
                repl = repl.with_dictation(dictation);
            }

            repl.run().await.context("Chat session failed")?;
        }
        Command::Ask {
            message,
            image,
            conversation,
        } => {
            let send = services.send_message(&params, logger)?;
            let conversations = ManageConversationsUseCase::new(services.store.clone());

            let (conversation_id, mut transcript) = match conversation {
                Some(id) => {
                    let id = ConversationId::new(id);
                    let transcript = conversations.load(&id).await?;
                    (id, transcript)
                }
                None => {
                    let created = conversations.start_new(&services.owner, params.mode).await?;
                    (created.id, Transcript::new())
                }
            };

            let mut input = SendMessageInput::new(message, Some(conversation_id.clone()));
            if let Some(path) = image {
                input = input.with_attachment(read_attachment(&path)?);
            }

            // Spinners only make sense on a terminal.
            let spinner = ProgressReporter::new();
            let progress: &dyn ChatProgressNotifier = if !show_progress {
                &NoChatProgress
            } else if std::io::stderr().is_terminal() {
                &spinner
            } else {
                &SimpleProgress
            };

            let cancel = tokio_util::sync::CancellationToken::new();
            let interrupt = cancel_on_ctrl_c(&cancel);
            let mut printer = StreamPrinter::stdout();
            let result = send
                .execute(input, &mut transcript, &mut printer, progress, &cancel)
                .await;
            interrupt.abort();
            printer.finish();

            let outcome = result?;
            debug!(
                "Reply complete: {} fragments, persisted={}",
                outcome.fragments, outcome.persisted
            );
            if !outcome.persisted && !outcome.text.is_empty() {
                eprintln!(
                    "{}",
                    ConsoleFormatter::warning("The reply could not be saved")
                );
            }
            if !cli.quiet {
                eprintln!("Conversation: {}", conversation_id);
            }
        }
        Command::Image { prompt, out_dir } => {
            let images = services
                .image_generator()
                .context("Image generation needs backend.url to be set")?;

            let spinner = ProgressReporter::new().with_message("Generating image...");
            if show_progress {
                spinner.start();
            }
            let result = images.execute(&prompt).await;
            spinner.clear();

            match store_generated(&result?, &out_dir, &image_stem())? {
                ImageLocation::Saved(path) => println!("{}", path.display()),
                ImageLocation::Remote(url) => println!("{}", url),
            }
        }
        Command::History => {
            let conversations = ManageConversationsUseCase::new(services.store.clone());
            let list = conversations.list_with_previews(&services.owner).await?;
            print!("{}", ConsoleFormatter::format_history(&list, output.format));
        }
        Command::Delete { id } => {
            let conversations = ManageConversationsUseCase::new(services.store.clone());
            conversations.delete(&ConversationId::new(id.clone())).await?;
            println!("{}", ConsoleFormatter::success(&format!("Deleted {}", id)));
        }
        // Handled above.
        Command::Signup { .. } | Command::Login { .. } | Command::Logout => {}
    }

    Ok(())
}

/// Initialize logging based on verbosity level. `RUST_LOG` wins when set.
///
/// With a log directory configured, records are also written to a daily
/// rolling file; the returned guard flushes it on drop.
fn init_logging(verbose: u8, directory: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "xylos.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

fn print_config_sources(config_path: Option<&PathBuf>) {
    println!("Configuration sources (lowest to highest priority):");
    for source in ConfigLoader::describe_sources(config_path) {
        println!("  {}", source);
    }
}

fn backend_client(config: &FileConfig) -> Result<BackendClient> {
    BackendClient::new(BackendSettings {
        url: config.backend.url.clone(),
        api_key: config.backend.api_key.clone(),
        connect_timeout: config.backend.connect_timeout(),
    })
    .context("Backend is not configured")
}

fn authenticator(config: &FileConfig) -> Result<AuthenticateUseCase> {
    let client = backend_client(config)?;
    let sessions = FileSessionStore::default_path()
        .map(FileSessionStore::new)
        .context("Could not determine a data directory for the session file")?;
    Ok(AuthenticateUseCase::new(
        Arc::new(HttpAuthGateway::new(client)),
        Arc::new(sessions),
    ))
}

fn transcript_logger(config: &FileConfig) -> Arc<dyn ConversationLogger> {
    match config
        .logging
        .transcript_path()
        .and_then(JsonlConversationLogger::open)
    {
        Some(logger) => {
            info!("Writing transcript to {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoConversationLogger),
    }
}

fn dictation(config: &FileConfig) -> Option<DictateUseCase> {
    let command = config.speech.command.as_ref()?;
    let recognizer = CommandSpeechRecognizer::new(command.clone(), config.speech.args.clone());
    Some(DictateUseCase::new(Arc::new(recognizer)))
}

/// Adapters shared by the data commands.
struct Services {
    store: Arc<dyn ConversationStore>,
    owner: UserId,
    client: Option<BackendClient>,
}

impl Services {
    async fn connect(config: &FileConfig, offline: bool) -> Result<Self> {
        if offline {
            let client = if config.backend.url.trim().is_empty() {
                None
            } else {
                Some(backend_client(config)?)
            };
            return Ok(Self {
                store: Arc::new(InMemoryConversationStore::new()),
                owner: UserId::new(LOCAL_USER),
                client,
            });
        }

        let session = authenticator(config)?
            .active_session()
            .await
            .context("Run `xylos login` (or `xylos signup`) first")?;
        let client = backend_client(config)?.with_access_token(Some(session.access_token.clone()));
        Ok(Self {
            store: Arc::new(RestConversationStore::new(client.clone())),
            owner: session.user_id().clone(),
            client: Some(client),
        })
    }

    fn send_message(
        &self,
        params: &ChatParams,
        logger: Arc<dyn ConversationLogger>,
    ) -> Result<SendMessageUseCase> {
        let client = self
            .client
            .clone()
            .context("Chatting needs backend.url to be set, even with --offline")?;
        let endpoint: Arc<dyn CompletionEndpoint> = Arc::new(HttpCompletionEndpoint::new(client));
        let consumer =
            StreamConsumer::new().with_persist_partial_on_error(params.persist_partial_on_error);
        Ok(SendMessageUseCase::new(endpoint, self.store.clone())
            .with_consumer(consumer)
            .with_conversation_logger(logger))
    }

    fn image_generator(&self) -> Option<GenerateImageUseCase> {
        let client = self.client.clone()?;
        Some(GenerateImageUseCase::new(Arc::new(HttpImageGenerator::new(
            client,
        ))))
    }
}

fn read_password(from_stdin: bool) -> Result<String> {
    if from_stdin {
        read_password_stdin().context("Failed to read password from stdin")
    } else {
        prompt_password("Password: ").context("Failed to read password")
    }
}

fn value_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => prompt_line(prompt).with_context(|| format!("Failed to read {}", prompt.trim())),
    }
}

async fn signup(
    config: &FileConfig,
    email: Option<String>,
    name: Option<String>,
    avatar: Option<PathBuf>,
    password_stdin: bool,
) -> Result<()> {
    let auth = authenticator(config)?;
    let avatar = avatar.as_deref().map(read_avatar).transpose()?;
    let email = value_or_prompt(email, "Email: ")?;
    let name = value_or_prompt(name, "Full name: ")?;
    let password = read_password(password_stdin)?;

    let session = auth
        .sign_up(&email, &password, &name, avatar.as_ref())
        .await?;
    println!(
        "{}",
        ConsoleFormatter::success(&format!(
            "Signed up as {}",
            session.user.email.as_deref().unwrap_or(&email)
        ))
    );
    Ok(())
}

async fn login(config: &FileConfig, email: Option<String>, password_stdin: bool) -> Result<()> {
    let auth = authenticator(config)?;
    let email = value_or_prompt(email, "Email: ")?;
    let password = read_password(password_stdin)?;

    let session = auth.sign_in(&email, &password).await?;
    println!(
        "{}",
        ConsoleFormatter::success(&format!(
            "Signed in as {}",
            session.user.email.as_deref().unwrap_or(&email)
        ))
    );
    Ok(())
}

async fn logout(config: &FileConfig) -> Result<()> {
    if authenticator(config)?.sign_out().await? {
        println!("{}", ConsoleFormatter::success("Signed out"));
    } else {
        println!("Not signed in");
    }
    Ok(())
}
