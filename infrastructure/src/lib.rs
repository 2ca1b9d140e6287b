//! Infrastructure layer for xylos
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod backend;
pub mod config;
pub mod logging;
pub mod memory;
pub mod session;
pub mod speech;

// Re-export commonly used types
pub use backend::{
    BackendClient, BackendError, BackendSettings, HttpAuthGateway, HttpCompletionEndpoint,
    HttpImageGenerator, RestConversationStore,
};
pub use config::{
    ConfigLoader, FileBackendConfig, FileChatConfig, FileConfig, FileLoggingConfig,
    FileOutputConfig, FileSpeechConfig, expand_home,
};
pub use logging::JsonlConversationLogger;
pub use memory::InMemoryConversationStore;
pub use session::FileSessionStore;
pub use speech::CommandSpeechRecognizer;
