//! Application layer for xylos
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ChatParams;
pub use ports::{
    auth::{AuthError, AuthGateway, SessionStore},
    completion_endpoint::{ByteStream, CompletionEndpoint, EndpointError, TransportError},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    conversation_store::{ConversationStore, StoreError},
    image_generator::{ImageError, ImageGenerator},
    progress::{ChatProgressNotifier, NoChatProgress},
    reply_persister::{NoPersistence, PersistError, ReplyPersister},
    speech::{SpeechError, SpeechListener, SpeechRecognizer},
    stream_subscriber::{NoSubscriber, StreamSubscriber},
};
pub use use_cases::authenticate::{AuthenticateError, AuthenticateUseCase};
pub use use_cases::consume_stream::{StreamConsumer, StreamError, StreamOutcome};
pub use use_cases::dictate::{DictateError, DictateUseCase};
pub use use_cases::generate_image::{GenerateImageError, GenerateImageUseCase};
pub use use_cases::manage_conversations::{ManageConversationsError, ManageConversationsUseCase};
pub use use_cases::send_message::{
    SendMessageError, SendMessageInput, SendMessageUseCase, StoreReplyPersister,
};
