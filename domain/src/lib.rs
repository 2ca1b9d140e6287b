//! Domain layer for xylos
//!
//! This crate contains the core entities, value objects and the pure parts
//! of the streaming chat protocol. It has no dependencies on infrastructure
//! or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Streamed replies
//!
//! The completion endpoint answers with `data: <json>` lines ending in
//! `data: [DONE]`. [`StreamDecoder`] turns raw chunks into [`DeltaEvent`]s
//! (tolerating split UTF-8 sequences, split lines and malformed frames) and
//! [`AccumulatedMessage`] holds the growing assistant text.
//!
//! ## Conversations
//!
//! A [`Conversation`] owns an ordered list of [`StoredMessage`]s. The live
//! view of a chat is a [`Transcript`] of [`ChatMessage`]s.

pub mod auth;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod core;
pub mod media;
pub mod speech;
pub mod stream;

// Re-export commonly used types
pub use auth::entities::{AuthSession, AuthUser, Credentials, SignUpRequest};
pub use chat::{
    entities::{ChatMessage, ContentPart, ImageUrl, MessageContent, Role, Transcript},
    request::CompletionRequest,
};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use conversation::{
    entities::{
        Conversation, ConversationId, ConversationSummary, EMPTY_PREVIEW, StoredMessage, UserId,
        transcript_from_stored,
    },
    mode::ConversationMode,
};
pub use core::error::DomainError;
pub use media::image::{
    AvatarImage, GeneratedImage, ImageAttachment, ImageMime, ImagePrompt,
};
pub use speech::append_transcript;
pub use stream::{
    accumulator::AccumulatedMessage,
    decoder::{LineBuffer, StreamDecoder, Utf8ChunkDecoder},
    frame::{ChunkFrame, DATA_PREFIX, DONE_SENTINEL, DeltaEvent, LineKind},
    phase::StreamPhase,
};
