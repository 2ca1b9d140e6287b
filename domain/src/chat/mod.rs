//! Chat domain.
//!
//! - [`entities::ChatMessage`]: a single message (plain or multimodal)
//! - [`entities::Transcript`]: the visible message list of a session
//! - [`request::CompletionRequest`]: what is sent to the completion endpoint

pub mod entities;
pub mod request;
