//! Conversation history domain.

pub mod entities;
pub mod mode;
