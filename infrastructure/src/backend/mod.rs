//! Hosted backend adapters.
//!
//! The backend exposes edge functions (chat and image generation), PostgREST
//! tables (conversations and messages) and an auth service under one base
//! URL. Every adapter shares a [`BackendClient`].

pub mod auth;
pub mod client;
pub mod completion;
pub mod error;
pub mod images;
pub mod rest_store;

pub use auth::HttpAuthGateway;
pub use client::{BackendClient, BackendSettings};
pub use completion::HttpCompletionEndpoint;
pub use error::{BackendError, rejection_message};
pub use images::HttpImageGenerator;
pub use rest_store::RestConversationStore;
