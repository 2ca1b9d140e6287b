//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod auth;
pub mod completion_endpoint;
pub mod conversation_logger;
pub mod conversation_store;
pub mod image_generator;
pub mod progress;
pub mod reply_persister;
pub mod speech;
pub mod stream_subscriber;
