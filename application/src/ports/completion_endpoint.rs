//! Completion endpoint port
//!
//! Defines the interface for opening a streamed chat completion.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;
use xylos_domain::CompletionRequest;

/// Failure while reading an already-open response body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Stream read error: {0}")]
    Read(String),

    #[error("Connection reset: {0}")]
    ConnectionReset(String),
}

/// Failure before any streaming begins.
#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Non-2xx status; `message` is the body's `error` field when present.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,
}

/// Raw response body, chunked in arrival order.
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Endpoint that turns a message history into a streamed assistant reply.
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait CompletionEndpoint: Send + Sync {
    /// Send the request and return the response body as a byte stream.
    ///
    /// Errors returned here happen before any partial reply exists.
    async fn open_stream(&self, request: &CompletionRequest) -> Result<ByteStream, EndpointError>;
}
