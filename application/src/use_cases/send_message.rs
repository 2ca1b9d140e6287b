//! Send Message use case.
//!
//! One chat exchange: record the user message, request a completion for the
//! whole transcript and stream the assistant reply back into it.
//!
//! The user message is pushed to the transcript before anything can fail
//! and stays there when the exchange fails.

use crate::ports::completion_endpoint::{CompletionEndpoint, EndpointError};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::conversation_store::ConversationStore;
use crate::ports::progress::ChatProgressNotifier;
use crate::ports::reply_persister::{PersistError, ReplyPersister};
use crate::ports::stream_subscriber::StreamSubscriber;
use crate::use_cases::consume_stream::{StreamConsumer, StreamError, StreamOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use xylos_domain::{
    CompletionRequest, ConversationId, DomainError, ImageAttachment, Role, Transcript,
};

/// Errors that can occur while sending a message.
#[derive(Error, Debug)]
pub enum SendMessageError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl SendMessageError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            SendMessageError::Domain(e) => e.is_cancelled(),
            SendMessageError::Stream(e) => e.is_cancelled(),
            SendMessageError::Endpoint(_) => false,
        }
    }
}

/// Input for the [`SendMessageUseCase`].
#[derive(Debug, Clone)]
pub struct SendMessageInput {
    pub text: String,
    pub conversation_id: Option<ConversationId>,
    pub attachment: Option<ImageAttachment>,
}

impl SendMessageInput {
    pub fn new(text: impl Into<String>, conversation_id: Option<ConversationId>) -> Self {
        Self {
            text: text.into(),
            conversation_id,
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: ImageAttachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Writes the final reply into the conversation store.
pub struct StoreReplyPersister {
    store: Arc<dyn ConversationStore>,
    conversation_id: ConversationId,
}

impl StoreReplyPersister {
    pub fn new(store: Arc<dyn ConversationStore>, conversation_id: ConversationId) -> Self {
        Self {
            store,
            conversation_id,
        }
    }
}

#[async_trait]
impl ReplyPersister for StoreReplyPersister {
    async fn persist(&self, text: &str) -> Result<(), PersistError> {
        self.store
            .append_message(&self.conversation_id, Role::Assistant, text)
            .await
            .map_err(|e| PersistError(e.to_string()))
    }
}

/// Mirrors every snapshot into the transcript before forwarding it.
struct TranscriptSubscriber<'a> {
    transcript: &'a mut Transcript,
    inner: &'a mut dyn StreamSubscriber,
    progress: &'a dyn ChatProgressNotifier,
    started: bool,
}

impl StreamSubscriber for TranscriptSubscriber<'_> {
    fn on_text(&mut self, text: &str) {
        if !self.started {
            self.started = true;
            self.progress.on_first_fragment();
        }
        self.transcript.upsert_assistant(text);
        self.inner.on_text(text);
    }
}

/// Use case for sending one user message.
pub struct SendMessageUseCase {
    endpoint: Arc<dyn CompletionEndpoint>,
    store: Arc<dyn ConversationStore>,
    consumer: StreamConsumer,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl SendMessageUseCase {
    pub fn new(endpoint: Arc<dyn CompletionEndpoint>, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            endpoint,
            store,
            consumer: StreamConsumer::new(),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_consumer(mut self, consumer: StreamConsumer) -> Self {
        self.consumer = consumer;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Send `input`, streaming the reply into `transcript` and `subscriber`.
    pub async fn execute(
        &self,
        input: SendMessageInput,
        transcript: &mut Transcript,
        subscriber: &mut dyn StreamSubscriber,
        progress: &dyn ChatProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, SendMessageError> {
        // Whitespace only decides emptiness; the message is sent as typed.
        if input.text.trim().is_empty() {
            return Err(DomainError::EmptyInput.into());
        }
        let text = input.text.as_str();
        let Some(conversation_id) = input.conversation_id else {
            return Err(DomainError::NoConversation.into());
        };

        info!(
            "Sending message to conversation {} ({} prior messages)",
            conversation_id,
            transcript.len()
        );

        transcript.push_user(text);
        self.conversation_logger.log(ConversationEvent::new(
            "user_message",
            serde_json::json!({
                "conversation_id": conversation_id.as_str(),
                "content": text,
                "has_image": input.attachment.is_some(),
            }),
        ));

        if let Err(e) = self
            .store
            .append_message(&conversation_id, Role::User, text)
            .await
        {
            warn!("Failed to store user message: {}", e);
        }

        let request = CompletionRequest::from_history(transcript.messages(), input.attachment.as_ref());
        progress.on_request_sent();

        let stream = match self.endpoint.open_stream(&request).await {
            Ok(stream) => stream,
            Err(e) => {
                progress.on_reply_finished(false);
                self.log_failure(&conversation_id, &e.to_string(), "");
                return Err(e.into());
            }
        };

        let persister = StoreReplyPersister::new(self.store.clone(), conversation_id.clone());
        let mut mirror = TranscriptSubscriber {
            transcript,
            inner: subscriber,
            progress,
            started: false,
        };

        let result = self
            .consumer
            .consume(stream, &mut mirror, &persister, cancel)
            .await;
        progress.on_reply_finished(result.is_ok());

        match result {
            Ok(outcome) => {
                self.conversation_logger.log(ConversationEvent::new(
                    "assistant_reply",
                    serde_json::json!({
                        "conversation_id": conversation_id.as_str(),
                        "content": outcome.text,
                        "fragments": outcome.fragments,
                        "persisted": outcome.persisted,
                    }),
                ));
                Ok(outcome)
            }
            Err(e) => {
                self.log_failure(&conversation_id, &e.to_string(), e.partial());
                Err(e.into())
            }
        }
    }

    fn log_failure(&self, conversation_id: &ConversationId, error: &str, partial: &str) {
        self.conversation_logger.log(ConversationEvent::new(
            "reply_failed",
            serde_json::json!({
                "conversation_id": conversation_id.as_str(),
                "error": error,
                "partial": partial,
            }),
        ));
    }
}
