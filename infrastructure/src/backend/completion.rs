//! Streaming chat completion over the `ai-chat` edge function.

use super::client::BackendClient;
use super::error::{endpoint_send_error, rejection_message};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;
use xylos_application::{ByteStream, CompletionEndpoint, EndpointError, TransportError};
use xylos_domain::CompletionRequest;

const FUNCTION: &str = "ai-chat";
const FALLBACK_ERROR: &str = "Failed to get AI response";

/// [`CompletionEndpoint`] backed by the hosted chat function.
pub struct HttpCompletionEndpoint {
    client: BackendClient,
}

impl HttpCompletionEndpoint {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionEndpoint for HttpCompletionEndpoint {
    async fn open_stream(&self, request: &CompletionRequest) -> Result<ByteStream, EndpointError> {
        debug!("POST {} with {} messages", FUNCTION, request.len());

        let response = self
            .client
            .function(FUNCTION)
            .json(request)
            .send()
            .await
            .map_err(endpoint_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EndpointError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body, FALLBACK_ERROR),
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Read(e.to_string())))
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::client::BackendSettings;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use xylos_application::{NoPersistence, StreamConsumer};
    use xylos_domain::ChatMessage;

    fn endpoint(server: &MockServer) -> HttpCompletionEndpoint {
        let client = BackendClient::new(BackendSettings {
            url: server.uri(),
            api_key: "anon-key".into(),
            connect_timeout: None,
        })
        .unwrap();
        HttpCompletionEndpoint::new(client)
    }

    fn request() -> CompletionRequest {
        CompletionRequest::from_history(&[ChatMessage::user("Hi")], None)
    }

    #[tokio::test]
    async fn test_streams_event_body() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
            "data: [DONE]\n",
        );
        Mock::given(method("POST"))
            .and(path("/functions/v1/ai-chat"))
            .and(header("authorization", "Bearer anon-key"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "messages": [{"role": "user", "content": "Hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .expect(1)
            .mount(&server)
            .await;

        let stream = endpoint(&server).open_stream(&request()).await.unwrap();
        let mut seen = Vec::new();
        let mut subscriber = |text: &str| seen.push(text.to_string());
        let outcome = StreamConsumer::new()
            .consume(stream, &mut subscriber, &NoPersistence, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.text, "Hello");
        assert_eq!(seen, vec!["Hel", "Hello"]);
    }

    #[tokio::test]
    async fn test_rejection_uses_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/ai-chat"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({"error": "Rate limits exceeded"})),
            )
            .mount(&server)
            .await;

        let err = endpoint(&server).open_stream(&request()).await.err().unwrap();

        match err {
            EndpointError::Rejected { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limits exceeded");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejection_without_body_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/ai-chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = endpoint(&server).open_stream(&request()).await.err().unwrap();

        assert_eq!(err.to_string(), FALLBACK_ERROR);
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let client = BackendClient::new(BackendSettings {
            url: "http://127.0.0.1:9".into(),
            api_key: "k".into(),
            connect_timeout: None,
        })
        .unwrap();

        let err = HttpCompletionEndpoint::new(client)
            .open_stream(&request())
            .await
            .err()
            .unwrap();

        assert!(matches!(
            err,
            EndpointError::ConnectionError(_) | EndpointError::RequestFailed(_)
        ));
    }
}
