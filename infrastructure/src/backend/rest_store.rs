//! Conversation storage over the backend's PostgREST tables.
//!
//! Tables: `conversations (id, user_id, mode, created_at, updated_at)` and
//! `messages (conversation_id, role, content, created_at)`. Row-level
//! security scopes every query to the signed-in user.

use super::client::BackendClient;
use super::error::{rejection_message, store_send_error};
use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use xylos_application::{ConversationStore, StoreError};
use xylos_domain::{Conversation, ConversationId, ConversationMode, Role, StoredMessage, UserId};

const CONVERSATIONS: &str = "conversations";
const MESSAGES: &str = "messages";

pub struct RestConversationStore {
    client: BackendClient,
}

impl RestConversationStore {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    async fn rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, StoreError> {
        let response = Self::check(response).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::UnexpectedResponse(e.to_string()))
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(StoreError::Unauthorized);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::RequestFailed(format!(
            "{} ({})",
            rejection_message(&body, "storage request failed"),
            status.as_u16()
        )))
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl ConversationStore for RestConversationStore {
    async fn create(
        &self,
        owner: &UserId,
        mode: ConversationMode,
    ) -> Result<Conversation, StoreError> {
        let response = self
            .client
            .rest(Method::POST, CONVERSATIONS)
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "user_id": owner, "mode": mode }))
            .send()
            .await
            .map_err(store_send_error)?;

        Self::rows::<Conversation>(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::UnexpectedResponse("insert returned no row".to_string()))
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Conversation>, StoreError> {
        let response = self
            .client
            .rest(Method::GET, CONVERSATIONS)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", eq(owner.as_str())),
                ("order", "updated_at.desc".to_string()),
            ])
            .send()
            .await
            .map_err(store_send_error)?;

        let list = Self::rows(response).await?;
        debug!("Listed {} conversations", list.len());
        Ok(list)
    }

    async fn messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let response = self
            .client
            .rest(Method::GET, MESSAGES)
            .query(&[
                ("select", "*".to_string()),
                ("conversation_id", eq(conversation_id.as_str())),
                ("order", "created_at.asc".to_string()),
            ])
            .send()
            .await
            .map_err(store_send_error)?;

        Self::rows(response).await
    }

    async fn first_user_message(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<StoredMessage>, StoreError> {
        let response = self
            .client
            .rest(Method::GET, MESSAGES)
            .query(&[
                ("select", "*".to_string()),
                ("conversation_id", eq(conversation_id.as_str())),
                ("role", eq(Role::User.as_str())),
                ("order", "created_at.asc".to_string()),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .map_err(store_send_error)?;

        Ok(Self::rows(response).await?.into_iter().next())
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .rest(Method::POST, MESSAGES)
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({
                "conversation_id": conversation_id,
                "role": role,
                "content": content,
            }))
            .send()
            .await
            .map_err(store_send_error)?;

        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, conversation_id: &ConversationId) -> Result<(), StoreError> {
        let response = self
            .client
            .rest(Method::DELETE, CONVERSATIONS)
            .query(&[("id", eq(conversation_id.as_str()))])
            .send()
            .await
            .map_err(store_send_error)?;

        Self::check(response).await?;
        Ok(())
    }
}
