//! Email/password authentication against the backend's auth service,
//! token refresh and the profile picture uploaded at sign-up.

use super::client::BackendClient;
use super::error::{auth_send_error, rejection_message};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Response};
use serde::Deserialize;
use tracing::debug;
use xylos_application::{AuthError, AuthGateway};
use xylos_domain::{AuthSession, AuthUser, AvatarImage, Credentials, SignUpRequest};

const FALLBACK_ERROR: &str = "Authentication failed";

/// Public storage bucket holding profile pictures.
const AVATAR_BUCKET: &str = "avatars";

/// Token response; `access_token` is absent when sign-up still awaits
/// email confirmation.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: Option<AuthUser>,
}

impl TokenResponse {
    fn into_session(self) -> Result<AuthSession, AuthError> {
        let expires_at = self.expires_at.or_else(|| {
            self.expires_in
                .map(|secs| chrono::Utc::now().timestamp() + secs)
        });
        match (self.access_token, self.user) {
            (Some(access_token), Some(user)) => Ok(AuthSession {
                access_token,
                refresh_token: self.refresh_token,
                expires_at,
                user,
            }),
            _ => Err(AuthError::ConfirmationRequired),
        }
    }
}

pub struct HttpAuthGateway {
    client: BackendClient,
}

impl HttpAuthGateway {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    async fn token_response(response: Response) -> Result<TokenResponse, AuthError> {
        let status = response.status();
        let body = response.text().await.map_err(auth_send_error)?;
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body, FALLBACK_ERROR),
            });
        }
        serde_json::from_str(&body).map_err(|e| AuthError::Rejected {
            status: status.as_u16(),
            message: format!("Unexpected auth response: {}", e),
        })
    }

    async fn expect_success(response: Response, fallback: &str) -> Result<(), AuthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(AuthError::Rejected {
            status: status.as_u16(),
            message: rejection_message(&body, fallback),
        })
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthSession, AuthError> {
        debug!("Signing up {}", request.credentials.email);
        let response = self
            .client
            .auth("signup")
            .json(&serde_json::json!({
                "email": request.credentials.email,
                "password": request.credentials.password,
                "data": { "full_name": request.full_name },
            }))
            .send()
            .await
            .map_err(auth_send_error)?;

        Self::token_response(response).await?.into_session()
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        debug!("Signing in {}", credentials.email);
        let response = self
            .client
            .auth("token")
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({
                "email": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await
            .map_err(auth_send_error)?;

        Self::token_response(response).await?.into_session()
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError> {
        let response = self
            .client
            .auth("logout")
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(auth_send_error)?;

        Self::expect_success(response, FALLBACK_ERROR).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .auth("token")
            .query(&[("grant_type", "refresh_token")])
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(auth_send_error)?;

        Self::token_response(response).await?.into_session()
    }

    async fn set_avatar(
        &self,
        session: &AuthSession,
        avatar: &AvatarImage,
    ) -> Result<String, AuthError> {
        let client = self
            .client
            .clone()
            .with_access_token(Some(session.access_token.clone()));
        let name = avatar.object_name(session.user_id());
        debug!("Uploading avatar {} ({} bytes)", name, avatar.bytes().len());

        let response = client
            .storage_upload(AVATAR_BUCKET, &name)
            .header("x-upsert", "true")
            .header(CONTENT_TYPE, avatar.mime().as_str())
            .body(avatar.bytes().to_vec())
            .send()
            .await
            .map_err(auth_send_error)?;
        Self::expect_success(response, "Avatar upload failed").await?;

        let url = client.public_object_url(AVATAR_BUCKET, &name);
        let response = client
            .rest(Method::PATCH, "profiles")
            .query(&[("id", format!("eq.{}", session.user_id()))])
            .json(&serde_json::json!({ "avatar_url": url }))
            .send()
            .await
            .map_err(auth_send_error)?;
        Self::expect_success(response, "Profile update failed").await?;

        Ok(url)
    }
}
