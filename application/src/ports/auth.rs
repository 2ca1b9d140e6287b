//! Authentication ports
//!
//! Identity lives in an external auth service ([`AuthGateway`]); the signed-in
//! session is cached locally through [`SessionStore`].

use async_trait::async_trait;
use thiserror::Error;
use xylos_domain::{AuthSession, AvatarImage, Credentials, SignUpRequest};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Sign-up needs email confirmation before signing in")]
    ConfirmationRequired,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Session storage error: {0}")]
    Storage(String),
}

/// External identity service.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthSession, AuthError>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AuthError>;

    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError>;

    /// Exchange the session's refresh token for a new session.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;

    /// Upload the user's profile picture, replacing any previous one, and
    /// point the profile at it. Returns the public URL.
    async fn set_avatar(
        &self,
        session: &AuthSession,
        avatar: &AvatarImage,
    ) -> Result<String, AuthError>;
}

/// Local cache of the current session.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<AuthSession>, AuthError>;
    fn save(&self, session: &AuthSession) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}
