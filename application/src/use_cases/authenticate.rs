//! Authenticate use case.
//!
//! Sign up, sign in and sign out against the auth service, keeping the
//! current session in the local [`SessionStore`].

use crate::ports::auth::{AuthError, AuthGateway, SessionStore};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use xylos_domain::{AuthSession, AvatarImage, Credentials, DomainError, SignUpRequest};

#[derive(Error, Debug)]
pub enum AuthenticateError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub struct AuthenticateUseCase {
    gateway: Arc<dyn AuthGateway>,
    sessions: Arc<dyn SessionStore>,
}

impl AuthenticateUseCase {
    pub fn new(gateway: Arc<dyn AuthGateway>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { gateway, sessions }
    }

    /// Create the account. A failed avatar upload does not fail sign-up.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        avatar: Option<&AvatarImage>,
    ) -> Result<AuthSession, AuthenticateError> {
        let request = SignUpRequest::new(Credentials::new(email, password)?, full_name);
        let session = self.gateway.sign_up(&request).await?;
        self.sessions.save(&session)?;
        info!("Signed up as {}", session.user_id());

        if let Some(avatar) = avatar {
            match self.gateway.set_avatar(&session, avatar).await {
                Ok(url) => info!("Avatar uploaded to {}", url),
                Err(e) => warn!("Avatar upload failed: {}", e),
            }
        }
        Ok(session)
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthenticateError> {
        let credentials = Credentials::new(email, password)?;
        let session = self.gateway.sign_in(&credentials).await?;
        self.sessions.save(&session)?;
        info!("Signed in as {}", session.user_id());
        Ok(session)
    }

    /// Sign out. Returns `false` when no session was stored.
    ///
    /// The local session is removed even when the remote sign-out fails.
    pub async fn sign_out(&self) -> Result<bool, AuthenticateError> {
        let Some(session) = self.sessions.load()? else {
            return Ok(false);
        };
        if let Err(e) = self.gateway.sign_out(&session).await {
            warn!("Remote sign-out failed: {}", e);
        }
        self.sessions.clear()?;
        info!("Signed out");
        Ok(true)
    }

    pub fn current(&self) -> Result<Option<AuthSession>, AuthenticateError> {
        Ok(self.sessions.load()?)
    }

    /// The current session, or [`AuthError::NotSignedIn`].
    pub fn require(&self) -> Result<AuthSession, AuthenticateError> {
        self.current()?
            .ok_or(AuthenticateError::Auth(AuthError::NotSignedIn))
    }

    /// The current session, refreshed and stored again when its access
    /// token is about to expire.
    pub async fn active_session(&self) -> Result<AuthSession, AuthenticateError> {
        let session = self.require()?;
        if !session.needs_refresh() {
            return Ok(session);
        }
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            return Ok(session);
        };

        debug!("Refreshing access token for {}", session.user_id());
        let refreshed = self.gateway.refresh(refresh_token).await?;
        self.sessions.save(&refreshed)?;
        Ok(refreshed)
    }
}
