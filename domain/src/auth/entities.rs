//! Authentication value objects.
//!
//! Identity is owned by the external auth service; these types only carry
//! what the client sends and what it keeps after signing in.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::conversation::entities::UserId;
use crate::core::error::DomainError;

/// Email/password pair used to sign in.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self, DomainError> {
        let email = email.into().trim().to_string();
        let password = password.into();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::InvalidEmail(email));
        }
        if password.is_empty() {
            return Err(DomainError::EmptyPassword);
        }
        Ok(Self { email, password })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sign-up form: credentials plus the profile name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    pub credentials: Credentials,
    pub full_name: String,
}

impl SignUpRequest {
    pub fn new(credentials: Credentials, full_name: impl Into<String>) -> Self {
        Self {
            credentials,
            full_name: full_name.into().trim().to_string(),
        }
    }
}

/// The authenticated user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Access tokens this close to expiry are refreshed before use.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// A signed-in session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix time (seconds) at which `access_token` stops being accepted.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    /// Whether the access token should be refreshed at unix time `now`.
    ///
    /// Sessions without an expiry, or without a refresh token, never are.
    pub fn needs_refresh_at(&self, now: i64) -> bool {
        self.refresh_token.is_some()
            && self
                .expires_at
                .is_some_and(|at| at - REFRESH_MARGIN_SECS <= now)
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(chrono::Utc::now().timestamp())
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}
