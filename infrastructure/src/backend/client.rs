//! Shared HTTP client for the hosted backend.
//!
//! One [`BackendClient`] is cloned into every adapter; it owns the base URL,
//! the publishable API key and (after sign-in) the user's access token.

use super::error::BackendError;
use reqwest::{Client, Method, RequestBuilder};
use std::time::Duration;

/// Connection settings for [`BackendClient`].
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub url: String,
    pub api_key: String,
    pub connect_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl BackendClient {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let base_url = settings.url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(BackendError::MissingUrl);
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(BackendError::InvalidUrl {
                url: base_url,
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }

        let mut builder = Client::builder().user_agent(concat!("xylos/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            api_key: settings.api_key,
            access_token: None,
        })
    }

    /// Use the signed-in user's token for storage and sign-out requests.
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Request to an edge function, authorized with the API key.
    pub(crate) fn function(&self, name: &str) -> RequestBuilder {
        self.http
            .post(format!("{}/functions/v1/{}", self.base_url, name))
            .bearer_auth(&self.api_key)
    }

    /// Request to a storage table, authorized as the signed-in user.
    pub(crate) fn rest(&self, method: Method, table: &str) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.http
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }

    /// Request to the auth service.
    pub(crate) fn auth(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}/auth/v1/{}", self.base_url, path))
            .header("apikey", &self.api_key)
    }

    /// Upload to object storage, authorized as the signed-in user.
    pub(crate) fn storage_upload(&self, bucket: &str, name: &str) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.http
            .post(format!(
                "{}/storage/v1/object/{}/{}",
                self.base_url, bucket, name
            ))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }

    /// Public URL of an object in a public bucket.
    pub fn public_object_url(&self, bucket: &str, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> BackendSettings {
        BackendSettings {
            url: url.to_string(),
            api_key: "key".to_string(),
            connect_timeout: Some(Duration::from_secs(1)),
        }
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = BackendClient::new(settings("https://project.example/")).unwrap();
        assert_eq!(client.base_url(), "https://project.example");
    }

    #[test]
    fn test_missing_url() {
        assert!(matches!(
            BackendClient::new(settings("  ")),
            Err(BackendError::MissingUrl)
        ));
    }

    #[test]
    fn test_invalid_scheme() {
        assert!(matches!(
            BackendClient::new(settings("ftp://project.example")),
            Err(BackendError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_access_token() {
        let client = BackendClient::new(settings("http://localhost:54321"))
            .unwrap()
            .with_access_token(Some("jwt".into()));
        assert!(client.has_access_token());
    }

    #[test]
    fn test_public_object_url() {
        let client = BackendClient::new(settings("https://project.example/")).unwrap();
        assert_eq!(
            client.public_object_url("avatars", "u1.png"),
            "https://project.example/storage/v1/object/public/avatars/u1.png"
        );
    }
}
