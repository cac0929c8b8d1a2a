//! Credential handling for the mail provider.
//!
//! The pipeline treats credentials as opaque: it asks a
//! [`CredentialProvider`] for a bearer token and surfaces
//! [`Error::AuthRequired`] upward when none can be supplied. Token
//! acquisition and refresh live outside this crate.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A bearer access token with optional expiry metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// The token string sent in the `Authorization` header.
    pub token: String,
    /// Expiration time, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a token with no expiry metadata.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Sets the expiration time.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Checks if the token is expired (with a 60 second buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|exp| Utc::now() + Duration::seconds(60) >= exp)
    }
}

/// Supplies an authenticated handle to the mail provider.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns a valid bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthRequired`] when no valid token is available;
    /// the caller must trigger an external reauthorization flow.
    async fn access_token(&self) -> Result<String>;
}

/// A credential provider backed by a single pre-issued token.
///
/// Suitable for locally-run deployments where the operator supplies a
/// token out of band (environment variable or config file).
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    token: AccessToken,
}

impl StaticCredentials {
    /// Creates a provider around a pre-issued token.
    #[must_use]
    pub const fn new(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn access_token(&self) -> Result<String> {
        if self.token.is_expired() {
            return Err(Error::AuthRequired);
        }
        Ok(self.token.token.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_without_expiry_is_not_expired() {
        let token = AccessToken::new("abc123");
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_expiry_buffer() {
        // Expires in 30 seconds: inside the 60 second buffer.
        let token = AccessToken::new("abc123").with_expires_at(Utc::now() + Duration::seconds(30));
        assert!(token.is_expired());

        let token = AccessToken::new("abc123").with_expires_at(Utc::now() + Duration::seconds(120));
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn test_static_credentials_return_token() {
        let creds = StaticCredentials::new(AccessToken::new("abc123"));
        assert_eq!(creds.access_token().await.unwrap(), "abc123");
    }

    #[tokio::test]
    async fn test_static_credentials_expired_signals_auth_required() {
        let token = AccessToken::new("abc123").with_expires_at(Utc::now() - Duration::seconds(10));
        let creds = StaticCredentials::new(token);
        assert!(matches!(
            creds.access_token().await,
            Err(Error::AuthRequired)
        ));
    }
}
