//! Error types for mail-provider access.

use thiserror::Error;

/// Errors that can occur when talking to the mail provider.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level HTTP failure (connection, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a non-success status.
    #[error("Mail API error: status {status}: {message}")]
    Api {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// Payload was not valid URL-safe Base64.
    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The provider response was missing an expected field.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Credentials are missing, expired, or rejected.
    ///
    /// Surfaced to the caller without retry; an external reauthorization
    /// flow is required before the pipeline can proceed.
    #[error("Authorization required")]
    AuthRequired,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
