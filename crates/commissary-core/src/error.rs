//! Error types for the core pipeline.

use thiserror::Error;

/// Errors that can occur in pipeline operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Mail provider operation failed.
    #[error("Mail error: {0}")]
    Mail(#[from] commissary_mail::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Message body does not match the intake format.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Date field could not be parsed as month/day/year.
    #[error("Malformed date: {0}")]
    MalformedDate(String),

    /// No attachment reference anywhere in the MIME part tree.
    #[error("No attachment found in message")]
    NoAttachmentFound,

    /// No writable cache directory could be resolved. Fatal.
    #[error("No writable cache directory available")]
    DirectoryUnavailable,

    /// Attachment download exceeded the per-attempt timeout.
    #[error("Attachment download timed out")]
    DownloadTimeout,

    /// Decoded attachment was too small to be a genuine image.
    #[error("Attachment too small: {size} bytes")]
    DownloadTooSmall {
        /// Decoded payload size in bytes.
        size: usize,
    },

    /// Cached image file could not be written.
    #[error("Cache write failed: {0}")]
    CacheWrite(String),

    /// No record with the given id exists in the store.
    #[error("Record not found: {0}")]
    RecordNotFound(String),
}

impl Error {
    /// True when the error means the operator must reauthorize with the
    /// mail provider before any further mail operations can succeed.
    #[must_use]
    pub const fn is_auth_required(&self) -> bool {
        matches!(self, Self::Mail(commissary_mail::Error::AuthRequired))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
