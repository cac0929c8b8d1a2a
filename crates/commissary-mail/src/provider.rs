//! The abstract mail-provider contract consumed by the pipeline.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{FullMessage, MessageQuery, MessageSummary};

/// Operations the intake pipeline needs from a mailbox.
///
/// Implemented by [`crate::RestMailClient`] for real deployments and by
/// in-memory fakes in tests. All methods take `&self`; implementations
/// are expected to be internally synchronized and cheap to share behind
/// an `Arc`.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Lists messages matching the query (subject substring, optionally
    /// restricted to unread).
    async fn list_unread(&self, query: &MessageQuery) -> Result<Vec<MessageSummary>>;

    /// Fetches one message with its full MIME part tree.
    async fn get_full_message(&self, id: &str) -> Result<FullMessage>;

    /// Fetches one attachment blob.
    ///
    /// The returned string is URL-safe Base64 as delivered by the
    /// provider; callers decode it with
    /// [`crate::encoding::decode_base64url`].
    async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<String>;

    /// Removes the unread classification from a message.
    async fn mark_read(&self, message_id: &str) -> Result<()>;
}
