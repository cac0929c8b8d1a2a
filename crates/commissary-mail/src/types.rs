//! Message and attachment types for the mail provider.

use serde::{Deserialize, Serialize};

/// A lightweight reference to one message, as returned by a list query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSummary {
    /// Provider-assigned message id.
    pub id: String,
    /// Thread the message belongs to, if the provider reports one.
    #[serde(rename = "threadId", default)]
    pub thread_id: Option<String>,
}

/// Body data attached to a MIME part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    /// Opaque reference to a separately-fetchable attachment blob.
    #[serde(default)]
    pub attachment_id: Option<String>,
    /// Size in bytes, if known.
    #[serde(default)]
    pub size: u64,
    /// Inline URL-safe Base64 data, if the body is carried inline.
    #[serde(default)]
    pub data: Option<String>,
}

/// One node in a message's MIME part tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    /// Part identifier within the message.
    #[serde(default)]
    pub part_id: String,
    /// MIME type of this part.
    #[serde(default)]
    pub mime_type: String,
    /// Filename, for attachment parts.
    #[serde(default)]
    pub filename: String,
    /// Body of this part.
    #[serde(default)]
    pub body: Option<PartBody>,
    /// Child parts, for multipart containers.
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

/// A fully-fetched message: id plus its MIME part tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullMessage {
    /// Provider-assigned message id.
    pub id: String,
    /// Short preview text, if the provider supplies one.
    #[serde(default)]
    pub snippet: Option<String>,
    /// Root of the MIME part tree.
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

impl FullMessage {
    /// Returns the raw (still Base64-encoded) text body of the message.
    ///
    /// Prefers inline data on the root payload; otherwise walks the part
    /// tree depth-first for the first `text/plain` part carrying data.
    #[must_use]
    pub fn raw_body(&self) -> Option<&str> {
        let payload = self.payload.as_ref()?;

        if let Some(data) = payload.body.as_ref().and_then(|b| b.data.as_deref()) {
            return Some(data);
        }

        first_text_part(payload)
    }
}

fn first_text_part(part: &MessagePart) -> Option<&str> {
    if part.mime_type == "text/plain"
        && let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref())
    {
        return Some(data);
    }

    part.parts.iter().find_map(first_text_part)
}

/// Identifies one binary blob inside the mail provider.
///
/// Both components are also persisted on the intake record; the locator
/// itself is ephemeral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentLocator {
    /// Message the attachment belongs to.
    pub message_id: String,
    /// Provider-assigned attachment id.
    pub attachment_id: String,
}

/// Query for selecting messages to ingest.
#[derive(Debug, Clone)]
pub struct MessageQuery {
    /// Subject substring the intake emails carry.
    pub subject: String,
    /// Restrict to unread messages.
    pub unread_only: bool,
}

impl MessageQuery {
    /// Creates a query for unread messages matching a subject substring.
    #[must_use]
    pub fn unread_with_subject(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            unread_only: true,
        }
    }

    /// Returns a copy of this query with the unread restriction changed.
    #[must_use]
    pub fn with_unread_only(mut self, unread_only: bool) -> Self {
        self.unread_only = unread_only;
        self
    }

    /// Renders the query in the provider's search syntax.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        if self.unread_only {
            format!("subject:{} is:unread", self.subject)
        } else {
            format!("subject:{}", self.subject)
        }
    }
}
