//! REST client for Gmail-style mail APIs.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::auth::CredentialProvider;
use crate::error::{Error, Result};
use crate::provider::MailProvider;
use crate::types::{FullMessage, MessageQuery, MessageSummary};

/// Mail provider implementation over a Gmail-style REST API.
///
/// Endpoints used, relative to the base URL:
/// - `GET  messages?q=<query>` — list message references
/// - `GET  messages/{id}?format=full` — message with MIME part tree
/// - `GET  messages/{id}/attachments/{attachment_id}` — attachment blob
/// - `POST messages/{id}/modify` — label changes (mark read)
pub struct RestMailClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

/// Response shape of the message list endpoint.
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageSummary>,
}

/// Response shape of the attachment endpoint.
#[derive(Debug, Deserialize)]
struct AttachmentResponse {
    #[serde(default)]
    data: Option<String>,
}

impl RestMailClient {
    /// Creates a client for the given API base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            credentials,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let token = self.credentials.access_token().await?;
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "mail API GET");

        let response = self
            .http
            .get(&url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?;
        Self::check_status(&response)?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<()> {
        let token = self.credentials.access_token().await?;
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "mail API POST");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::check_status(&response)?;
        Ok(())
    }

    fn check_status(response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::AuthRequired);
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MailProvider for RestMailClient {
    async fn list_unread(&self, query: &MessageQuery) -> Result<Vec<MessageSummary>> {
        let list: ListResponse = self
            .get_json("messages", &[("q", &query.to_query_string())])
            .await?;
        Ok(list.messages)
    }

    async fn get_full_message(&self, id: &str) -> Result<FullMessage> {
        self.get_json(&format!("messages/{id}"), &[("format", "full")])
            .await
    }

    async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<String> {
        let attachment: AttachmentResponse = self
            .get_json(
                &format!("messages/{message_id}/attachments/{attachment_id}"),
                &[],
            )
            .await?;

        attachment
            .data
            .ok_or_else(|| Error::InvalidResponse("attachment response carried no data".to_string()))
    }

    async fn mark_read(&self, message_id: &str) -> Result<()> {
        let body = serde_json::json!({ "removeLabelIds": ["UNREAD"] });
        self.post_json(&format!("messages/{message_id}/modify"), &body)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> RestMailClient {
        let creds = Arc::new(crate::auth::StaticCredentials::new(
            crate::auth::AccessToken::new("t"),
        ));
        RestMailClient::new("https://mail.example.com/api/v1", creds)
    }

    #[test]
    fn test_list_query_is_percent_encoded() {
        let client = client();
        let query = MessageQuery::unread_with_subject("New Commission");

        let request = client
            .http
            .get(format!("{}messages", client.base_url))
            .query(&[("q", &query.to_query_string())])
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://mail.example.com/api/v1/messages?q=subject%3ANew+Commission+is%3Aunread"
        );
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = client();
        assert!(client.base_url.ends_with('/'));
    }
}
