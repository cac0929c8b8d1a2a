//! Attachment downloading with bounded retries.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use commissary_mail::encoding::decode_base64url;
use commissary_mail::types::AttachmentLocator;
use commissary_mail::MailProvider;

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Files at or above this size are real images and are never re-fetched.
pub const REAL_IMAGE_MIN_BYTES: u64 = 2000;

/// Decoded payloads below this size are treated as corrupt, not genuine.
pub const MIN_ATTACHMENT_BYTES: usize = 1000;

/// Per-attempt download timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads attachment blobs into the image cache.
///
/// The fetcher retries per its policy and reports exhaustion as
/// `Ok(None)`; it never writes placeholders itself. Placeholder
/// fallback belongs to the caller (the reconciler).
pub struct AttachmentFetcher {
    provider: Arc<dyn MailProvider>,
    cache_dir: PathBuf,
    policy: RetryPolicy,
}

impl AttachmentFetcher {
    /// Creates a fetcher writing into `cache_dir`, with the default
    /// policy of 3 attempts and 2s/4s/8s backoff.
    #[must_use]
    pub fn new(provider: Arc<dyn MailProvider>, cache_dir: PathBuf) -> Self {
        Self {
            provider,
            cache_dir,
            policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy. Used by tests to shrink delays.
    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Destination path for a record's cached image.
    #[must_use]
    pub fn image_path(&self, dest_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{dest_id}.png"))
    }

    /// Fetches the attachment into `<cache_dir>/<dest_id>.png`.
    ///
    /// Each attempt first checks the destination: an existing file of at
    /// least [`REAL_IMAGE_MIN_BYTES`] short-circuits without a network
    /// call. Timeouts, transport errors, and too-small payloads consume
    /// an attempt; once the budget is spent, `Ok(None)` is returned and
    /// the caller decides on placeholder fallback.
    ///
    /// # Errors
    ///
    /// Propagates non-retryable failures: authorization loss and local
    /// I/O errors while writing the destination file.
    pub async fn fetch(
        &self,
        locator: &AttachmentLocator,
        dest_id: &str,
    ) -> Result<Option<PathBuf>> {
        let dest = self.image_path(dest_id);

        let outcome = self
            .policy
            .run(|attempt| self.attempt(locator, &dest, attempt), Self::is_retryable)
            .await;

        match outcome {
            Ok(path) => Ok(Some(path)),
            Err(err) if Self::is_retryable(&err) => {
                warn!(dest_id, error = %err, "attachment fetch exhausted retries");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn attempt(
        &self,
        locator: &AttachmentLocator,
        dest: &Path,
        attempt: u32,
    ) -> Result<PathBuf> {
        if is_real_image(dest) {
            debug!(path = %dest.display(), "cached file already real, skipping download");
            return Ok(dest.to_path_buf());
        }

        debug!(
            message_id = %locator.message_id,
            attachment_id = %locator.attachment_id,
            attempt,
            "downloading attachment"
        );

        let payload = timeout(
            FETCH_TIMEOUT,
            self.provider
                .get_attachment(&locator.message_id, &locator.attachment_id),
        )
        .await
        .map_err(|_| Error::DownloadTimeout)??;

        let bytes = decode_base64url(&payload).map_err(Error::Mail)?;
        if bytes.len() < MIN_ATTACHMENT_BYTES {
            return Err(Error::DownloadTooSmall { size: bytes.len() });
        }

        write_atomic(dest, &bytes)?;
        info!(path = %dest.display(), size = bytes.len(), "attachment cached");
        Ok(dest.to_path_buf())
    }

    /// Failures that consume an attempt rather than aborting the fetch.
    fn is_retryable(err: &Error) -> bool {
        match err {
            Error::DownloadTimeout | Error::DownloadTooSmall { .. } => true,
            Error::Mail(mail_err) => !matches!(mail_err, commissary_mail::Error::AuthRequired),
            _ => false,
        }
    }
}

/// True when the file exists and is large enough to be a real image.
pub(crate) fn is_real_image(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.len() >= REAL_IMAGE_MIN_BYTES)
}

/// Writes via a uniquely-named temp file and renames into place, so an
/// interrupted download can never leave a partial file that passes the
/// size check.
fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = dest.with_extension(format!("png.tmp-{}", std::process::id()));
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, dest)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE;

    use commissary_mail::types::{FullMessage, MessageQuery, MessageSummary};

    /// What the fake provider should do on each attachment request.
    enum Behavior {
        Payload(String),
        TransportError,
        AuthRequired,
    }

    struct FakeProvider {
        behavior: Behavior,
        attachment_calls: AtomicU32,
    }

    impl FakeProvider {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                attachment_calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.attachment_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MailProvider for FakeProvider {
        async fn list_unread(
            &self,
            _query: &MessageQuery,
        ) -> commissary_mail::Result<Vec<MessageSummary>> {
            Ok(Vec::new())
        }

        async fn get_full_message(&self, _id: &str) -> commissary_mail::Result<FullMessage> {
            Err(commissary_mail::Error::InvalidResponse("not used".to_string()))
        }

        async fn get_attachment(
            &self,
            _message_id: &str,
            _attachment_id: &str,
        ) -> commissary_mail::Result<String> {
            self.attachment_calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Payload(data) => Ok(data.clone()),
                Behavior::TransportError => Err(commissary_mail::Error::Api {
                    status: 503,
                    message: "Service Unavailable".to_string(),
                }),
                Behavior::AuthRequired => Err(commissary_mail::Error::AuthRequired),
            }
        }

        async fn mark_read(&self, _message_id: &str) -> commissary_mail::Result<()> {
            Ok(())
        }
    }

    fn locator() -> AttachmentLocator {
        AttachmentLocator {
            message_id: "msg-1".to_string(),
            attachment_id: "att-1".to_string(),
        }
    }

    fn encoded_payload(len: usize) -> String {
        URL_SAFE.encode(vec![0xAB; len])
    }

    #[tokio::test]
    async fn test_fetch_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeProvider::new(Behavior::Payload(encoded_payload(3000))));
        let fetcher = AttachmentFetcher::new(provider.clone(), dir.path().to_path_buf());

        let path = fetcher.fetch(&locator(), "rec").await.unwrap().unwrap();

        assert_eq!(path, dir.path().join("rec.png"));
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xAB; 3000]);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_short_circuits_on_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("rec.png");
        std::fs::write(&dest, vec![0u8; 2000]).unwrap();

        let provider = Arc::new(FakeProvider::new(Behavior::TransportError));
        let fetcher = AttachmentFetcher::new(provider.clone(), dir.path().to_path_buf());

        let path = fetcher.fetch(&locator(), "rec").await.unwrap().unwrap();
        assert_eq!(path, dest);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_retries_then_gives_up() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeProvider::new(Behavior::TransportError));
        let fetcher = AttachmentFetcher::new(provider.clone(), dir.path().to_path_buf());
        let started = tokio::time::Instant::now();

        let result = fetcher.fetch(&locator(), "rec").await.unwrap();

        assert!(result.is_none());
        assert_eq!(provider.calls(), 3);
        // Backoff schedule is 2s + 4s + 8s.
        assert_eq!(started.elapsed(), Duration::from_secs(14));
        assert!(!dir.path().join("rec.png").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_too_small_payload_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeProvider::new(Behavior::Payload(encoded_payload(500))));
        let fetcher = AttachmentFetcher::new(provider.clone(), dir.path().to_path_buf());

        let result = fetcher.fetch(&locator(), "rec").await.unwrap();

        assert!(result.is_none());
        assert_eq!(provider.calls(), 3);
        assert!(!dir.path().join("rec.png").exists());
    }

    #[tokio::test]
    async fn test_auth_required_propagates_without_retry() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeProvider::new(Behavior::AuthRequired));
        let fetcher = AttachmentFetcher::new(provider.clone(), dir.path().to_path_buf());

        let err = fetcher.fetch(&locator(), "rec").await.unwrap_err();

        assert!(err.is_auth_required());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_overwrites_small_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("rec.png");
        std::fs::write(&dest, vec![0u8; 100]).unwrap();

        let provider = Arc::new(FakeProvider::new(Behavior::Payload(encoded_payload(2500))));
        let fetcher = AttachmentFetcher::new(provider, dir.path().to_path_buf());

        fetcher.fetch(&locator(), "rec").await.unwrap().unwrap();
        assert_eq!(std::fs::read(&dest).unwrap().len(), 2500);
    }
}
