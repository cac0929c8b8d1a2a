//! Batch ingestion of intake emails.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use commissary_mail::MailProvider;
use commissary_mail::encoding::decode_base64url;
use commissary_mail::types::MessageQuery;

use crate::error::{Error, Result};
use crate::parser::parse_intake_message;
use crate::reconcile::{CacheReconciler, ReconcileOutcome, ReconcileSummary};
use crate::record::DocumentStore;

/// Knobs for one ingestion run.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Also ingest messages already marked read. Used when rebuilding
    /// the record store from mailbox history.
    pub include_read: bool,
}

/// A message that could not be ingested, and why.
#[derive(Debug, Clone, Serialize)]
pub struct FailedMessage {
    /// Provider-assigned message id.
    pub message_id: String,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Messages parsed, persisted, and reconciled.
    pub processed: u32,
    /// Messages skipped because an earlier message in the same batch
    /// carried the same requester email.
    pub skipped_duplicates: u32,
    /// Messages that failed, with reasons.
    pub failed: Vec<FailedMessage>,
}

/// Drives the poll-parse-persist-reconcile pipeline.
///
/// One orchestrator processes one batch at a time; callers serialize
/// batch runs.
pub struct IngestionOrchestrator {
    provider: Arc<dyn MailProvider>,
    store: Arc<dyn DocumentStore>,
    reconciler: CacheReconciler,
    query: MessageQuery,
}

impl IngestionOrchestrator {
    /// Creates an orchestrator polling messages matching `query`.
    #[must_use]
    pub const fn new(
        provider: Arc<dyn MailProvider>,
        store: Arc<dyn DocumentStore>,
        reconciler: CacheReconciler,
        query: MessageQuery,
    ) -> Self {
        Self {
            provider,
            store,
            reconciler,
            query,
        }
    }

    /// Ingests one batch of intake messages.
    ///
    /// Each message is isolated: a parse or persistence failure is
    /// recorded in the report and the batch continues. The store write
    /// is the durability boundary; a message is only marked read after
    /// its record is persisted, and a failed read-marking is logged but
    /// never rolled back.
    ///
    /// # Errors
    ///
    /// Fails only when the message listing itself cannot be fetched.
    pub async fn ingest_batch(&self, options: IngestOptions) -> Result<IngestReport> {
        let query = self.query.clone().with_unread_only(!options.include_read);
        let summaries = self.provider.list_unread(&query).await?;
        info!(count = summaries.len(), "ingesting message batch");

        let mut report = IngestReport::default();
        let mut seen_emails = HashSet::new();

        for summary in summaries {
            match self.ingest_one(&summary.id, &mut seen_emails).await {
                Ok(true) => report.processed += 1,
                Ok(false) => report.skipped_duplicates += 1,
                Err(err) => {
                    warn!(message_id = %summary.id, error = %err, "message ingestion failed");
                    report.failed.push(FailedMessage {
                        message_id: summary.id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            processed = report.processed,
            skipped = report.skipped_duplicates,
            failed = report.failed.len(),
            "batch complete"
        );
        Ok(report)
    }

    /// Ingests a single message. `Ok(false)` means a batch-local
    /// duplicate was skipped.
    async fn ingest_one(&self, message_id: &str, seen: &mut HashSet<String>) -> Result<bool> {
        let message = self.provider.get_full_message(message_id).await?;
        let raw = message
            .raw_body()
            .ok_or_else(|| Error::MalformedMessage("message has no text body".to_string()))?;
        let bytes = decode_base64url(raw)?;
        let lines: Vec<String> = String::from_utf8_lossy(&bytes)
            .split('\n')
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();

        let (record, _) = parse_intake_message(message_id, &lines, message.payload.as_ref())?;

        if !seen.insert(record.email.to_lowercase()) {
            debug!(message_id, email = %record.email, "duplicate requester in batch, skipping");
            return Ok(false);
        }

        self.store.upsert_record(&record).await?;

        if let Err(err) = self.reconciler.reconcile(&record).await {
            warn!(id = %record.id, error = %err, "attachment reconcile failed after store write");
        }

        if let Err(err) = self.provider.mark_read(message_id).await {
            warn!(message_id, error = %err, "could not mark message read");
        }

        Ok(true)
    }

    /// Re-runs cache reconciliation for one stored record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] when no record has the given
    /// id, or the reconcile error when the cache cannot be repaired.
    pub async fn reprocess(&self, id: &str) -> Result<ReconcileOutcome> {
        let record = self
            .store
            .get_record(id)
            .await?
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        self.reconciler.reconcile(&record).await
    }

    /// Reconciles the cache for every stored record.
    ///
    /// # Errors
    ///
    /// Fails only when the record enumeration itself fails; individual
    /// reconcile failures are aggregated in the summary.
    pub async fn reconcile_all(&self) -> Result<ReconcileSummary> {
        let records = self.store.list_records().await?;
        Ok(self.reconciler.reconcile_all(&records).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE;

    use commissary_mail::types::{FullMessage, MessagePart, MessageSummary, PartBody};

    use crate::fetcher::AttachmentFetcher;
    use crate::record::RecordRepository;
    use crate::retry::RetryPolicy;

    struct FakeProvider {
        messages: Vec<FullMessage>,
        mark_read_ok: bool,
        marked: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn new(messages: Vec<FullMessage>) -> Self {
            Self {
                messages,
                mark_read_ok: true,
                marked: Mutex::new(Vec::new()),
            }
        }

        fn with_failing_mark_read(mut self) -> Self {
            self.mark_read_ok = false;
            self
        }

        fn marked(&self) -> Vec<String> {
            self.marked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MailProvider for FakeProvider {
        async fn list_unread(
            &self,
            _query: &MessageQuery,
        ) -> commissary_mail::Result<Vec<MessageSummary>> {
            Ok(self
                .messages
                .iter()
                .map(|m| MessageSummary {
                    id: m.id.clone(),
                    thread_id: None,
                })
                .collect())
        }

        async fn get_full_message(&self, id: &str) -> commissary_mail::Result<FullMessage> {
            self.messages
                .iter()
                .find(|m| m.id == id)
                .cloned()
                .ok_or_else(|| commissary_mail::Error::InvalidResponse(format!("no message {id}")))
        }

        async fn get_attachment(
            &self,
            _message_id: &str,
            _attachment_id: &str,
        ) -> commissary_mail::Result<String> {
            Ok(URL_SAFE.encode(vec![0xEE; 3000]))
        }

        async fn mark_read(&self, message_id: &str) -> commissary_mail::Result<()> {
            if self.mark_read_ok {
                self.marked.lock().unwrap().push(message_id.to_string());
                Ok(())
            } else {
                Err(commissary_mail::Error::Api {
                    status: 500,
                    message: "Internal Server Error".to_string(),
                })
            }
        }
    }

    fn intake_body(email: &str) -> String {
        [
            "Commission start date:",
            "2/10/2024",
            "Commission type:",
            "inked",
            "Commission name:",
            "Fox portrait",
            "Name:",
            "Casey Morgan",
            "Handle:",
            "@caseydraws",
            "Email:",
            email,
            "PayPal:",
            "casey.pay@example.com",
            "Complex:",
            "false",
        ]
        .join("\r\n")
    }

    fn intake_message(id: &str, email: &str) -> FullMessage {
        FullMessage {
            id: id.to_string(),
            snippet: None,
            payload: Some(MessagePart {
                mime_type: "multipart/mixed".to_string(),
                parts: vec![
                    MessagePart {
                        mime_type: "text/plain".to_string(),
                        body: Some(PartBody {
                            attachment_id: None,
                            size: 0,
                            data: Some(URL_SAFE.encode(intake_body(email))),
                        }),
                        ..MessagePart::default()
                    },
                    MessagePart {
                        mime_type: "image/png".to_string(),
                        filename: "reference.png".to_string(),
                        body: Some(PartBody {
                            attachment_id: Some(format!("att-{id}")),
                            size: 3000,
                            data: None,
                        }),
                        ..MessagePart::default()
                    },
                ],
                ..MessagePart::default()
            }),
        }
    }

    fn malformed_message(id: &str) -> FullMessage {
        FullMessage {
            id: id.to_string(),
            snippet: None,
            payload: Some(MessagePart {
                mime_type: "text/plain".to_string(),
                body: Some(PartBody {
                    attachment_id: None,
                    size: 0,
                    data: Some(URL_SAFE.encode("just one line")),
                }),
                ..MessagePart::default()
            }),
        }
    }

    async fn orchestrator(
        provider: Arc<FakeProvider>,
        dir: &std::path::Path,
    ) -> (IngestionOrchestrator, Arc<RecordRepository>) {
        let store = Arc::new(RecordRepository::in_memory().await.unwrap());

        let fetcher = AttachmentFetcher::new(provider.clone(), dir.to_path_buf())
            .with_policy(RetryPolicy::new(3, Duration::ZERO));
        let reconciler = CacheReconciler::with_fetcher(fetcher);

        let orchestrator = IngestionOrchestrator::new(
            provider,
            store.clone(),
            reconciler,
            MessageQuery::unread_with_subject("New Commission"),
        );
        (orchestrator, store)
    }

    #[tokio::test]
    async fn test_ingest_persists_caches_and_marks_read() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeProvider::new(vec![intake_message(
            "msg-1",
            "casey@example.com",
        )]));
        let (orchestrator, store) = orchestrator(provider.clone(), dir.path()).await;

        let report = orchestrator.ingest_batch(IngestOptions::default()).await.unwrap();

        assert_eq!(report.processed, 1);
        assert!(report.failed.is_empty());

        let record = store.get_record("inkedcaseydraws").await.unwrap().unwrap();
        assert_eq!(record.email, "casey@example.com");
        assert_eq!(record.message_id, "msg-1");

        assert!(dir.path().join("inkedcaseydraws.png").exists());
        assert_eq!(provider.marked(), vec!["msg-1".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_requester_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeProvider::new(vec![
            intake_message("msg-1", "casey@example.com"),
            intake_message("msg-2", "CASEY@example.com"),
        ]));
        let (orchestrator, store) = orchestrator(provider.clone(), dir.path()).await;

        let report = orchestrator.ingest_batch(IngestOptions::default()).await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped_duplicates, 1);
        assert_eq!(store.list_records().await.unwrap().len(), 1);
        // The duplicate stays unread.
        assert_eq!(provider.marked(), vec!["msg-1".to_string()]);
    }

    #[tokio::test]
    async fn test_parse_failure_does_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeProvider::new(vec![
            malformed_message("msg-bad"),
            intake_message("msg-good", "casey@example.com"),
        ]));
        let (orchestrator, store) = orchestrator(provider.clone(), dir.path()).await;

        let report = orchestrator.ingest_batch(IngestOptions::default()).await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].message_id, "msg-bad");
        assert_eq!(store.list_records().await.unwrap().len(), 1);
        // The malformed message is left unread for inspection.
        assert_eq!(provider.marked(), vec!["msg-good".to_string()]);
    }

    #[tokio::test]
    async fn test_mark_read_failure_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(
            FakeProvider::new(vec![intake_message("msg-1", "casey@example.com")])
                .with_failing_mark_read(),
        );
        let (orchestrator, store) = orchestrator(provider, dir.path()).await;

        let report = orchestrator.ingest_batch(IngestOptions::default()).await.unwrap();

        // The store write stands even though read-marking failed.
        assert_eq!(report.processed, 1);
        assert!(report.failed.is_empty());
        assert!(store.get_record("inkedcaseydraws").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reprocess_unknown_record() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeProvider::new(Vec::new()));
        let (orchestrator, _) = orchestrator(provider, dir.path()).await;

        let err = orchestrator.reprocess("nosuchrecord").await.unwrap_err();
        assert!(matches!(err, Error::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn test_reprocess_refetches_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeProvider::new(vec![intake_message(
            "msg-1",
            "casey@example.com",
        )]));
        let (orchestrator, _) = orchestrator(provider, dir.path()).await;

        orchestrator.ingest_batch(IngestOptions::default()).await.unwrap();
        std::fs::remove_file(dir.path().join("inkedcaseydraws.png")).unwrap();

        let outcome = orchestrator.reprocess("inkedcaseydraws").await.unwrap();
        assert_eq!(outcome.status, crate::reconcile::ReconcileStatus::Downloaded);
        assert!(outcome.path.exists());
    }

    #[tokio::test]
    async fn test_reconcile_all_covers_stored_records() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeProvider::new(vec![
            intake_message("msg-1", "casey@example.com"),
            intake_message("msg-2", "robin@example.com"),
        ]));
        let (orchestrator, _) = orchestrator(provider, dir.path()).await;

        orchestrator.ingest_batch(IngestOptions::default()).await.unwrap();
        std::fs::remove_file(dir.path().join("inkedcaseydraws.png")).unwrap();

        let summary = orchestrator.reconcile_all().await.unwrap();
        assert_eq!(summary.downloaded, 1);
        assert_eq!(summary.already_valid, 1);
        assert_eq!(summary.failed, 0);
    }
}
