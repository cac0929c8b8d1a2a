//! Cache reconciliation.
//!
//! Reconciling a record means ensuring its cached image file reflects
//! the best available state: a real downloaded attachment when one can
//! be obtained, a placeholder otherwise. The GUI renders straight from
//! the cache, so every record must end up with some file.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use commissary_mail::MailProvider;
use commissary_mail::types::AttachmentLocator;

use crate::error::{Error, Result};
use crate::fetcher::{AttachmentFetcher, is_real_image};
use crate::placeholder::write_placeholder;
use crate::record::IntakeRecord;

/// Record ids behind the GUI's default image set.
///
/// These are reconciled on every batch pass even when no matching record
/// exists, so the default gallery never renders a broken image.
pub const CRITICAL_RECORD_IDS: &[&str] = &[
    "sketchdefault",
    "inkeddefault",
    "coloreddefault",
    "shadeddefault",
];

/// How a single reconciliation resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileStatus {
    /// A real attachment was fetched and cached.
    Downloaded,
    /// The cached file was already real; no network call was made.
    Skipped,
    /// No attachment could be obtained; a placeholder was written.
    Placeholder,
}

/// Result of reconciling one record.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    /// What action was taken.
    pub status: ReconcileStatus,
    /// Path of the resulting cached file.
    pub path: PathBuf,
}

/// Aggregate counts from a batch reconcile.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReconcileSummary {
    /// Records whose attachment was fetched.
    pub downloaded: u32,
    /// Records backfilled with a placeholder.
    pub placeholder_created: u32,
    /// Records whose reconciliation failed outright.
    pub failed: u32,
    /// Records whose cached file was already real.
    pub already_valid: u32,
}

/// Keeps cached image files in sync with their records.
pub struct CacheReconciler {
    fetcher: AttachmentFetcher,
}

impl CacheReconciler {
    /// Creates a reconciler caching into `cache_dir`.
    #[must_use]
    pub fn new(provider: Arc<dyn MailProvider>, cache_dir: PathBuf) -> Self {
        Self {
            fetcher: AttachmentFetcher::new(provider, cache_dir),
        }
    }

    /// Creates a reconciler around an existing fetcher. Used by tests to
    /// inject a shrunken retry policy.
    #[must_use]
    pub const fn with_fetcher(fetcher: AttachmentFetcher) -> Self {
        Self { fetcher }
    }

    /// Reconciles one record's cached image.
    ///
    /// Decision table: a real cached file (>= 2000 bytes) is kept as-is;
    /// a smaller file is deleted and re-fetched; an absent file is
    /// fetched. Records lacking attachment identifiers, and records
    /// whose fetch exhausts its retries, get a placeholder.
    ///
    /// # Errors
    ///
    /// Returns an error when the fetch fails non-retryably (for example
    /// authorization loss) or the placeholder cannot be written.
    pub async fn reconcile(&self, record: &IntakeRecord) -> Result<ReconcileOutcome> {
        let path = self.fetcher.image_path(&record.id);

        if is_real_image(&path) {
            return Ok(ReconcileOutcome {
                status: ReconcileStatus::Skipped,
                path,
            });
        }

        if path.exists()
            && let Err(err) = std::fs::remove_file(&path)
        {
            warn!(path = %path.display(), %err, "could not remove provisional cache file");
        }

        if !record.has_attachment_identifiers() {
            info!(id = %record.id, "record missing attachment identifiers, using placeholder");
            return self.place_holder(path);
        }

        let locator = AttachmentLocator {
            message_id: record.message_id.clone(),
            // Guarded by has_attachment_identifiers above.
            attachment_id: record.attachment_id.clone().unwrap_or_default(),
        };

        match self.fetcher.fetch(&locator, &record.id).await? {
            Some(path) => Ok(ReconcileOutcome {
                status: ReconcileStatus::Downloaded,
                path,
            }),
            None => self.place_holder(path),
        }
    }

    /// Reconciles every given record plus the critical default ids.
    ///
    /// Each record's outcome is isolated: one failure is counted and
    /// logged, never allowed to abort the batch.
    pub async fn reconcile_all(&self, records: &[IntakeRecord]) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        for record in records {
            match self.reconcile(record).await {
                Ok(outcome) => summary.count(outcome.status),
                Err(err) => {
                    warn!(id = %record.id, error = %err, "reconcile failed");
                    summary.failed += 1;
                }
            }
        }

        for id in CRITICAL_RECORD_IDS {
            if records.iter().any(|r| r.id == *id) {
                continue;
            }
            let path = self.fetcher.image_path(id);
            if is_real_image(&path) || path.exists() {
                summary.already_valid += 1;
            } else if write_placeholder(&path) {
                summary.placeholder_created += 1;
            } else {
                warn!(id, "could not backfill critical default image");
                summary.failed += 1;
            }
        }

        summary
    }

    fn place_holder(&self, path: PathBuf) -> Result<ReconcileOutcome> {
        if write_placeholder(&path) {
            Ok(ReconcileOutcome {
                status: ReconcileStatus::Placeholder,
                path,
            })
        } else {
            Err(Error::CacheWrite(format!(
                "placeholder write failed at {}",
                path.display()
            )))
        }
    }
}

impl ReconcileSummary {
    fn count(&mut self, status: ReconcileStatus) {
        match status {
            ReconcileStatus::Downloaded => self.downloaded += 1,
            ReconcileStatus::Skipped => self.already_valid += 1,
            ReconcileStatus::Placeholder => self.placeholder_created += 1,
        }
    }
}
