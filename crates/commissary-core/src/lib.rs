//! # commissary-core
//!
//! Core pipeline for the Commissary commission tracker.
//!
//! This crate provides:
//! - Intake record model and `SQLite` persistence
//! - **Record Parser** - fixed-position intake email body parsing
//! - **Attachment Fetcher** - bounded-retry attachment downloads
//! - **Cache Reconciler** - local image cache upkeep with placeholder fallback
//! - **Ingestion Orchestrator** - batch mailbox polling into the record store
//! - Cache directory resolution and placeholder image generation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod cachedir;
mod error;
pub mod fetcher;
pub mod ingest;
pub mod parser;
pub mod placeholder;
pub mod reconcile;
pub mod record;
pub mod retry;

pub use cachedir::resolve_cache_directory;
pub use error::{Error, Result};
pub use fetcher::{AttachmentFetcher, MIN_ATTACHMENT_BYTES, REAL_IMAGE_MIN_BYTES};
pub use ingest::{FailedMessage, IngestOptions, IngestReport, IngestionOrchestrator};
pub use parser::{normalize_handle, parse_intake_message};
pub use placeholder::{placeholder_png, write_placeholder};
pub use reconcile::{
    CRITICAL_RECORD_IDS, CacheReconciler, ReconcileOutcome, ReconcileStatus, ReconcileSummary,
};
pub use record::{DocumentStore, IntakeRecord, RecordRepository, WorkflowFlag};
pub use retry::RetryPolicy;
