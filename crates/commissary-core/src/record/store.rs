//! The abstract document-store contract.

use async_trait::async_trait;

use super::model::{IntakeRecord, WorkflowFlag};
use crate::Result;

/// Single-document-atomic key-value storage for intake records.
///
/// Implemented by [`super::RecordRepository`] over `SQLite`; deployments
/// backed by a cloud document database supply their own implementation.
/// No multi-document transactions are required by the pipeline.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates or overwrites the record keyed by `record.id`.
    ///
    /// On overwrite, every field is replaced except the workflow flags,
    /// which are caller-controlled and must survive re-ingestion.
    async fn upsert_record(&self, record: &IntakeRecord) -> Result<()>;

    /// Looks up one record by id.
    async fn get_record(&self, id: &str) -> Result<Option<IntakeRecord>>;

    /// Returns all known records.
    async fn list_records(&self) -> Result<Vec<IntakeRecord>>;

    /// Sets one GUI-owned workflow flag. The pipeline never calls this;
    /// it exists for the GUI collaborator.
    async fn set_flag(&self, id: &str, flag: WorkflowFlag, value: bool) -> Result<()>;
}
