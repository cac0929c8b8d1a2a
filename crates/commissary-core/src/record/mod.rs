//! Intake records and their persistence.
//!
//! The record store is treated as an opaque, single-document-atomic
//! key-value store behind the [`DocumentStore`] trait; the bundled
//! implementation is a `SQLite` repository.

mod model;
mod repository;
mod store;

pub use model::{IntakeRecord, WorkflowFlag};
pub use repository::RecordRepository;
pub use store::DocumentStore;
