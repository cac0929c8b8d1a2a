//! `SQLite` repository for intake records.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use super::model::{IntakeRecord, WorkflowFlag};
use super::store::DocumentStore;
use crate::Result;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository for intake record storage and retrieval.
pub struct RecordRepository {
    pool: SqlitePool,
}

impl RecordRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                start_date TEXT NOT NULL,
                pay_due TEXT NOT NULL,
                handle TEXT NOT NULL DEFAULT '',
                commission_type TEXT NOT NULL DEFAULT '',
                commission_name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                paypal_email TEXT NOT NULL DEFAULT '',
                message_id TEXT NOT NULL DEFAULT '',
                attachment_id TEXT,
                is_complex INTEGER NOT NULL DEFAULT 0,
                complete INTEGER NOT NULL DEFAULT 0,
                archived INTEGER NOT NULL DEFAULT 0,
                paid INTEGER NOT NULL DEFAULT 0,
                email_pay INTEGER NOT NULL DEFAULT 0,
                email_complete INTEGER NOT NULL DEFAULT 0,
                email_complete_pay INTEGER NOT NULL DEFAULT 0,
                email_wip INTEGER NOT NULL DEFAULT 0
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_record(row: &SqliteRow) -> Option<IntakeRecord> {
        let start_date_str: String = row.get("start_date");
        let pay_due_str: String = row.get("pay_due");
        let start_date = NaiveDate::parse_from_str(&start_date_str, DATE_FORMAT).ok()?;
        let pay_due = NaiveDate::parse_from_str(&pay_due_str, DATE_FORMAT).ok()?;

        Some(IntakeRecord {
            id: row.get("id"),
            name: row.get("name"),
            start_date,
            pay_due,
            handle: row.get("handle"),
            commission_type: row.get("commission_type"),
            commission_name: row.get("commission_name"),
            email: row.get("email"),
            paypal_email: row.get("paypal_email"),
            message_id: row.get("message_id"),
            attachment_id: row.get("attachment_id"),
            is_complex: row.get::<bool, _>("is_complex"),
            complete: row.get::<bool, _>("complete"),
            archived: row.get::<bool, _>("archived"),
            paid: row.get::<bool, _>("paid"),
            email_pay: row.get::<bool, _>("email_pay"),
            email_complete: row.get::<bool, _>("email_complete"),
            email_complete_pay: row.get::<bool, _>("email_complete_pay"),
            email_wip: row.get::<bool, _>("email_wip"),
        })
    }
}

#[async_trait]
impl DocumentStore for RecordRepository {
    /// Create-or-overwrite by id. The ON CONFLICT clause deliberately
    /// leaves the workflow flag columns alone: re-ingesting a commission
    /// must not reset what the operator has already marked.
    async fn upsert_record(&self, record: &IntakeRecord) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO records
                (id, name, start_date, pay_due, handle, commission_type, commission_name,
                 email, paypal_email, message_id, attachment_id, is_complex,
                 complete, archived, paid, email_pay, email_complete, email_complete_pay, email_wip)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                start_date = excluded.start_date,
                pay_due = excluded.pay_due,
                handle = excluded.handle,
                commission_type = excluded.commission_type,
                commission_name = excluded.commission_name,
                email = excluded.email,
                paypal_email = excluded.paypal_email,
                message_id = excluded.message_id,
                attachment_id = excluded.attachment_id,
                is_complex = excluded.is_complex
            ",
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(record.start_date.format(DATE_FORMAT).to_string())
        .bind(record.pay_due.format(DATE_FORMAT).to_string())
        .bind(&record.handle)
        .bind(&record.commission_type)
        .bind(&record.commission_name)
        .bind(&record.email)
        .bind(&record.paypal_email)
        .bind(&record.message_id)
        .bind(&record.attachment_id)
        .bind(record.is_complex)
        .bind(record.complete)
        .bind(record.archived)
        .bind(record.paid)
        .bind(record.email_pay)
        .bind(record.email_complete)
        .bind(record.email_complete_pay)
        .bind(record.email_wip)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_record(&self, id: &str) -> Result<Option<IntakeRecord>> {
        let row = sqlx::query(r"SELECT * FROM records WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().and_then(Self::row_to_record))
    }

    async fn list_records(&self) -> Result<Vec<IntakeRecord>> {
        let rows = sqlx::query(r"SELECT * FROM records ORDER BY start_date DESC, id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().filter_map(Self::row_to_record).collect())
    }

    async fn set_flag(&self, id: &str, flag: WorkflowFlag, value: bool) -> Result<()> {
        // Column name comes from a fixed enum, never from input.
        let query = format!("UPDATE records SET {} = ? WHERE id = ?", flag.column());
        sqlx::query(&query)
            .bind(value)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
