//! Intake record data model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The persisted unit of work representing one client's commission intake.
///
/// The `id` is derived from commission type and handle and is immutable
/// once the record exists. Re-ingesting the same id overwrites every
/// field except the workflow flags, which belong to the GUI and are
/// never touched by the pipeline after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRecord {
    /// Stable id: commission type concatenated with the handle.
    pub id: String,
    /// Client name (first token of the name line).
    pub name: String,
    /// Commission start date.
    pub start_date: NaiveDate,
    /// Payment due date: start date plus 30 days. Computed, not parsed.
    pub pay_due: NaiveDate,
    /// Social-media handle, normalized (no URL or `@` prefix).
    pub handle: String,
    /// Commission type (sketch, inked, colored, ...).
    pub commission_type: String,
    /// Title the client gave the commission.
    pub commission_name: String,
    /// Contact email address.
    pub email: String,
    /// PayPal email address for invoicing.
    pub paypal_email: String,
    /// Mail-provider reference to the source message.
    pub message_id: String,
    /// Mail-provider reference to the attachment, if one was found.
    pub attachment_id: Option<String>,
    /// Whether the client marked the commission as complex.
    pub is_complex: bool,
    /// Work finished. GUI-owned.
    pub complete: bool,
    /// Hidden from the active list. GUI-owned.
    pub archived: bool,
    /// Payment received. GUI-owned.
    pub paid: bool,
    /// "Payment due" email copied/sent. GUI-owned.
    pub email_pay: bool,
    /// "Work complete" email copied/sent. GUI-owned.
    pub email_complete: bool,
    /// "Complete and paid" email copied/sent. GUI-owned.
    pub email_complete_pay: bool,
    /// "Work in progress" email copied/sent. GUI-owned.
    pub email_wip: bool,
}

/// The GUI-owned boolean flags on an intake record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowFlag {
    /// Work finished.
    Complete,
    /// Hidden from the active list.
    Archived,
    /// Payment received.
    Paid,
    /// "Payment due" email sent.
    EmailPay,
    /// "Work complete" email sent.
    EmailComplete,
    /// "Complete and paid" email sent.
    EmailCompletePay,
    /// "Work in progress" email sent.
    EmailWip,
}

impl WorkflowFlag {
    /// Database column backing this flag.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Archived => "archived",
            Self::Paid => "paid",
            Self::EmailPay => "email_pay",
            Self::EmailComplete => "email_complete",
            Self::EmailCompletePay => "email_complete_pay",
            Self::EmailWip => "email_wip",
        }
    }
}

impl IntakeRecord {
    /// True when the record carries everything needed to fetch its
    /// attachment from the mail provider.
    #[must_use]
    pub fn has_attachment_identifiers(&self) -> bool {
        !self.message_id.is_empty() && self.attachment_id.is_some()
    }
}
