//! Intake email body parsing.
//!
//! Intake emails are machine-generated by the commission request form and
//! carry their fields at fixed line positions. The body is parsed from the
//! already-decoded line sequence; the attachment reference is discovered
//! by a depth-first walk of the message's MIME part tree.

use chrono::{Days, NaiveDate};

use commissary_mail::types::{AttachmentLocator, MessagePart};

use crate::error::{Error, Result};
use crate::record::IntakeRecord;

/// Minimum number of body lines in a well-formed intake email.
const MIN_BODY_LINES: usize = 16;

/// Fixed 0-indexed line positions of the intake fields.
const LINE_DATE: usize = 1;
const LINE_COMMISSION_TYPE: usize = 3;
const LINE_COMMISSION_NAME: usize = 5;
const LINE_NAME: usize = 7;
const LINE_HANDLE: usize = 9;
const LINE_EMAIL: usize = 11;
const LINE_PAYPAL: usize = 13;
const LINE_COMPLEX: usize = 15;

/// Days after the start date that payment is due.
const PAY_DUE_DAYS: u64 = 30;

/// Parses one intake email into a record and its attachment locator.
///
/// `lines` is the CRLF-split, Base64-decoded message body; `payload` is
/// the root of the message's MIME part tree.
///
/// # Errors
///
/// - [`Error::MalformedMessage`] if fewer than 16 body lines are present
/// - [`Error::MalformedDate`] if the date line is not `month/day/year`
/// - [`Error::NoAttachmentFound`] if no part in the tree carries an
///   attachment reference
///
/// All three are per-message conditions: the caller skips the message
/// and continues the batch.
pub fn parse_intake_message(
    message_id: &str,
    lines: &[String],
    payload: Option<&MessagePart>,
) -> Result<(IntakeRecord, AttachmentLocator)> {
    if lines.len() < MIN_BODY_LINES {
        return Err(Error::MalformedMessage(format!(
            "expected at least {MIN_BODY_LINES} body lines, got {}",
            lines.len()
        )));
    }

    let field = |index: usize| lines[index].trim().to_string();

    let start_date = parse_start_date(&field(LINE_DATE))?;
    let commission_type = field(LINE_COMMISSION_TYPE);
    let commission_name = field(LINE_COMMISSION_NAME);
    let name = first_token(&field(LINE_NAME));
    let handle = normalize_handle(&field(LINE_HANDLE));
    let email = field(LINE_EMAIL);
    let paypal_email = field(LINE_PAYPAL);
    let is_complex = field(LINE_COMPLEX) == "true";

    let attachment_id = find_attachment(payload).ok_or(Error::NoAttachmentFound)?;

    let record = IntakeRecord {
        id: format!("{commission_type}{handle}"),
        name,
        start_date,
        pay_due: start_date + Days::new(PAY_DUE_DAYS),
        handle,
        commission_type,
        commission_name,
        email,
        paypal_email,
        message_id: message_id.to_string(),
        attachment_id: Some(attachment_id.clone()),
        is_complex,
        complete: false,
        archived: false,
        paid: false,
        email_pay: false,
        email_complete: false,
        email_complete_pay: false,
        email_wip: false,
    };

    let locator = AttachmentLocator {
        message_id: message_id.to_string(),
        attachment_id,
    };

    Ok((record, locator))
}

/// Normalizes a social-media handle.
///
/// Profile URLs keep only the segment after the last `/`; `@`-prefixed
/// handles keep only what follows the last `@`; anything else passes
/// through. Normalizing twice yields the same result.
#[must_use]
pub fn normalize_handle(raw: &str) -> String {
    if let Some((_, rest)) = raw.rsplit_once('/') {
        rest.to_string()
    } else if let Some((_, rest)) = raw.rsplit_once('@') {
        rest.to_string()
    } else {
        raw.to_string()
    }
}

/// Parses a `month/day/year` date line.
fn parse_start_date(raw: &str) -> Result<NaiveDate> {
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        return Err(Error::MalformedDate(format!(
            "expected month/day/year, got {raw:?}"
        )));
    }

    let month: u32 = parse_component(parts[0], raw)?;
    let day: u32 = parse_component(parts[1], raw)?;
    let year: i32 = parse_component(parts[2], raw)?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::MalformedDate(format!("no such calendar date: {raw:?}")))
}

fn parse_component<T: std::str::FromStr>(part: &str, raw: &str) -> Result<T> {
    part.trim()
        .parse()
        .map_err(|_| Error::MalformedDate(format!("non-numeric component in {raw:?}")))
}

/// First whitespace-delimited token of a line; the rest is discarded.
fn first_token(line: &str) -> String {
    line.split_whitespace().next().unwrap_or_default().to_string()
}

/// Depth-first pre-order search of the part tree for the first part
/// carrying an attachment reference.
fn find_attachment(part: Option<&MessagePart>) -> Option<String> {
    let part = part?;

    if let Some(id) = part.body.as_ref().and_then(|b| b.attachment_id.clone()) {
        return Some(id);
    }

    part.parts.iter().find_map(|child| find_attachment(Some(child)))
}
