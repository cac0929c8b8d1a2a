//! Base64 decoding for provider payloads.
//!
//! Mail REST APIs return message bodies and attachment data in the
//! URL-safe Base64 alphabet (`-` and `_` instead of `+` and `/`),
//! with or without trailing padding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::Result;

/// Decodes URL-safe Base64 data into raw bytes.
///
/// Whitespace is stripped, the URL-safe alphabet is translated to the
/// standard one, and missing padding is restored before decoding.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64url(data: &str) -> Result<Vec<u8>> {
    let mut translated: String = data
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    while translated.len() % 4 != 0 {
        translated.push('=');
    }

    STANDARD.decode(&translated).map_err(Into::into)
}
