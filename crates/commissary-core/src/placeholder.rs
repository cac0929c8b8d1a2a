//! Placeholder image generation.
//!
//! When a real attachment cannot be obtained the pipeline substitutes a
//! fixed, valid, minimal PNG so the GUI never renders a broken image.
//! The file is small enough to stay below the real-image size threshold,
//! which keeps it eligible for replacement by a later fetch.

use std::fs;
use std::path::Path;

use tracing::error;

/// A valid 1x1 transparent PNG.
const PLACEHOLDER_PNG: [u8; 70] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0x64,
    0x60, 0xF8, 0x5F, 0x0F, 0x00, 0x02, 0x87, 0x01, 0x80, 0xEB, 0x47, 0xBA, 0x92, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Returns the fixed placeholder image bytes.
#[must_use]
pub const fn placeholder_png() -> &'static [u8] {
    &PLACEHOLDER_PNG
}

/// Writes the placeholder image to `path`, creating parent directories
/// as needed.
///
/// Never raises: any I/O failure is logged and reported as `false` so
/// callers can degrade gracefully.
pub fn write_placeholder(path: &Path) -> bool {
    if let Some(parent) = path.parent()
        && let Err(err) = fs::create_dir_all(parent)
    {
        error!(path = %path.display(), %err, "failed to create placeholder directory");
        return false;
    }

    match fs::write(path, PLACEHOLDER_PNG) {
        Ok(()) => true,
        Err(err) => {
            error!(path = %path.display(), %err, "failed to write placeholder");
            false
        }
    }
}
