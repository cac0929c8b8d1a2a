//! Cache directory resolution.
//!
//! The image cache needs a writable directory, but where one lives
//! differs between a packaged install, a portable unpack, and a dev
//! checkout. Candidates are tried in preference order; existence alone
//! is not enough because some locations exist read-only, so each
//! candidate gets an actual write probe.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Application subdirectory used under shared locations.
const APP_DIR: &str = "commissary";

/// Name of the image cache directory.
const IMAGES_DIR: &str = "images";

/// Counter making probe filenames unique across concurrent callers.
static PROBE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Resolves a writable directory for the image cache.
///
/// Candidates, in order: the platform per-application data directory,
/// an executable-adjacent `resources/images` directory, an
/// executable-adjacent `images` directory, and `images` under the
/// current working directory. The first candidate that can be created
/// and passes a write probe wins. If all fail, a subfolder of the
/// platform temp directory is used.
///
/// Intended to be called once per process; the result is a long-lived
/// shared location.
///
/// # Errors
///
/// Returns [`Error::DirectoryUnavailable`] when not even the temp
/// fallback is writable. This is fatal: the pipeline cannot proceed
/// without a cache directory.
pub fn resolve_cache_directory() -> Result<PathBuf> {
    for candidate in candidates() {
        if prepare(&candidate) {
            debug!(path = %candidate.display(), "resolved cache directory");
            return Ok(candidate);
        }
    }

    let fallback = std::env::temp_dir().join(format!("{APP_DIR}-{IMAGES_DIR}"));
    if prepare(&fallback) {
        warn!(path = %fallback.display(), "falling back to temp cache directory");
        return Ok(fallback);
    }

    Err(Error::DirectoryUnavailable)
}

/// Candidate cache directories in preference order.
fn candidates() -> Vec<PathBuf> {
    let mut list = Vec::new();

    if let Some(data) = dirs::data_dir() {
        list.push(data.join(APP_DIR).join(IMAGES_DIR));
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(exe_dir) = exe.parent()
    {
        list.push(exe_dir.join("resources").join(IMAGES_DIR));
        list.push(exe_dir.join(IMAGES_DIR));
    }

    if let Ok(cwd) = std::env::current_dir() {
        list.push(cwd.join(IMAGES_DIR));
    }

    list
}

/// Creates the directory if needed and confirms it is actually writable.
fn prepare(dir: &PathBuf) -> bool {
    if !dir.exists() && fs::create_dir_all(dir).is_err() {
        return false;
    }
    probe(dir)
}

/// Writes and removes a uniquely-named marker file.
///
/// The name embeds the process id and a counter so concurrent probes
/// never delete each other's markers.
fn probe(dir: &PathBuf) -> bool {
    let marker = dir.join(format!(
        ".write-probe-{}-{}",
        std::process::id(),
        PROBE_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    if fs::write(&marker, b"probe").is_err() {
        return false;
    }
    let _ = fs::remove_file(&marker);
    true
}
