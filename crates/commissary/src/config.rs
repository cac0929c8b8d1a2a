//! Service configuration.
//!
//! Read from `config.json` under the platform config directory, with
//! sensible defaults when the file is absent. The mail API token is
//! never stored in the file; it comes from the environment.

use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Environment variable carrying the pre-issued mail API token.
pub const TOKEN_ENV: &str = "COMMISSARY_MAIL_TOKEN";

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Mail provider settings.
    pub mail: MailConfig,
    /// Local storage settings.
    pub storage: StorageConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Loopback port the server binds.
    pub port: u16,
}

/// Mail provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Base URL of the provider's REST message API.
    pub api_base: String,
    /// Subject substring identifying intake emails.
    pub subject_filter: String,
}

/// Local storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the `SQLite` database file. Relative paths resolve
    /// against the platform data directory.
    pub database_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8310 }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_base: "https://gmail.googleapis.com/gmail/v1/users/me/".to_string(),
            subject_filter: "New Commission".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "commissary.db".to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration, falling back to defaults when the file
    /// is absent.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or
    /// parsed. A malformed config is a setup mistake the operator must
    /// see, not something to silently paper over with defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::path())
    }

    fn load_from(path: &PathBuf) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config at {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing config at {}", path.display()))
    }

    /// Location of the config file.
    #[must_use]
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("commissary")
            .join("config.json")
    }

    /// Absolute path of the database file.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.storage.database_path);
        if path.is_absolute() {
            return path;
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("commissary")
            .join(path)
    }
}
