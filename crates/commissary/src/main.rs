//! Commissary - local ingestion service for commission intake emails.
//!
//! Polls a mailbox for intake emails, parses them into commission
//! records, caches their reference images, and serves both over a local
//! HTTP API for the GUI shell.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commissary_core::{
    CacheReconciler, IngestionOrchestrator, RecordRepository, resolve_cache_directory,
};
use commissary_mail::auth::{AccessToken, StaticCredentials};
use commissary_mail::client::RestMailClient;
use commissary_mail::types::MessageQuery;
use commissary_server::AppState;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "commissary=debug,commissary_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Commissary");

    let config = Config::load()?;

    let token = std::env::var(config::TOKEN_ENV)
        .with_context(|| format!("{} must be set", config::TOKEN_ENV))?;
    let credentials = Arc::new(StaticCredentials::new(AccessToken::new(token)));
    let provider = Arc::new(RestMailClient::new(
        config.mail.api_base.clone(),
        credentials,
    ));

    let cache_dir = resolve_cache_directory().context("resolving image cache directory")?;
    info!(path = %cache_dir.display(), "image cache directory");

    let database_path = config.database_path();
    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let store = Arc::new(
        RecordRepository::new(&database_path.display().to_string())
            .await
            .context("opening record database")?,
    );

    let reconciler = CacheReconciler::new(provider.clone(), cache_dir.clone());
    let orchestrator = Arc::new(IngestionOrchestrator::new(
        provider,
        store.clone(),
        reconciler,
        MessageQuery::unread_with_subject(&config.mail.subject_filter),
    ));

    let state = AppState::new(orchestrator, store, cache_dir);
    commissary_server::serve(state, config.server.port)
        .await
        .context("running HTTP server")?;

    Ok(())
}
