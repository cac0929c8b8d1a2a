//! Route handler functions for all API endpoints.
//!
//! Each handler extracts query/path parameters via axum extractors,
//! drives the pipeline through `AppState`, and returns JSON responses.

use std::path::PathBuf;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::info;

use commissary_core::{
    IngestOptions, IngestReport, IntakeRecord, ReconcileStatus, ReconcileSummary,
    placeholder_png, write_placeholder,
};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FetchEmailsParams {
    /// Also ingest messages already marked read.
    #[serde(default, rename = "processRead", alias = "process_read")]
    pub process_read: bool,
    /// Skip ingestion entirely and reconcile the cache for every stored
    /// record instead.
    #[serde(default, rename = "reprocessDb", alias = "reprocess_db")]
    pub reprocess_db: bool,
}

#[derive(Debug, Deserialize)]
pub struct ImageParams {
    /// Synthesize a placeholder on demand when the file is absent.
    #[serde(default)]
    pub create: bool,
}

#[derive(Debug, Serialize)]
pub struct ReprocessResponse {
    pub ok: bool,
    pub action: ReconcileStatus,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /records
///
/// Lists every stored commission record, newest start date first.
pub async fn records(
    State(state): State<AppState>,
) -> Result<Json<Vec<IntakeRecord>>, ApiError> {
    let records = state.store.list_records().await?;
    Ok(Json(records))
}

/// POST /reprocess/{id}
///
/// Re-runs cache reconciliation for one stored record.
pub async fn reprocess(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReprocessResponse>, ApiError> {
    info!(id, "reprocess requested");
    let outcome = state.orchestrator.reprocess(&id).await?;

    Ok(Json(ReprocessResponse {
        ok: true,
        action: outcome.status,
        path: outcome.path.display().to_string(),
    }))
}

/// GET /reprocess-all
///
/// Reconciles the cache for every stored record and the critical
/// default images.
pub async fn reprocess_all(
    State(state): State<AppState>,
) -> Result<Json<ReconcileSummary>, ApiError> {
    info!("full cache reconcile requested");
    let summary = state.orchestrator.reconcile_all().await?;
    Ok(Json(summary))
}

/// Either outcome of a fetch-emails run.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FetchEmailsResponse {
    Ingested(IngestReport),
    Reconciled(ReconcileSummary),
}

/// GET /fetch-emails
///
/// Runs an ingestion batch, or a pure cache reconcile when
/// `reprocessDb=true`.
pub async fn fetch_emails(
    State(state): State<AppState>,
    Query(params): Query<FetchEmailsParams>,
) -> Result<Json<FetchEmailsResponse>, ApiError> {
    if params.reprocess_db {
        info!("fetch-emails run substituted with full reconcile");
        let summary = state.orchestrator.reconcile_all().await?;
        return Ok(Json(FetchEmailsResponse::Reconciled(summary)));
    }

    info!(include_read = params.process_read, "ingestion batch requested");
    let report = state
        .orchestrator
        .ingest_batch(IngestOptions {
            include_read: params.process_read,
        })
        .await?;
    Ok(Json(FetchEmailsResponse::Ingested(report)))
}

/// GET /images/{filename}
///
/// Serves a cached image by filename. With `create=true`, an absent
/// file is backfilled with a placeholder and served.
pub async fn image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Query(params): Query<ImageParams>,
) -> Result<Response, ApiError> {
    let path = resolve_image_path(&state.cache_dir, &filename)?;

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(png_response(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            if params.create {
                if !write_placeholder(&path) {
                    return Err(ApiError::Internal(format!(
                        "could not write placeholder for {filename}"
                    )));
                }
                info!(filename, "served on-demand placeholder");
                return Ok(png_response(placeholder_png().to_vec()));
            }
            Err(ApiError::NotFound(format!("no cached image {filename}")))
        }
        Err(err) => Err(ApiError::Internal(err.to_string())),
    }
}

/// Confines the requested filename to the cache directory.
fn resolve_image_path(cache_dir: &std::path::Path, filename: &str) -> Result<PathBuf, ApiError> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(ApiError::BadRequest(format!(
            "invalid image filename {filename:?}"
        )));
    }
    Ok(cache_dir.join(filename))
}

fn png_response(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
}
