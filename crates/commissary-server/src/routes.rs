//! Router setup and server entry point.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::state::AppState;

/// Creates the axum Router with all routes and middleware.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/records", get(handlers::records))
        .route("/reprocess/{id}", post(handlers::reprocess))
        .route("/reprocess-all", get(handlers::reprocess_all))
        .route("/fetch-emails", get(handlers::fetch_emails))
        .route("/images/{filename}", get(handlers::image))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the listener and serves requests until the process exits.
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server loop
/// fails.
pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!(port, "listening");
    axum::serve(listener, router).await
}
