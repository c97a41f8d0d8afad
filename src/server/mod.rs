//! HTTP front end: upload a ZIP bundle, download the processed document.
//!
//! ## Endpoints
//!
//! - `GET /health` — liveness check
//! - `POST /upload` — multipart ZIP bundle in, [`handlers::ProcessResponse`] out
//! - `GET /download?file=…` — stream a processed document as an attachment
//!
//! Every upload gets its own run directory inside the process workspace,
//! keyed by a nanosecond run id, so concurrent uploads never share
//! extraction state. The download endpoint only serves paths inside the
//! workspace.

pub mod handlers;

use crate::config::DestinationConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// State shared across all handlers.
pub struct AppState {
    /// Destination configuration applied to every run.
    pub config: DestinationConfig,
    /// Root directory for per-run workspaces. Owned by the caller (the
    /// binary keeps a `TempDir` alive for the process lifetime).
    pub workspace: PathBuf,
}

/// Start the HTTP server on the given address. Runs until the process
/// exits.
pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> std::io::Result<()> {
    use axum::routing::{get, post};
    use axum::Router;
    use tower_http::trace::TraceLayer;

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/upload", post(handlers::upload))
        .route("/download", get(handlers::download))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("md2hub server listening on http://{}", addr);
    axum::serve(listener, app)
        .await
        .map_err(std::io::Error::other)
}
