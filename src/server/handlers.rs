//! Request handlers for the web front end.

use super::AppState;
use crate::error::RelocateError;
use crate::{bundle, relocate};
use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

/// Structured outcome returned for every upload, success or not.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    /// File name of the document found in the bundle.
    pub original_file: Option<String>,
    /// Server-side path of the rewritten document, usable with
    /// `GET /download?file=…`.
    pub processed_file: Option<String>,
    /// Number of references relocated.
    pub replaced_count: usize,
    /// False only for fatal errors; partial relocation is still success.
    pub success: bool,
    /// Human-readable detail when `success` is false.
    pub error: Option<String>,
}

impl ProcessResponse {
    fn failure(detail: impl Into<String>) -> Self {
        Self {
            original_file: None,
            processed_file: None,
            replaced_count: 0,
            success: false,
            error: Some(detail.into()),
        }
    }
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// `POST /upload` — accept one multipart ZIP bundle and run the pipeline
/// on the first Markdown document inside it.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> (StatusCode, Json<ProcessResponse>) {
    // Locate the bundle part: the first field carrying a .zip filename.
    let (filename, bytes) = loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let Some(name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                if !name.to_lowercase().ends_with(".zip") {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ProcessResponse::failure("Only ZIP bundles are supported")),
                    );
                }
                match field.bytes().await {
                    Ok(bytes) => break (name, bytes),
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(ProcessResponse::failure(format!(
                                "Failed to read uploaded bundle: {e}"
                            ))),
                        )
                    }
                }
            }
            Ok(None) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ProcessResponse::failure("No ZIP bundle in request")),
                )
            }
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ProcessResponse::failure(format!(
                        "Failed to parse multipart form: {e}"
                    ))),
                )
            }
        }
    };

    info!("Received bundle '{}' ({} bytes)", filename, bytes.len());

    match process_bundle(&state, &filename, &bytes).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            error!("Bundle processing failed: {}", e);
            let status = match e {
                RelocateError::BundleInvalid { .. }
                | RelocateError::UnsafeBundleEntry { .. }
                | RelocateError::NoDocumentInBundle => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(ProcessResponse::failure(e.to_string())))
        }
    }
}

/// Save, extract, and relocate one uploaded bundle inside its own run
/// directory.
async fn process_bundle(
    state: &AppState,
    filename: &str,
    bytes: &[u8],
) -> Result<ProcessResponse, RelocateError> {
    let run_dir = state.workspace.join(format!("run-{}", run_id()));
    let extract_dir = run_dir.join("extract");
    tokio::fs::create_dir_all(&extract_dir)
        .await
        .map_err(|e| RelocateError::Internal(format!("failed to create run directory: {e}")))?;

    let zip_path = run_dir.join("bundle.zip");
    tokio::fs::write(&zip_path, bytes)
        .await
        .map_err(|e| RelocateError::Internal(format!("failed to save bundle: {e}")))?;

    // zip extraction is synchronous I/O; keep it off the async executor.
    let extracted = {
        let zip_path = zip_path.clone();
        let extract_dir = extract_dir.clone();
        tokio::task::spawn_blocking(move || bundle::extract_bundle(&zip_path, &extract_dir))
            .await
            .map_err(|e| RelocateError::Internal(format!("extraction task panicked: {e}")))??
    };

    let document = bundle::find_document(&extracted)
        .ok_or(RelocateError::NoDocumentInBundle)?
        .clone();
    info!(
        "Bundle '{}': processing document {}",
        filename,
        document.display()
    );

    let output_path = relocate::processed_path(&document);
    let stats = relocate::relocate_to_file(&document, &output_path, &state.config).await?;

    Ok(ProcessResponse {
        original_file: document
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
        processed_file: Some(output_path.to_string_lossy().into_owned()),
        replaced_count: stats.replaced,
        success: true,
        error: None,
    })
}

/// Query parameters for `GET /download`.
#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    /// Server-side path previously returned in `processed_file`.
    pub file: String,
}

/// `GET /download?file=…` — stream a processed document back as an
/// attachment. Only paths inside the server workspace are served; anything
/// else answers 404, so the endpoint never confirms whether a path outside
/// the workspace exists.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DownloadParams>,
) -> impl IntoResponse {
    let requested = PathBuf::from(&params.file);

    if !is_within(&state.workspace, &requested) {
        warn!("Rejected download outside workspace: {}", params.file);
        return (StatusCode::NOT_FOUND, "file not found").into_response();
    }

    let Ok(content) = tokio::fs::read(&requested).await else {
        return (StatusCode::NOT_FOUND, "file not found").into_response();
    };

    let attachment_name = requested
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.md".to_string());

    (
        [
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{attachment_name}\""),
            ),
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
        ],
        content,
    )
        .into_response()
}

/// True when `candidate` resolves to a path under `base`. Both sides are
/// canonicalised so `..` segments and symlinks cannot escape.
fn is_within(base: &Path, candidate: &Path) -> bool {
    let (Ok(base), Ok(candidate)) = (base.canonicalize(), candidate.canonicalize()) else {
        return false;
    };
    candidate.starts_with(&base)
}

fn run_id() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}
