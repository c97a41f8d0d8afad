//! Relocation entry points: orchestrate scan → classify → upload → rewrite
//! over one document.
//!
//! The document is read once; all edits produce a new byte sequence and
//! the input file is never mutated. References are processed sequentially
//! in document order — uploads block the pipeline until they complete,
//! which keeps the uploader's one-shot flags trivially correct.
//!
//! Per-reference failures (missing asset, rejected upload) are recorded
//! and skipped; only document I/O and destination/configuration errors
//! abort the run.

use crate::config::DestinationConfig;
use crate::error::{RelocateError, SkipReason};
use crate::host::{ContentHost, GitHubHost};
use crate::output::{ReferenceOutcome, ReferenceStatus, RelocationOutput, RelocationStats};
use crate::pipeline::{classify, rewrite, scan, upload};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Relocate every eligible image reference in one document.
///
/// This is the primary entry point for the library. The rewritten content
/// is returned in memory; use [`relocate_to_file`] to write it to disk.
///
/// # Errors
/// Returns `Err(RelocateError)` only for fatal errors:
/// - document not found / unreadable
/// - destination repository missing or unreachable
/// - invalid configuration
///
/// A run where every reference was skipped still returns `Ok` — check
/// [`RelocationOutput::is_complete`] and the per-reference outcomes.
pub async fn relocate(
    document_path: impl AsRef<Path>,
    config: &DestinationConfig,
) -> Result<RelocationOutput, RelocateError> {
    let start = Instant::now();
    let document_path = document_path.as_ref();
    info!("Relocating images in: {}", document_path.display());

    // ── Step 1: Read the document once ───────────────────────────────────
    let content = read_document(document_path)?;
    let document_dir = document_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    // ── Step 2: Scan for references ──────────────────────────────────────
    let references = scan::scan_references(&content);
    let total = references.len();
    debug!("Found {} image references", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    // ── Step 3: Classify and upload, sequentially in document order ──────
    let host = resolve_host(config)?;
    let mut uploader = upload::Uploader::new(host, config);

    let mut outcomes: Vec<ReferenceOutcome> = Vec::with_capacity(total);
    let mut replacements: Vec<(scan::ImageReference, String)> = Vec::new();
    let mut stats = RelocationStats {
        total_references: total,
        ..Default::default()
    };

    for (i, reference) in references.into_iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_reference_start(index, total, &reference.target);
        }

        let status = match classify::classify(&reference, &document_dir) {
            classify::TargetClass::Remote => {
                debug!("Skipping remote reference: {}", reference.target);
                stats.remote += 1;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_reference_skipped(index, total, "already remote");
                }
                ReferenceStatus::Remote
            }
            classify::TargetClass::Local(path) if !path.exists() => {
                warn!("Image file not found: {}", path.display());
                stats.missing_assets += 1;
                let reason = SkipReason::AssetMissing { path };
                if let Some(ref cb) = config.progress_callback {
                    cb.on_reference_skipped(index, total, &reason.to_string());
                }
                ReferenceStatus::Skipped { reason }
            }
            classify::TargetClass::Local(path) => {
                // Fatal if the destination is missing or unreachable; the
                // check runs once, before the first upload attempt.
                uploader.verify_destination().await?;

                match uploader.upload(&path).await {
                    Ok(asset) => {
                        stats.replaced += 1;
                        if let Some(ref cb) = config.progress_callback {
                            cb.on_reference_replaced(index, total, &asset.public_url);
                        }
                        replacements.push((reference.clone(), asset.public_url.clone()));
                        ReferenceStatus::Replaced {
                            public_url: asset.public_url,
                        }
                    }
                    Err(reason) => {
                        warn!("Failed to upload {}: {}", path.display(), reason);
                        stats.failed_uploads += 1;
                        if let Some(ref cb) = config.progress_callback {
                            cb.on_reference_skipped(index, total, &reason.to_string());
                        }
                        ReferenceStatus::Skipped { reason }
                    }
                }
            }
        };

        outcomes.push(ReferenceOutcome {
            alt_text: reference.alt_text.clone(),
            target: reference.target.clone(),
            status,
        });
    }

    // ── Step 4: Rewrite ──────────────────────────────────────────────────
    let content = rewrite::rewrite_document(&content, &replacements);

    stats.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Relocation complete: {}/{} references replaced in {}ms",
        stats.replaced, total, stats.duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, stats.replaced);
    }

    Ok(RelocationOutput {
        content,
        references: outcomes,
        stats,
    })
}

/// Relocate a document and write the rewritten content to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn relocate_to_file(
    document_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &DestinationConfig,
) -> Result<RelocationStats, RelocateError> {
    let output = relocate(document_path, config).await?;
    let path = output_path.as_ref();
    write_output(path, &output.content).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`relocate`].
///
/// Creates a temporary tokio runtime internally.
pub fn relocate_sync(
    document_path: impl AsRef<Path>,
    config: &DestinationConfig,
) -> Result<RelocationOutput, RelocateError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| RelocateError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(relocate(document_path, config))
}

/// Derive the default output path: `<stem>-processed.<ext>` next to the
/// input document.
pub fn processed_path(document_path: &Path) -> PathBuf {
    let stem = document_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match document_path.extension() {
        Some(ext) => format!("{stem}-processed.{}", ext.to_string_lossy()),
        None => format!("{stem}-processed"),
    };
    document_path.with_file_name(name)
}

/// Write rewritten content atomically (temp file + rename).
pub async fn write_output(path: &Path, content: &str) -> Result<(), RelocateError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RelocateError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, content)
        .await
        .map_err(|e| RelocateError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| RelocateError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn read_document(path: &Path) -> Result<String, RelocateError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(RelocateError::DocumentNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(RelocateError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(RelocateError::DocumentReadFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Resolve the content host: a pre-built host from the config takes
/// precedence (tests, custom middleware); otherwise construct the
/// GitHub host from the destination coordinates.
fn resolve_host(config: &DestinationConfig) -> Result<Arc<dyn ContentHost>, RelocateError> {
    if let Some(ref host) = config.host {
        return Ok(Arc::clone(host));
    }
    let host = GitHubHost::new(config)
        .map_err(|e| RelocateError::Internal(format!("failed to build HTTP client: {e}")))?;
    Ok(Arc::new(host))
}
