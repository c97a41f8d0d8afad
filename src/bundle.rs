//! Bundle ingestion: extract an uploaded ZIP archive into an isolated
//! directory and locate the document to process.
//!
//! Every entry's name is validated with [`zip`]'s `enclosed_name` before a
//! single byte is written: an entry whose resolved path would escape the
//! extraction directory (`../`, absolute paths) aborts the whole
//! extraction. A malformed bundle is a fatal, caller-visible error — there
//! is no partial extraction to continue from.

use crate::error::RelocateError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Extract `zip_path` into `dest_dir`, returning the extracted file paths.
///
/// Directories inside the archive are created but not returned. Entries
/// that would resolve outside `dest_dir` fail the extraction with
/// [`RelocateError::UnsafeBundleEntry`].
pub fn extract_bundle(zip_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, RelocateError> {
    let file = File::open(zip_path).map_err(|e| RelocateError::BundleInvalid {
        path: zip_path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut archive = ZipArchive::new(file).map_err(|e| RelocateError::BundleInvalid {
        path: zip_path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| RelocateError::BundleInvalid {
                path: zip_path.to_path_buf(),
                detail: e.to_string(),
            })?;

        // enclosed_name rejects `..` components and absolute paths.
        let Some(relative) = entry.enclosed_name() else {
            return Err(RelocateError::UnsafeBundleEntry {
                name: entry.name().to_string(),
            });
        };
        let out_path = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| RelocateError::BundleInvalid {
                path: zip_path.to_path_buf(),
                detail: e.to_string(),
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RelocateError::BundleInvalid {
                path: zip_path.to_path_buf(),
                detail: e.to_string(),
            })?;
        }

        let mut out = File::create(&out_path).map_err(|e| RelocateError::BundleInvalid {
            path: zip_path.to_path_buf(),
            detail: e.to_string(),
        })?;
        std::io::copy(&mut entry, &mut out).map_err(|e| RelocateError::BundleInvalid {
            path: zip_path.to_path_buf(),
            detail: e.to_string(),
        })?;

        extracted.push(out_path);
    }

    debug!(
        "Extracted {} files from {} into {}",
        extracted.len(),
        zip_path.display(),
        dest_dir.display()
    );
    Ok(extracted)
}

/// Pick the document to process: the first `.md` file among the extracted
/// paths (case-insensitive extension match), in extraction order.
pub fn find_document(paths: &[PathBuf]) -> Option<&PathBuf> {
    paths.iter().find(|p| {
        p.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("md"))
            .unwrap_or(false)
    })
}
