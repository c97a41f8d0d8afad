//! Error types for the md2hub library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`RelocateError`] — **Fatal**: the run cannot proceed at all (document
//!   unreadable, destination repository missing, malformed bundle). Returned
//!   as `Err(RelocateError)` from the top-level `relocate*` functions.
//!
//! * [`SkipReason`] — **Non-fatal**: a single image reference could not be
//!   relocated (asset file missing, upload rejected) but every other
//!   reference is fine. Stored inside [`crate::output::ReferenceOutcome`]
//!   so callers can inspect partial success rather than losing the whole
//!   document to one bad image.
//!
//! The separation lets callers decide their own tolerance: abort on the
//! first skipped reference, log and continue, or collect all skips for a
//! post-run report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md2hub library.
///
/// Per-reference failures use [`SkipReason`] and are stored in
/// [`crate::output::ReferenceOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum RelocateError {
    // ── Document errors ───────────────────────────────────────────────────
    /// The source document was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    DocumentNotFound { path: PathBuf },

    /// Process does not have read permission on the document.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The document exists but reading it failed.
    #[error("Failed to read document '{path}': {source}")]
    DocumentReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the rewritten output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Destination errors ────────────────────────────────────────────────
    /// The destination repository does not exist or the credential cannot
    /// see it. `GET /repos/{owner}/{repo}` answered 404.
    #[error(
        "Repository {owner}/{repo} not found.\n\
         Check that it exists and is accessible with your token."
    )]
    DestinationNotFound { owner: String, repo: String },

    /// The destination accessibility check failed with a non-404 error
    /// (bad credential, rate limit, transport failure).
    #[error("Failed to access repository {owner}/{repo}: {detail}")]
    DestinationCheckFailed {
        owner: String,
        repo: String,
        detail: String,
    },

    // ── Bundle errors ─────────────────────────────────────────────────────
    /// The uploaded archive could not be opened or decoded.
    #[error("Failed to extract bundle '{path}': {detail}")]
    BundleInvalid { path: PathBuf, detail: String },

    /// An archive entry would escape the extraction directory.
    #[error("Bundle entry '{name}' resolves outside the extraction directory")]
    UnsafeBundleEntry { name: String },

    /// The bundle contained no Markdown document to process.
    #[error("No Markdown document found in the bundle")]
    NoDocumentInBundle,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal reason why one image reference was left unreplaced.
///
/// Stored in [`crate::output::ReferenceOutcome`] when a reference is
/// skipped. The overall run still reports success.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum SkipReason {
    /// The resolved local asset path does not exist on disk.
    #[error("Image file not found: '{path}'")]
    AssetMissing { path: PathBuf },

    /// The asset exists but reading its bytes failed.
    #[error("Failed to read image '{path}': {detail}")]
    AssetUnreadable { path: PathBuf, detail: String },

    /// The content host rejected the upload for this asset.
    #[error("Upload failed for '{path}': {detail}")]
    UploadRejected { path: PathBuf, detail: String },
}
