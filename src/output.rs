//! Output types: per-reference outcomes and run statistics.

use crate::error::SkipReason;
use serde::{Deserialize, Serialize};

/// Result of relocating one document.
#[derive(Debug, Clone, Serialize)]
pub struct RelocationOutput {
    /// The rewritten document content. Byte-identical to the input outside
    /// replaced reference spans.
    pub content: String,

    /// One entry per scanned reference, in document order.
    pub references: Vec<ReferenceOutcome>,

    /// Aggregate counters for the run.
    pub stats: RelocationStats,
}

/// What happened to one image reference.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceOutcome {
    /// Alt text captured between the brackets, unmodified.
    pub alt_text: String,

    /// Raw target captured between the parentheses, unmodified.
    pub target: String,

    /// Final status for this reference.
    pub status: ReferenceStatus,
}

/// Per-reference status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceStatus {
    /// Local asset uploaded; reference rewritten to `public_url`.
    Replaced { public_url: String },

    /// Target already points at an http/https address; left untouched.
    Remote,

    /// Local reference left untouched for a non-fatal reason.
    Skipped { reason: SkipReason },
}

/// Aggregate statistics for a relocation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RelocationStats {
    /// References found by the scanner.
    pub total_references: usize,
    /// References uploaded and rewritten.
    pub replaced: usize,
    /// References already remote, left untouched.
    pub remote: usize,
    /// Local references whose resolved asset does not exist.
    pub missing_assets: usize,
    /// Local references whose upload was rejected or unreadable.
    pub failed_uploads: usize,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
}

impl RelocationOutput {
    /// True when every scanned reference was either replaced or already
    /// remote — nothing was skipped for a recoverable reason.
    pub fn is_complete(&self) -> bool {
        self.stats.missing_assets == 0 && self.stats.failed_uploads == 0
    }
}
