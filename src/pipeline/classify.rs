//! Reference classification: decide which references need relocation.
//!
//! A reference whose target already begins with an `http://` or `https://`
//! scheme is remote and left untouched. Everything else is a local asset
//! candidate: absolute paths are used verbatim, relative ones resolve
//! against the directory containing the source document. The scheme check
//! is case-sensitive on purpose — `HTTP://…` is not a scheme this pipeline
//! recognises and is treated as a (doomed) local path, matching the
//! scanner's no-normalisation rule.
//!
//! Existence of the resolved path is *not* checked here; the orchestrator
//! does that so the skip can be recorded as a per-reference outcome.

use crate::pipeline::scan::ImageReference;
use std::path::{Path, PathBuf};

/// Where a reference's target points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetClass {
    /// Already an http/https address; no relocation needed.
    Remote,
    /// Candidate local asset, resolved to a filesystem path.
    Local(PathBuf),
}

/// True when the target carries a recognised remote scheme.
pub fn is_remote(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// Classify one reference, resolving local targets against `document_dir`.
pub fn classify(reference: &ImageReference, document_dir: &Path) -> TargetClass {
    if is_remote(&reference.target) {
        return TargetClass::Remote;
    }

    let target = Path::new(&reference.target);
    let resolved = if target.is_absolute() {
        target.to_path_buf()
    } else {
        document_dir.join(target)
    };
    TargetClass::Local(resolved)
}
