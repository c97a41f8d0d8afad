//! Document rewriting: splice uploaded addresses into the original text.
//!
//! Replacement is **offset-based**, not textual. Each replacement is
//! applied at the exact byte span the scanner recorded, so two references
//! that render identical literal text (same alt, same target) are each
//! rewritten at their own position — a textual first-occurrence search
//! would hit the same spot twice. Pairs are processed in reverse document
//! order so edits never shift the offsets of spans still to be applied.
//!
//! Everything outside the replaced spans is byte-identical to the input;
//! the input itself is never mutated.

use crate::pipeline::scan::ImageReference;

/// Produce a new document with each `(reference, public_url)` pair's span
/// replaced by `![alt](public_url)`.
///
/// Spans must come from a scan of this same `content` (non-overlapping,
/// in-bounds); the pairs may be passed in any order.
pub fn rewrite_document(content: &str, replacements: &[(ImageReference, String)]) -> String {
    let mut ordered: Vec<&(ImageReference, String)> = replacements.iter().collect();
    // Highest span first: earlier spans stay valid while later ones change.
    ordered.sort_by(|a, b| b.0.span_start.cmp(&a.0.span_start));

    let mut out = content.to_string();
    for (reference, public_url) in ordered {
        out.replace_range(
            reference.span_start..reference.span_end,
            &reference.with_target(public_url),
        );
    }
    out
}
