//! Reference scanning: find image references in document text.
//!
//! The scanner recognises the inline image form `![alt](target)` and
//! nothing else. It is deliberately not a Markdown parser — no code fences,
//! no link-reference definitions, no nesting. Matching is lazy but still
//! completes: alt text ends at the first `]` that is followed by `(`, so a
//! bare `]` inside the alt is consumed into it, and the target ends at the
//! first `)`. Captured text is returned verbatim, whitespace included,
//! together with exact byte offsets so the rewriter can splice replacements
//! without touching surrounding bytes.
//!
//! `.` in the pattern does not match `\n`, so a reference never spans
//! lines.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").unwrap());

/// One image reference found in a document.
///
/// `span_start..span_end` are byte offsets into the scanned content
/// delimiting the full matched text `![alt](target)`. Spans from one scan
/// are non-overlapping and ordered by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageReference {
    /// Text between the brackets, unmodified.
    pub alt_text: String,
    /// Raw string between the parentheses, unmodified. May be a URL or a
    /// relative/absolute local path.
    pub target: String,
    /// Byte offset of the `!` opening the reference.
    pub span_start: usize,
    /// Byte offset one past the closing `)`.
    pub span_end: usize,
}

impl ImageReference {
    /// Render this reference with a different target.
    pub fn with_target(&self, target: &str) -> String {
        format!("![{}]({})", self.alt_text, target)
    }
}

/// Scan document content for image references, in order of occurrence.
///
/// Pure function of `content`: scanning the same text twice yields the
/// same references.
pub fn scan_references(content: &str) -> Vec<ImageReference> {
    RE_IMAGE
        .captures_iter(content)
        .map(|caps| {
            let whole = caps.get(0).unwrap();
            ImageReference {
                alt_text: caps[1].to_string(),
                target: caps[2].to_string(),
                span_start: whole.start(),
                span_end: whole.end(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_has_no_references() {
        assert!(scan_references("").is_empty());
        assert!(scan_references("plain text, [link](x) but no image").is_empty());
    }

    #[test]
    fn captures_alt_target_and_offsets() {
        let doc = "before ![logo](img/logo.png) after";
        let refs = scan_references(doc);
        assert_eq!(refs.len(), 1);
        let r = &refs[0];
        assert_eq!(r.alt_text, "logo");
        assert_eq!(r.target, "img/logo.png");
        assert_eq!(&doc[r.span_start..r.span_end], "![logo](img/logo.png)");
        assert_eq!(r.span_start, 7);
    }

    #[test]
    fn references_come_back_in_document_order() {
        let doc = "![a](1.png)\ntext\n![b](2.png) ![c](3.png)";
        let refs = scan_references(doc);
        assert_eq!(refs.len(), 3);
        assert!(refs[0].span_start < refs[1].span_start);
        assert!(refs[1].span_end <= refs[2].span_start);
        assert_eq!(refs[2].target, "3.png");
    }

    #[test]
    fn lazy_alt_consumes_bracket_not_followed_by_paren() {
        // `]b` is not a delimiter position; the lazy capture expands past
        // it and the alt carries the bracket.
        let refs = scan_references("![a]b](x.png)");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].alt_text, "a]b");
        assert_eq!(refs[0].target, "x.png");
    }

    #[test]
    fn target_ends_at_first_closing_paren() {
        let refs = scan_references("![a](x(1).png)");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].target, "x(1");
    }

    #[test]
    fn whitespace_is_preserved_verbatim() {
        let refs = scan_references("![ padded alt ]( spaced target.png )");
        assert_eq!(refs[0].alt_text, " padded alt ");
        assert_eq!(refs[0].target, " spaced target.png ");
    }

    #[test]
    fn empty_alt_and_empty_target_match() {
        let refs = scan_references("![]()");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].alt_text, "");
        assert_eq!(refs[0].target, "");
    }

    #[test]
    fn does_not_match_across_lines() {
        assert!(scan_references("![alt\n](x.png)").is_empty());
        assert!(scan_references("![alt](x\n.png)").is_empty());
    }

    #[test]
    fn offsets_are_byte_offsets_with_multibyte_text() {
        let doc = "héllo ![é](ünïcode.png)";
        let refs = scan_references(doc);
        assert_eq!(refs.len(), 1);
        let r = &refs[0];
        assert_eq!(&doc[r.span_start..r.span_end], "![é](ünïcode.png)");
    }

    #[test]
    fn with_target_reconstructs_reference_text() {
        let r = ImageReference {
            alt_text: "logo".into(),
            target: "old.png".into(),
            span_start: 0,
            span_end: 0,
        };
        assert_eq!(r.with_target("https://cdn/x.png"), "![logo](https://cdn/x.png)");
    }
}
