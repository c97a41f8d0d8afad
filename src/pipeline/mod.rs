//! Pipeline stages for Markdown image relocation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different content host) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! scan ──▶ classify ──▶ upload ──▶ rewrite
//! (regex)  (remote vs   (content   (offset-based
//!           local path)  host PUT)  splice)
//! ```
//!
//! 1. [`scan`]     — find `![alt](target)` references with exact byte spans
//! 2. [`classify`] — split remote targets from local asset paths
//! 3. [`upload`]   — push each local asset to the host; the only stage
//!    with network I/O
//! 4. [`rewrite`]  — splice the uploaded addresses into a new document

pub mod classify;
pub mod rewrite;
pub mod scan;
pub mod upload;
