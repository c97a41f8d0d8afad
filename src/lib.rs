//! # md2hub
//!
//! Relocate local image references in Markdown documents to a
//! GitHub-backed content host.
//!
//! ## Why this crate?
//!
//! A Markdown document written locally references images by filesystem
//! path — `![diagram](img/arch.png)` — which breaks the moment the
//! document leaves the machine. This crate uploads each locally-referenced
//! image to a GitHub repository and rewrites the document so every
//! reference points at a stable public address (a jsDelivr CDN URL by
//! default), without touching a single byte outside the rewritten
//! references.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Scan      find ![alt](target) references with exact byte spans
//!  ├─ 2. Classify  remote URL? leave it — local path? resolve it
//!  ├─ 3. Upload    PUT each asset to the host, one at a time
//!  └─ 4. Rewrite   splice public URLs in at the recorded spans
//! ```
//!
//! References are processed sequentially in document order. A missing
//! asset or a rejected upload skips that one reference; only document I/O
//! and destination errors abort the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2hub::{relocate, DestinationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DestinationConfig::builder()
//!         .token(std::env::var("MD2HUB_TOKEN")?)
//!         .owner("acme")
//!         .repo("assets")
//!         .build()?;
//!     let output = relocate("notes.md", &config).await?;
//!     println!("{}", output.content);
//!     eprintln!("replaced {} of {} references",
//!         output.stats.replaced,
//!         output.stats.total_references);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `md2hub` binary (clap + anyhow + indicatif) |
//! | `server` | on      | HTTP front end: upload a ZIP bundle, download the result (axum) |
//!
//! Disable both when using only the library:
//! ```toml
//! md2hub = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod bundle;
pub mod config;
pub mod error;
pub mod host;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod relocate;

#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DestinationConfig, DestinationConfigBuilder};
pub use error::{RelocateError, SkipReason};
pub use host::{ContentHost, GitHubHost, HostError, PutObject, PutOutcome};
pub use output::{ReferenceOutcome, ReferenceStatus, RelocationOutput, RelocationStats};
pub use pipeline::scan::{scan_references, ImageReference};
pub use progress::{NoopProgress, ProgressCallback, RelocationProgress};
pub use relocate::{processed_path, relocate, relocate_sync, relocate_to_file};
