//! Content-host protocol: the trait seam and its GitHub implementation.
//!
//! The uploader never talks HTTP directly — it goes through [`ContentHost`],
//! an object-safe async trait covering the two operations the pipeline
//! needs: verify that the destination repository is reachable, and create
//! one object under a path. Tests inject an in-memory implementation via
//! [`crate::config::DestinationConfig::host`]; production uses
//! [`GitHubHost`], which speaks the GitHub contents API over [`reqwest`].

use crate::config::DestinationConfig;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default API base for [`GitHubHost`]. Overridable for self-hosted
/// instances via [`GitHubHost::with_api_base`].
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// One object-creation request against the host.
#[derive(Debug)]
pub struct PutObject<'a> {
    /// Path of the object inside the repository, e.g. `images/17123.png`.
    pub path: &'a str,
    /// Raw object bytes. The host implementation handles wire encoding.
    pub content: &'a [u8],
    /// Commit message recorded by the host.
    pub message: &'a str,
}

/// Host response to a [`PutObject`] request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// Object was created. `download_url` is the host's own reported
    /// address, when it supplied one.
    Created { download_url: Option<String> },
    /// The object already exists (HTTP 422 on GitHub). Acceptable only for
    /// the directory-bootstrap sentinel.
    AlreadyExists,
}

/// Errors from a [`ContentHost`] operation.
///
/// The uploader maps these onto the fatal/per-asset taxonomy: a `NotFound`
/// from `verify_destination` is fatal configuration, everything during an
/// object PUT is per-asset recoverable.
#[derive(Debug, Error)]
pub enum HostError {
    /// The repository does not exist or is invisible to the credential.
    #[error("repository not found")]
    NotFound,

    /// The host answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Transport-level failure (DNS, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The host answered 2xx but the body could not be decoded.
    #[error("unexpected response shape: {0}")]
    InvalidResponse(String),
}

/// Remote storage the uploader writes assets into.
///
/// Implementations must be `Send + Sync`; the pipeline holds them behind
/// `Arc<dyn ContentHost>`.
#[async_trait]
pub trait ContentHost: Send + Sync {
    /// Check that the destination repository exists and the credential can
    /// reach it. Called at most once per run, before the first upload.
    async fn verify_destination(&self) -> Result<(), HostError>;

    /// Create one object. Must answer [`PutOutcome::AlreadyExists`] rather
    /// than an error when the host reports the path is already taken.
    async fn put_object(&self, req: PutObject<'_>) -> Result<PutOutcome, HostError>;
}

// ── GitHub implementation ─────────────────────────────────────────────────

/// [`ContentHost`] backed by the GitHub contents API.
///
/// * `GET /repos/{owner}/{repo}` — destination check (200 expected,
///   404 → [`HostError::NotFound`]).
/// * `PUT /repos/{owner}/{repo}/contents/{path}` — object creation with a
///   JSON body `{message, content (base64), branch}` (201 expected,
///   422 → [`PutOutcome::AlreadyExists`]).
///
/// Authorization uses the `token` scheme GitHub accepts for personal
/// access tokens. GitHub rejects requests without a User-Agent, so the
/// client sets one from the crate name and version.
pub struct GitHubHost {
    client: reqwest::Client,
    api_base: String,
    token: String,
    owner: String,
    repo: String,
    branch: String,
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: Option<ContentsEntry>,
}

#[derive(Deserialize)]
struct ContentsEntry {
    download_url: Option<String>,
}

impl GitHubHost {
    /// Build a host from the destination configuration.
    pub fn new(config: &DestinationConfig) -> Result<Self, HostError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("md2hub/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.upload_timeout_secs))
            .build()
            .map_err(|e| HostError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_base: GITHUB_API_BASE.to_string(),
            token: config.token.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
        })
    }

    /// Point the host at a different API base URL (GitHub Enterprise,
    /// local stub).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn repo_url(&self) -> String {
        format!("{}/repos/{}/{}", self.api_base, self.owner, self.repo)
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/contents/{}", self.repo_url(), path)
    }

    fn auth_value(&self) -> String {
        format!("token {}", self.token)
    }
}

#[async_trait]
impl ContentHost for GitHubHost {
    async fn verify_destination(&self) -> Result<(), HostError> {
        let url = self.repo_url();
        debug!("Checking destination repository: {}", url);

        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.auth_value())
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| HostError::Transport(e.to_string()))?;

        match resp.status().as_u16() {
            200 => Ok(()),
            404 => Err(HostError::NotFound),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(HostError::Status { status, body })
            }
        }
    }

    async fn put_object(&self, req: PutObject<'_>) -> Result<PutOutcome, HostError> {
        let url = self.contents_url(req.path);
        let body = serde_json::json!({
            "message": req.message,
            "content": STANDARD.encode(req.content),
            "branch": self.branch,
        });

        debug!("PUT {} ({} bytes raw)", url, req.content.len());

        let resp = self
            .client
            .put(&url)
            .header("Authorization", self.auth_value())
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await
            .map_err(|e| HostError::Transport(e.to_string()))?;

        match resp.status().as_u16() {
            201 => {
                let parsed: ContentsResponse = resp
                    .json()
                    .await
                    .map_err(|e| HostError::InvalidResponse(e.to_string()))?;
                Ok(PutOutcome::Created {
                    download_url: parsed.content.and_then(|c| c.download_url),
                })
            }
            422 => Ok(PutOutcome::AlreadyExists),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(HostError::Status { status, body })
            }
        }
    }
}
