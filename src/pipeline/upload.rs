//! Asset upload: push one local file to the content host.
//!
//! The [`Uploader`] owns all run-scoped upload state:
//!
//! * `destination_verified` — the repository accessibility check runs at
//!   most once per run, before the first upload. A 404 there is a fatal
//!   configuration error; no upload is ever attempted after it.
//! * `directory_initialized` — the destination directory is bootstrapped
//!   at most once per run by writing a zero-length `.gitkeep` sentinel.
//!   "Created" and "already exists" are both success; anything else is a
//!   logged warning, because the host may still accept object creation in
//!   a directory that looks nonexistent.
//! * `last_stamp` — remote names are nanosecond timestamps plus the
//!   asset's original extension; the guard bumps the stamp when two
//!   uploads land in the same nanosecond so names stay unique within a
//!   run.
//!
//! Both one-shot flags are instance fields, not process globals, so two
//! runs in one process never leak state into each other. Calls are
//! serialized — the pipeline uploads one asset at a time in document
//! order — which is what makes the plain read-then-write flags safe.

use crate::config::DestinationConfig;
use crate::error::{RelocateError, SkipReason};
use crate::host::{ContentHost, HostError, PutObject, PutOutcome};
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Sentinel object written to bootstrap the destination directory.
const DIRECTORY_SENTINEL: &str = ".gitkeep";

/// A successfully uploaded asset.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    /// Public address the rewritten reference will point at.
    pub public_url: String,
    /// Repository-relative path of the uploaded object.
    pub remote_path: String,
}

/// Uploads local assets to the content host, one at a time.
pub struct Uploader {
    host: Arc<dyn ContentHost>,
    config: DestinationConfig,
    destination_verified: bool,
    directory_initialized: bool,
    last_stamp: u128,
}

impl Uploader {
    pub fn new(host: Arc<dyn ContentHost>, config: &DestinationConfig) -> Self {
        Self {
            host,
            config: config.clone(),
            destination_verified: false,
            directory_initialized: false,
            last_stamp: 0,
        }
    }

    /// Verify the destination repository is reachable and accessible.
    ///
    /// Runs the check once per run; later calls return immediately.
    /// Failure here is fatal: the whole run must stop before any object
    /// is written.
    pub async fn verify_destination(&mut self) -> Result<(), RelocateError> {
        if self.destination_verified {
            return Ok(());
        }

        self.host
            .verify_destination()
            .await
            .map_err(|e| match e {
                HostError::NotFound => RelocateError::DestinationNotFound {
                    owner: self.config.owner.clone(),
                    repo: self.config.repo.clone(),
                },
                other => RelocateError::DestinationCheckFailed {
                    owner: self.config.owner.clone(),
                    repo: self.config.repo.clone(),
                    detail: other.to_string(),
                },
            })?;

        debug!(
            "Destination {}/{} verified",
            self.config.owner, self.config.repo
        );
        self.destination_verified = true;
        Ok(())
    }

    /// Upload one local asset and return its public address.
    ///
    /// Errors here are per-asset recoverable: the caller logs the
    /// [`SkipReason`], leaves the reference unreplaced, and continues the
    /// run. [`verify_destination`](Self::verify_destination) must have
    /// succeeded first.
    pub async fn upload(&mut self, local_path: &Path) -> Result<UploadedAsset, SkipReason> {
        let bytes = std::fs::read(local_path).map_err(|e| SkipReason::AssetUnreadable {
            path: local_path.to_path_buf(),
            detail: e.to_string(),
        })?;

        self.ensure_directory().await;

        let remote_name = self.next_remote_name(local_path);
        let remote_path = self.config.remote_path(&remote_name);
        let message = format!("Upload image {remote_name}");

        let outcome = self
            .host
            .put_object(PutObject {
                path: &remote_path,
                content: &bytes,
                message: &message,
            })
            .await
            .map_err(|e| SkipReason::UploadRejected {
                path: local_path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let public_url = match outcome {
            PutOutcome::Created { download_url } => {
                if self.config.use_cdn {
                    self.cdn_url(&remote_path)
                } else {
                    download_url.ok_or_else(|| SkipReason::UploadRejected {
                        path: local_path.to_path_buf(),
                        detail: "host response carried no download URL".to_string(),
                    })?
                }
            }
            // A timestamped name colliding with an existing object means
            // the clock went backwards; treat it as a rejected upload.
            PutOutcome::AlreadyExists => {
                return Err(SkipReason::UploadRejected {
                    path: local_path.to_path_buf(),
                    detail: format!("remote object '{remote_path}' already exists"),
                });
            }
        };

        info!(
            "Uploaded {} -> {}",
            local_path.display(),
            public_url
        );

        Ok(UploadedAsset {
            public_url,
            remote_path,
        })
    }

    /// Bootstrap the destination directory once per run, best-effort.
    async fn ensure_directory(&mut self) {
        if self.directory_initialized {
            return;
        }
        // Mark before the attempt: one try per run, whatever the outcome.
        self.directory_initialized = true;

        let sentinel_path = self.config.remote_path(DIRECTORY_SENTINEL);
        let message = format!("Create asset directory {}", self.config.asset_dir);

        match self
            .host
            .put_object(PutObject {
                path: &sentinel_path,
                content: &[],
                message: &message,
            })
            .await
        {
            Ok(PutOutcome::Created { .. }) => {
                debug!("Created destination directory '{}'", self.config.asset_dir);
            }
            Ok(PutOutcome::AlreadyExists) => {
                debug!(
                    "Destination directory '{}' already exists",
                    self.config.asset_dir
                );
            }
            Err(e) => {
                warn!(
                    "Could not ensure destination directory '{}' exists: {}",
                    self.config.asset_dir, e
                );
            }
        }
    }

    /// Unique remote object name: nanosecond timestamp plus the asset's
    /// original extension. Bumps the stamp when the clock hands out the
    /// same nanosecond twice in one run.
    fn next_remote_name(&mut self, local_path: &Path) -> String {
        let mut stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        if stamp <= self.last_stamp {
            stamp = self.last_stamp + 1;
        }
        self.last_stamp = stamp;

        match local_path.extension() {
            Some(ext) => format!("{stamp}.{}", ext.to_string_lossy()),
            None => stamp.to_string(),
        }
    }

    /// jsDelivr edge-cache URL templated from destination coordinates.
    fn cdn_url(&self, remote_path: &str) -> String {
        format!(
            "https://cdn.jsdelivr.net/gh/{}/{}@{}/{}",
            self.config.owner, self.config.repo, self.config.branch, remote_path
        )
    }
}
