//! Configuration types for one relocation run.
//!
//! All run behaviour is controlled through [`DestinationConfig`], built via
//! its [`DestinationConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share a config between the CLI, the web front end, and
//! tests, and to diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! The destination has three required fields and several optional ones with
//! sensible defaults. The builder lets callers set only what they care
//! about and validates the required fields in one place.

use crate::error::RelocateError;
use crate::host::ContentHost;
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Destination and behaviour configuration for a relocation run.
///
/// Immutable for the lifetime of one run. Built via
/// [`DestinationConfig::builder()`].
///
/// # Example
/// ```rust
/// use md2hub::DestinationConfig;
///
/// let config = DestinationConfig::builder()
///     .token("ghp_xxx")
///     .owner("acme")
///     .repo("assets")
///     .asset_dir("img")
///     .use_cdn(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct DestinationConfig {
    /// Personal access token used for every content-host request.
    pub token: String,

    /// Owner namespace of the destination repository.
    pub owner: String,

    /// Destination repository name.
    pub repo: String,

    /// Branch objects are committed to. Default: `main`.
    pub branch: String,

    /// Directory inside the repository that uploaded assets land in.
    /// Default: `images`.
    pub asset_dir: String,

    /// Synthesize public URLs from the jsDelivr CDN template instead of
    /// trusting the host's reported download URL. Default: true.
    ///
    /// The templated URL is derived entirely from known coordinates
    /// (owner, repo, branch, path), so it needs no extra round trip and is
    /// immune to changes in the host's response shape. Raw download URLs
    /// also hit the repository directly on every view; the CDN caches at
    /// the edge.
    pub use_cdn: bool,

    /// Per-request timeout for content-host calls in seconds. Default: 60.
    pub upload_timeout_secs: u64,

    /// Pre-constructed content host. Takes precedence over the built-in
    /// GitHub host; used by tests and callers that need custom middleware.
    pub host: Option<Arc<dyn ContentHost>>,

    /// Optional per-reference progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            asset_dir: "images".to_string(),
            use_cdn: true,
            upload_timeout_secs: 60,
            host: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for DestinationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestinationConfig")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("asset_dir", &self.asset_dir)
            .field("use_cdn", &self.use_cdn)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .field("host", &self.host.as_ref().map(|_| "<dyn ContentHost>"))
            .finish()
    }
}

impl DestinationConfig {
    /// Create a new builder for `DestinationConfig`.
    pub fn builder() -> DestinationConfigBuilder {
        DestinationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The repository-relative path of one uploaded asset.
    pub fn remote_path(&self, remote_name: &str) -> String {
        let dir = self.asset_dir.trim_matches('/');
        if dir.is_empty() {
            remote_name.to_string()
        } else {
            format!("{dir}/{remote_name}")
        }
    }
}

/// Builder for [`DestinationConfig`].
pub struct DestinationConfigBuilder {
    config: DestinationConfig,
}

impl DestinationConfigBuilder {
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = token.into();
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.config.owner = owner.into();
        self
    }

    pub fn repo(mut self, repo: impl Into<String>) -> Self {
        self.config.repo = repo.into();
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.config.branch = branch.into();
        self
    }

    pub fn asset_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.asset_dir = dir.into();
        self
    }

    pub fn use_cdn(mut self, v: bool) -> Self {
        self.config.use_cdn = v;
        self
    }

    pub fn upload_timeout_secs(mut self, secs: u64) -> Self {
        self.config.upload_timeout_secs = secs.max(1);
        self
    }

    pub fn host(mut self, host: Arc<dyn ContentHost>) -> Self {
        self.config.host = Some(host);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating required fields.
    ///
    /// A pre-built [`ContentHost`] carries its own credential and
    /// destination, so `token`/`owner`/`repo` are only required when the
    /// built-in GitHub host will be constructed from this config.
    pub fn build(self) -> Result<DestinationConfig, RelocateError> {
        let c = &self.config;
        if c.host.is_none() {
            if c.token.is_empty() {
                return Err(RelocateError::InvalidConfig("token is required".into()));
            }
            if c.owner.is_empty() {
                return Err(RelocateError::InvalidConfig("owner is required".into()));
            }
            if c.repo.is_empty() {
                return Err(RelocateError::InvalidConfig("repo is required".into()));
            }
        }
        if c.branch.is_empty() {
            return Err(RelocateError::InvalidConfig("branch must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_destination_fields() {
        let err = DestinationConfig::builder().build().unwrap_err();
        assert!(err.to_string().contains("token"));

        let err = DestinationConfig::builder()
            .token("t")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("owner"));

        let err = DestinationConfig::builder()
            .token("t")
            .owner("o")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("repo"));
    }

    #[test]
    fn builder_defaults() {
        let c = DestinationConfig::builder()
            .token("t")
            .owner("o")
            .repo("r")
            .build()
            .unwrap();
        assert_eq!(c.branch, "main");
        assert_eq!(c.asset_dir, "images");
        assert!(c.use_cdn);
    }

    #[test]
    fn debug_redacts_token() {
        let c = DestinationConfig::builder()
            .token("ghp_supersecret")
            .owner("o")
            .repo("r")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("supersecret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn remote_path_handles_dir_variants() {
        let mut c = DestinationConfig::builder()
            .token("t")
            .owner("o")
            .repo("r")
            .asset_dir("images/")
            .build()
            .unwrap();
        assert_eq!(c.remote_path("1.png"), "images/1.png");

        c.asset_dir = String::new();
        assert_eq!(c.remote_path("1.png"), "1.png");
    }

    #[test]
    fn empty_branch_rejected() {
        let err = DestinationConfig::builder()
            .token("t")
            .owner("o")
            .repo("r")
            .branch("")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("branch"));
    }
}
