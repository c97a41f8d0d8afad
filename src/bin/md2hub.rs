//! CLI binary for md2hub.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `DestinationConfig`, runs the pipeline on a Markdown file or a ZIP
//! bundle, or serves the web front end.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use md2hub::{
    bundle, processed_path, relocate, DestinationConfig, RelocationOutput, RelocationProgress,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the document's references,
/// with a log line per upload or skip.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>2}/{len} images  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Relocating");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl RelocationProgress for CliProgress {
    fn on_run_start(&self, total_references: usize) {
        self.bar.set_length(total_references as u64);
    }

    fn on_reference_start(&self, _index: usize, _total: usize, target: &str) {
        self.bar.set_message(target.to_string());
    }

    fn on_reference_replaced(&self, index: usize, total: usize, public_url: &str) {
        self.bar.println(format!(
            "  {} {:>2}/{:<2}  {}",
            green("✓"),
            index,
            total,
            dim(public_url)
        ));
        self.bar.inc(1);
    }

    fn on_reference_skipped(&self, index: usize, total: usize, detail: &str) {
        self.bar.println(format!(
            "  {} {:>2}/{:<2}  {}",
            cyan("→"),
            index,
            total,
            dim(detail)
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _total: usize, _replaced: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Relocate images referenced by a Markdown file
  md2hub notes.md --token ghp_xxx --owner acme --repo assets

  # Process a ZIP bundle (document + images), write next to the input
  md2hub slides.zip --owner acme --repo assets

  # Write to an explicit output path, raw GitHub URLs instead of CDN
  md2hub notes.md -o published.md --no-cdn --owner acme --repo assets

  # Run the web front end
  md2hub --serve --port 8080 --owner acme --repo assets

  # Structured JSON report
  md2hub notes.md --json --owner acme --repo assets > report.json

ENVIRONMENT VARIABLES:
  MD2HUB_TOKEN       Personal access token (alternative to --token)
  MD2HUB_OWNER       Destination repository owner
  MD2HUB_REPO        Destination repository name
  MD2HUB_BRANCH      Destination branch (default: main)
  MD2HUB_ASSET_DIR   Repository directory for uploads (default: images)

SETUP:
  1. Create a repository to hold the images, e.g. acme/assets
  2. Create a token with contents write access
  3. export MD2HUB_TOKEN=ghp_...
  4. md2hub notes.md --owner acme --repo assets
"#;

/// Relocate local Markdown image references to a GitHub-backed host.
#[derive(Parser, Debug)]
#[command(
    name = "md2hub",
    version,
    about = "Upload locally-referenced Markdown images to GitHub and rewrite the document",
    long_about = "Scan a Markdown document for image references, upload every locally-stored \
image to a GitHub repository, and rewrite the document so references point at a stable \
public address (jsDelivr CDN by default). Accepts a bare Markdown file or a ZIP bundle \
containing the document and its images.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file or ZIP bundle to process (omit with --serve).
    input: Option<PathBuf>,

    /// Write the rewritten document to this path instead of `<stem>-processed.<ext>`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Personal access token for the destination repository.
    #[arg(long, env = "MD2HUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Destination repository owner.
    #[arg(long, env = "MD2HUB_OWNER")]
    owner: Option<String>,

    /// Destination repository name.
    #[arg(long, env = "MD2HUB_REPO")]
    repo: Option<String>,

    /// Destination branch.
    #[arg(long, env = "MD2HUB_BRANCH", default_value = "main")]
    branch: String,

    /// Repository directory uploaded assets land in.
    #[arg(long, env = "MD2HUB_ASSET_DIR", default_value = "images")]
    asset_dir: String,

    /// Use the host's raw download URLs instead of the jsDelivr CDN.
    #[arg(long)]
    no_cdn: bool,

    /// Per-request upload timeout in seconds.
    #[arg(long, env = "MD2HUB_UPLOAD_TIMEOUT", default_value_t = 60)]
    upload_timeout: u64,

    /// Run the web front end instead of processing a file.
    #[arg(long)]
    serve: bool,

    /// Port for --serve.
    #[arg(short, long, env = "MD2HUB_PORT", default_value_t = 8080)]
    port: u16,

    /// Print a structured JSON report instead of the summary line.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.serve;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli, show_progress)?;

    // ── Serve mode ───────────────────────────────────────────────────────
    if cli.serve {
        return serve(&cli, config).await;
    }

    // ── File mode ────────────────────────────────────────────────────────
    let Some(ref input) = cli.input else {
        bail!("an input file is required unless --serve is given");
    };

    let is_bundle = input
        .extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case("zip"))
        .unwrap_or(false);

    // A bundle extracts into a temp workspace that lives until the run
    // (and the output write) completes.
    let _extract_guard;
    let (document, default_output) = if is_bundle {
        let dir = tempfile::tempdir().context("Failed to create extraction directory")?;
        let files = bundle::extract_bundle(input, dir.path())
            .with_context(|| format!("Failed to extract bundle {}", input.display()))?;
        let document = bundle::find_document(&files)
            .context("No Markdown document found in the bundle")?
            .clone();
        // Output lands next to the bundle, not inside the temp dir.
        let out = processed_path(&input.with_extension("md"));
        _extract_guard = Some(dir);
        (document, out)
    } else {
        _extract_guard = None;
        (input.clone(), processed_path(input))
    };

    let output_path = cli.output.clone().unwrap_or(default_output);

    let output = relocate(&document, &config)
        .await
        .context("Relocation failed")?;
    md2hub::relocate::write_output(&output_path, &output.content)
        .await
        .context("Failed to write output document")?;

    report(&cli, &output, &output_path)?;
    Ok(())
}

/// Map CLI args to `DestinationConfig`.
fn build_config(cli: &Cli, show_progress: bool) -> Result<DestinationConfig> {
    let mut builder = DestinationConfig::builder()
        .token(cli.token.clone().unwrap_or_default())
        .owner(cli.owner.clone().unwrap_or_default())
        .repo(cli.repo.clone().unwrap_or_default())
        .branch(cli.branch.clone())
        .asset_dir(cli.asset_dir.clone())
        .use_cdn(!cli.no_cdn)
        .upload_timeout_secs(cli.upload_timeout);

    if show_progress {
        builder = builder.progress_callback(CliProgress::new());
    }

    builder.build().context("Invalid configuration")
}

/// Print the run report: JSON or the coloured summary line.
fn report(cli: &Cli, output: &RelocationOutput, output_path: &Path) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(json.as_bytes())
            .and_then(|()| handle.write_all(b"\n"))
            .context("Failed to write to stdout")?;
        return Ok(());
    }

    if cli.quiet {
        return Ok(());
    }

    let s = &output.stats;
    let skipped = s.missing_assets + s.failed_uploads;
    eprintln!(
        "{}  {}/{} images relocated  {}ms  →  {}",
        if skipped == 0 { green("✔") } else { cyan("⚠") },
        bold(&s.replaced.to_string()),
        s.total_references,
        s.duration_ms,
        bold(&output_path.display().to_string()),
    );
    if s.remote > 0 {
        eprintln!("   {} already remote", dim(&s.remote.to_string()));
    }
    if skipped > 0 {
        eprintln!(
            "   {} skipped ({} missing, {} failed uploads)",
            red(&skipped.to_string()),
            s.missing_assets,
            s.failed_uploads,
        );
    }
    Ok(())
}

/// Run the web front end until interrupted.
#[cfg(feature = "server")]
async fn serve(cli: &Cli, config: DestinationConfig) -> Result<()> {
    use md2hub::server::{start_server, AppState};
    use std::net::SocketAddr;

    // The workspace outlives every run; dropped (and deleted) on exit.
    let workspace = tempfile::tempdir().context("Failed to create server workspace")?;
    let state = Arc::new(AppState {
        config,
        workspace: workspace.path().to_path_buf(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    start_server(addr, state)
        .await
        .context("Server terminated abnormally")
}

#[cfg(not(feature = "server"))]
async fn serve(_cli: &Cli, _config: DestinationConfig) -> Result<()> {
    bail!("md2hub was built without the `server` feature")
}
