//! End-to-end pipeline tests for md2hub.
//!
//! These drive the full scan → classify → upload → rewrite pipeline over
//! real files in a temp directory, with the content host replaced by an
//! in-memory fake injected through `DestinationConfig::host`. No network
//! access is needed.

use async_trait::async_trait;
use md2hub::{
    bundle, relocate, scan_references, ContentHost, DestinationConfig, HostError, PutObject,
    PutOutcome, ReferenceStatus, RelocateError,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ── In-memory content host ───────────────────────────────────────────────────

/// Records every request and answers from canned behaviour.
#[derive(Default)]
struct FakeHost {
    /// When set, `verify_destination` answers 404.
    destination_missing: bool,
    /// When set, the directory-bootstrap sentinel answers "already exists".
    sentinel_exists: bool,
    /// When set, every non-sentinel PUT is rejected with HTTP 500.
    reject_uploads: bool,
    verify_called: AtomicBool,
    /// (path, byte length) of every PUT received, in order.
    puts: Mutex<Vec<(String, usize)>>,
}

impl FakeHost {
    fn put_paths(&self) -> Vec<String> {
        self.puts
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }

    fn object_puts(&self) -> Vec<(String, usize)> {
        self.puts
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| !p.ends_with(".gitkeep"))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ContentHost for FakeHost {
    async fn verify_destination(&self) -> Result<(), HostError> {
        self.verify_called.store(true, Ordering::SeqCst);
        if self.destination_missing {
            Err(HostError::NotFound)
        } else {
            Ok(())
        }
    }

    async fn put_object(&self, req: PutObject<'_>) -> Result<PutOutcome, HostError> {
        self.puts
            .lock()
            .unwrap()
            .push((req.path.to_string(), req.content.len()));

        if req.path.ends_with(".gitkeep") {
            return if self.sentinel_exists {
                Ok(PutOutcome::AlreadyExists)
            } else {
                Ok(PutOutcome::Created { download_url: None })
            };
        }

        if self.reject_uploads {
            return Err(HostError::Status {
                status: 500,
                body: "internal error".into(),
            });
        }

        Ok(PutOutcome::Created {
            download_url: Some(format!("https://raw.host.example/{}", req.path)),
        })
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

fn config_with(host: Arc<FakeHost>) -> DestinationConfig {
    DestinationConfig::builder()
        .token("t0ken")
        .owner("acme")
        .repo("assets")
        .branch("main")
        .asset_dir("images")
        .host(host)
        .build()
        .unwrap()
}

/// Write a document plus asset files into a temp dir; returns the dir and
/// the document path.
fn fixture(document: &str, assets: &[&str]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    for asset in assets {
        let path = dir.path().join(asset);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"\x89PNG not really a png").unwrap();
    }
    let doc = dir.path().join("doc.md");
    std::fs::write(&doc, document).unwrap();
    (dir, doc)
}

// ── Pipeline behaviour ───────────────────────────────────────────────────────

#[tokio::test]
async fn zero_references_leaves_content_identical() {
    let host = Arc::new(FakeHost::default());
    let (_dir, doc) = fixture("# Title\n\nplain text, [a link](x) but no images\n", &[]);

    let out = relocate(&doc, &config_with(host.clone())).await.unwrap();

    assert_eq!(out.content, "# Title\n\nplain text, [a link](x) but no images\n");
    assert_eq!(out.stats.total_references, 0);
    assert!(host.put_paths().is_empty());
    assert!(!host.verify_called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn mixed_local_and_remote_replaces_only_the_local_one() {
    let host = Arc::new(FakeHost::default());
    let (_dir, doc) = fixture(
        "![a](img/x.png)\ntext\n![b](http://host/y.png)",
        &["img/x.png"],
    );

    let out = relocate(&doc, &config_with(host.clone())).await.unwrap();

    assert_eq!(out.stats.replaced, 1);
    assert_eq!(out.stats.remote, 1);
    assert!(out.content.contains("\ntext\n"), "intervening text untouched");
    assert!(out.content.contains("![b](http://host/y.png)"));
    assert!(
        out.content
            .contains("![a](https://cdn.jsdelivr.net/gh/acme/assets@main/images/"),
        "got: {}",
        out.content
    );
    assert!(!out.content.contains("img/x.png"));

    // Exactly one object upload plus the directory sentinel.
    assert_eq!(host.object_puts().len(), 1);
}

#[tokio::test]
async fn missing_asset_is_skipped_and_run_still_succeeds() {
    let host = Arc::new(FakeHost::default());
    let (_dir, doc) = fixture("![a](img/gone.png)\n", &[]);

    let out = relocate(&doc, &config_with(host.clone())).await.unwrap();

    assert_eq!(out.content, "![a](img/gone.png)\n");
    assert_eq!(out.stats.missing_assets, 1);
    assert_eq!(out.stats.replaced, 0);
    assert!(!out.is_complete());
    assert!(matches!(
        out.references[0].status,
        ReferenceStatus::Skipped { .. }
    ));
    // Nothing eligible for upload: no destination check, no PUTs.
    assert!(host.put_paths().is_empty());
}

#[tokio::test]
async fn destination_404_aborts_before_any_upload() {
    let host = Arc::new(FakeHost {
        destination_missing: true,
        ..Default::default()
    });
    let (_dir, doc) = fixture("![a](x.png)\n", &["x.png"]);

    let err = relocate(&doc, &config_with(host.clone())).await.unwrap_err();

    match err {
        RelocateError::DestinationNotFound { owner, repo } => {
            assert_eq!(owner, "acme");
            assert_eq!(repo, "assets");
        }
        other => panic!("expected DestinationNotFound, got: {other}"),
    }
    assert!(host.put_paths().is_empty(), "no upload attempts after 404");
}

#[tokio::test]
async fn bootstrap_already_exists_does_not_block_uploads() {
    let host = Arc::new(FakeHost {
        sentinel_exists: true,
        ..Default::default()
    });
    let (_dir, doc) = fixture("![a](x.png)\n", &["x.png"]);

    let out = relocate(&doc, &config_with(host.clone())).await.unwrap();

    assert_eq!(out.stats.replaced, 1);
    let paths = host.put_paths();
    assert!(paths[0].ends_with(".gitkeep"));
    assert_eq!(host.object_puts().len(), 1);
}

#[tokio::test]
async fn rejected_upload_is_per_reference_not_fatal() {
    let host = Arc::new(FakeHost {
        reject_uploads: true,
        ..Default::default()
    });
    let (_dir, doc) = fixture("![a](x.png)\nkeep\n", &["x.png"]);

    let out = relocate(&doc, &config_with(host.clone())).await.unwrap();

    assert_eq!(out.stats.failed_uploads, 1);
    assert_eq!(out.stats.replaced, 0);
    assert_eq!(out.content, "![a](x.png)\nkeep\n");
}

#[tokio::test]
async fn two_local_references_get_distinct_remote_names() {
    let host = Arc::new(FakeHost::default());
    let (_dir, doc) = fixture("![a](x.png)\n\n![b](y.png)\n", &["x.png", "y.png"]);

    let out = relocate(&doc, &config_with(host.clone())).await.unwrap();

    assert_eq!(out.stats.replaced, 2);
    let objects = host.object_puts();
    assert_eq!(objects.len(), 2);
    assert_ne!(objects[0].0, objects[1].0, "remote names must be unique");

    // Destination verified exactly once for the whole run.
    assert!(host.verify_called.load(Ordering::SeqCst));

    // Reverse-order rewrite: both references replaced, neither leaks into
    // the other's span, the blank line between them survives.
    let refs = scan_references(&out.content);
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].alt_text, "a");
    assert_eq!(refs[1].alt_text, "b");
    assert!(out.content.contains("\n\n"));
}

#[tokio::test]
async fn duplicate_literal_references_each_replaced_in_place() {
    let host = Arc::new(FakeHost::default());
    let (_dir, doc) = fixture("![x](a.png) mid ![x](a.png)\n", &["a.png"]);

    let out = relocate(&doc, &config_with(host.clone())).await.unwrap();

    assert_eq!(out.stats.replaced, 2);
    let refs = scan_references(&out.content);
    assert_eq!(refs.len(), 2);
    assert_ne!(
        refs[0].target, refs[1].target,
        "each duplicate gets its own uploaded object"
    );
    assert!(out.content.contains(" mid "));
}

#[tokio::test]
async fn uploading_same_file_twice_yields_two_remote_objects() {
    let host = Arc::new(FakeHost::default());
    let (_dir, doc) = fixture("![one](a.png)\n![two](a.png)\n", &["a.png"]);

    let out = relocate(&doc, &config_with(host.clone())).await.unwrap();

    assert_eq!(out.stats.replaced, 2);
    let objects = host.object_puts();
    assert_eq!(objects.len(), 2);
    assert_ne!(objects[0].0, objects[1].0);
}

#[tokio::test]
async fn rewritten_references_reclassify_as_remote() {
    let host = Arc::new(FakeHost::default());
    let (_dir, doc) = fixture("![a](x.png)\n", &["x.png"]);

    let out = relocate(&doc, &config_with(host)).await.unwrap();

    let refs = scan_references(&out.content);
    assert_eq!(refs.len(), 1);
    assert!(
        refs[0].target.starts_with("https://"),
        "round-trip: rewritten target must classify as remote, got '{}'",
        refs[0].target
    );
}

#[tokio::test]
async fn raw_download_urls_used_when_cdn_disabled() {
    let host = Arc::new(FakeHost::default());
    let (_dir, doc) = fixture("![a](x.png)\n", &["x.png"]);
    let config = DestinationConfig::builder()
        .token("t")
        .owner("acme")
        .repo("assets")
        .use_cdn(false)
        .host(host)
        .build()
        .unwrap();

    let out = relocate(&doc, &config).await.unwrap();

    let refs = scan_references(&out.content);
    assert!(
        refs[0].target.starts_with("https://raw.host.example/images/"),
        "got '{}'",
        refs[0].target
    );
}

#[tokio::test]
async fn relocate_to_file_writes_output_without_touching_input() {
    let host = Arc::new(FakeHost::default());
    let original = "![a](x.png)\n";
    let (_dir, doc) = fixture(original, &["x.png"]);
    let out_path = relocate::processed_path(&doc);

    let stats = relocate::relocate_to_file(&doc, &out_path, &config_with(host))
        .await
        .unwrap();

    assert_eq!(stats.replaced, 1);
    assert_eq!(std::fs::read_to_string(&doc).unwrap(), original);
    let written = std::fs::read_to_string(&out_path).unwrap();
    assert!(written.contains("https://cdn.jsdelivr.net/"));
    assert!(out_path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .contains("-processed"));
}

#[tokio::test]
async fn absolute_targets_resolve_verbatim() {
    let host = Arc::new(FakeHost::default());
    let assets = tempfile::tempdir().unwrap();
    let asset = assets.path().join("abs.png");
    std::fs::write(&asset, b"png").unwrap();

    let (_dir, doc) = fixture(&format!("![a]({})\n", asset.display()), &[]);

    let out = relocate(&doc, &config_with(host)).await.unwrap();
    assert_eq!(out.stats.replaced, 1);
}

// ── Bundle ingestion end to end ──────────────────────────────────────────────

#[tokio::test]
async fn bundle_extract_then_relocate() {
    use std::io::Write as _;
    use zip::write::SimpleFileOptions;

    // Build a bundle: document + referenced image.
    let zip_file = tempfile::NamedTempFile::new().unwrap();
    let mut writer = zip::ZipWriter::new(zip_file.reopen().unwrap());
    writer
        .start_file("notes.md", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"# t\n![a](img/x.png)\n").unwrap();
    writer
        .start_file("img/x.png", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"\x89PNG").unwrap();
    writer.finish().unwrap();

    let extract_dir = tempfile::tempdir().unwrap();
    let files = bundle::extract_bundle(zip_file.path(), extract_dir.path()).unwrap();
    let doc = bundle::find_document(&files).expect("bundle contains a document");

    let host = Arc::new(FakeHost::default());
    let out = relocate(doc, &config_with(host)).await.unwrap();

    assert_eq!(out.stats.replaced, 1);
    assert!(out.content.starts_with("# t\n"));
}

#[tokio::test]
async fn bundle_without_document_reports_nothing_to_find() {
    let paths: Vec<PathBuf> = vec![Path::new("only.png").to_path_buf()];
    assert!(bundle::find_document(&paths).is_none());
}
