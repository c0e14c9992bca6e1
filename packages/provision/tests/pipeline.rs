use std::sync::Arc;

use tokio::sync::mpsc;

use resfs_http::{MockFetcher, Url};
use resfs_provision::{
    PipelineConfig, PipelineState, ProgressEvent, ProvisionError, ProvisioningPipeline,
};
use resfs_vfs::{lpath, DirEntry, EphemeralBackend, FilesystemBackend, PersistentBackend};

const MANIFEST: &str = r#"[{"filepath":"a.txt"},{"filepath":"dir/b.txt"}]"#;

fn config() -> PipelineConfig {
    PipelineConfig {
        delay_ms: 0,
        ..Default::default()
    }
}

fn two_file_fetcher() -> MockFetcher {
    MockFetcher::new()
        .with_response("http://localhost:3000/files.json", MANIFEST)
        .with_response("http://localhost:3000/res/a.txt", "A")
        .with_response("http://localhost:3000/res/dir/b.txt", "B")
}

fn fractions(events: &[ProgressEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Fraction(f) => Some(*f),
            _ => None,
        })
        .collect()
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn provision_two_files(backend: Arc<dyn FilesystemBackend>) {
    let fetcher = two_file_fetcher();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut pipeline = ProvisioningPipeline::new(config(), backend.clone(), Arc::new(fetcher.clone()))
        .with_progress(Arc::new(tx));

    let report = pipeline.run().await.unwrap();
    assert_eq!(report.resources, 2);
    assert_eq!(report.bytes, 2);
    assert_eq!(pipeline.state(), &PipelineState::Completed);

    // manifest first, then resources in manifest order
    let requested: Vec<String> = fetcher.requests().iter().map(Url::to_string).collect();
    assert_eq!(
        requested,
        vec![
            "http://localhost:3000/files.json",
            "http://localhost:3000/res/a.txt",
            "http://localhost:3000/res/dir/b.txt",
        ]
    );

    assert_eq!(backend.read_text(&lpath!("a.txt")).await.unwrap(), "A");
    assert_eq!(backend.read_text(&lpath!("dir/b.txt")).await.unwrap(), "B");
    assert_eq!(
        backend.list_dir(&lpath!("dir")).await.unwrap(),
        vec![DirEntry::file("b.txt")]
    );

    let events = drain(&mut rx);
    assert_eq!(fractions(&events), vec![0.0, 0.5, 1.0]);
    assert_eq!(events.first(), Some(&ProgressEvent::Overlay(true)));
    assert_eq!(events.last(), Some(&ProgressEvent::Overlay(false)));
    assert!(events.contains(&ProgressEvent::Status("Preparing file system".into())));
    assert!(events.contains(&ProgressEvent::Status("Downloaded a.txt (1/2)".into())));
    assert!(events.contains(&ProgressEvent::Status("Downloaded dir/b.txt (2/2)".into())));
    assert!(events.contains(&ProgressEvent::Status("Ready".into())));
    assert!(!events
        .iter()
        .any(|e| matches!(e, ProgressEvent::Failure(_))));
}

#[tokio::test]
async fn test_provisions_ephemeral_backend() {
    provision_two_files(Arc::new(EphemeralBackend::new())).await;
}

#[tokio::test]
async fn test_provisions_persistent_backend() {
    let dir = tempfile::tempdir().unwrap();
    let backend = PersistentBackend::open_dir(dir.path().join("store")).await.unwrap();
    provision_two_files(Arc::new(backend)).await;
}

#[tokio::test]
async fn test_previous_contents_are_cleared() {
    let backend = Arc::new(EphemeralBackend::new());
    backend
        .write_all(&lpath!("stale/old.bin"), "old".into())
        .await
        .unwrap();

    let mut pipeline =
        ProvisioningPipeline::new(config(), backend.clone(), Arc::new(two_file_fetcher()));
    pipeline.run().await.unwrap();

    assert!(!backend.exists(&lpath!("stale")).await);
    assert_eq!(
        backend.list_dir(&lpath!("/")).await.unwrap(),
        vec![DirEntry::file("a.txt"), DirEntry::directory("dir")]
    );
}

#[tokio::test]
async fn test_manifest_failure_downloads_nothing() {
    let fetcher = MockFetcher::new().failing("http://localhost:3000/files.json");
    let backend = Arc::new(EphemeralBackend::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut pipeline = ProvisioningPipeline::new(config(), backend.clone(), Arc::new(fetcher.clone()))
        .with_progress(Arc::new(tx));

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, ProvisionError::Manifest { .. }));
    assert!(matches!(pipeline.state(), PipelineState::Failed(_)));
    assert_eq!(fetcher.requests().len(), 1);
    assert!(backend.list_dir(&lpath!("/")).await.unwrap().is_empty());

    let failures: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, ProgressEvent::Failure(_)))
        .collect();
    assert_eq!(failures.len(), 1);
}

#[tokio::test]
async fn test_download_failure_aborts_remaining_resources() {
    let fetcher = MockFetcher::new()
        .with_response(
            "http://localhost:3000/files.json",
            r#"[{"filepath":"a.txt"},{"filepath":"missing.txt"},{"filepath":"c.txt"}]"#,
        )
        .with_response("http://localhost:3000/res/a.txt", "A")
        .with_response("http://localhost:3000/res/c.txt", "C");
    let backend = Arc::new(EphemeralBackend::new());
    let mut pipeline = ProvisioningPipeline::new(config(), backend.clone(), Arc::new(fetcher.clone()));

    let err = pipeline.run().await.unwrap_err();
    match err {
        ProvisionError::Download { url, .. } => {
            assert_eq!(url.as_str(), "http://localhost:3000/res/missing.txt")
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // no retry, nothing after the failed resource
    assert_eq!(fetcher.requests().len(), 3);
    assert!(backend.exists(&lpath!("a.txt")).await);
    assert!(!backend.exists(&lpath!("c.txt")).await);
}

#[tokio::test]
async fn test_explicit_source_url_is_used() {
    let fetcher = MockFetcher::new()
        .with_response(
            "http://localhost:3000/files.json",
            r#"[{"filepath":"models/Box.glb","fileUrl":"http://cdn.test/Box.glb"}]"#,
        )
        .with_response("http://cdn.test/Box.glb", "glTF");
    let backend = Arc::new(EphemeralBackend::new());
    let mut pipeline = ProvisioningPipeline::new(config(), backend.clone(), Arc::new(fetcher));

    pipeline.run().await.unwrap();
    assert_eq!(
        backend
            .read_binary(&lpath!("models/Box.glb"))
            .await
            .unwrap()
            .as_ref(),
        b"glTF"
    );
}

#[tokio::test]
async fn test_status_lines_can_be_disabled() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = PipelineConfig {
        status_lines: false,
        ..config()
    };
    let mut pipeline = ProvisioningPipeline::new(
        config,
        Arc::new(EphemeralBackend::new()),
        Arc::new(two_file_fetcher()),
    )
    .with_progress(Arc::new(tx));
    pipeline.run().await.unwrap();

    let events = drain(&mut rx);
    assert!(!events
        .iter()
        .any(|e| matches!(e, ProgressEvent::Status(s) if s.starts_with("Downloaded"))));
    assert_eq!(fractions(&events), vec![0.0, 0.5, 1.0]);
}

#[tokio::test(start_paused = true)]
async fn test_delay_between_resources() {
    let config = PipelineConfig {
        delay_ms: 250,
        ..Default::default()
    };
    let mut pipeline = ProvisioningPipeline::new(
        config,
        Arc::new(EphemeralBackend::new()),
        Arc::new(two_file_fetcher()),
    );

    let start = tokio::time::Instant::now();
    pipeline.run().await.unwrap();
    // one pause between two resources, none after the last
    let elapsed = start.elapsed();
    assert!(elapsed >= std::time::Duration::from_millis(250));
    assert!(elapsed < std::time::Duration::from_millis(500));
}
