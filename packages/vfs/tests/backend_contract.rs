//! The same contract, run against both backends.

use std::collections::BTreeMap;
use std::sync::Arc;

use resfs_vfs::{
    lpath, BackendConfig, Bytes, EphemeralBackend, FilesystemBackend, FsError, LogicalPath,
    NodeKind, PersistentBackend,
};
use tempfile::TempDir;

async fn backends() -> (TempDir, Vec<Arc<dyn FilesystemBackend>>) {
    let dir = tempfile::tempdir().unwrap();
    let persistent = PersistentBackend::open(dir.path(), "http://localhost:3000")
        .await
        .unwrap();
    (
        dir,
        vec![Arc::new(persistent), Arc::new(EphemeralBackend::new())],
    )
}

/// Collect every file under `dir` as `path -> bytes`.
async fn snapshot(fs: &dyn FilesystemBackend) -> BTreeMap<String, Bytes> {
    let mut files = BTreeMap::new();
    let mut pending = vec![LogicalPath::root()];
    while let Some(dir) = pending.pop() {
        for entry in fs.list_dir(&dir).await.unwrap() {
            let child = dir.child(&entry.name).unwrap();
            match entry.kind {
                NodeKind::Directory => pending.push(child),
                NodeKind::File => {
                    let data = fs.read_binary(&child).await.unwrap();
                    files.insert(child.to_string(), data);
                }
            }
        }
    }
    files
}

#[tokio::test]
async fn write_then_read_returns_same_bytes() {
    let (_dir, backends) = backends().await;
    let payloads: [&[u8]; 4] = [b"", b"a", &[0, 255, 0, 255], &[7; 4096]];

    for fs in backends {
        for (i, payload) in payloads.iter().enumerate() {
            let path = LogicalPath::parse(&format!("p/{}/data.bin", i)).unwrap();
            fs.write_all(&path, Bytes::copy_from_slice(payload))
                .await
                .unwrap();
            assert_eq!(fs.read_binary(&path).await.unwrap().as_ref(), *payload);
        }
    }
}

#[tokio::test]
async fn write_creates_intermediates_visible_to_list_dir() {
    let (_dir, backends) = backends().await;

    for fs in backends {
        fs.write_all(&lpath!("one/two/three/leaf.txt"), Bytes::from_static(b"x"))
            .await
            .unwrap();

        let chain = ["one", "two", "three", "leaf.txt"];
        let mut current = LogicalPath::root();
        for next in chain {
            let entries = fs.list_dir(&current).await.unwrap();
            assert!(
                entries.iter().any(|e| e.name == next),
                "{:?}: {} missing from {}",
                fs.kind(),
                next,
                current
            );
            current = current.child(next).unwrap();
        }
    }
}

#[tokio::test]
async fn exists_before_and_after_write() {
    let (_dir, backends) = backends().await;

    for fs in backends {
        let path = lpath!("dir/b.txt");
        assert!(!fs.exists(&path).await);
        assert!(!fs.exists(&lpath!("dir")).await);

        fs.write_all(&path, Bytes::from_static(b"bravo"))
            .await
            .unwrap();
        assert!(fs.exists(&path).await);
        assert!(fs.exists(&lpath!("dir")).await);
        assert!(!fs.exists(&lpath!("dir/b.txt/deeper")).await);
    }
}

#[tokio::test]
async fn idempotent_writes() {
    let (_dir, backends) = backends().await;

    for fs in backends {
        let path = lpath!("x/y.txt");
        fs.write_all(&path, Bytes::from_static(b"same")).await.unwrap();
        let first = snapshot(fs.as_ref()).await;
        fs.write_all(&path, Bytes::from_static(b"same")).await.unwrap();
        assert_eq!(snapshot(fs.as_ref()).await, first);
    }
}

#[tokio::test]
async fn missing_intermediate_on_read_and_list() {
    let (_dir, backends) = backends().await;

    for fs in backends {
        let err = fs.read_binary(&lpath!("nope/file")).await.unwrap_err();
        assert!(err.is_resolution(), "{:?}", err);
        let err = fs.list_dir(&lpath!("nope")).await.unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }
}

#[tokio::test]
async fn file_blocking_a_directory_fails_the_write() {
    let (_dir, backends) = backends().await;

    for fs in backends {
        fs.write_all(&lpath!("blocker"), Bytes::new()).await.unwrap();
        let err = fs
            .write_all(&lpath!("blocker/child"), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::NotADirectory { .. }), "{:?}", err);
    }
}

#[tokio::test]
async fn cleared_root_lists_empty() {
    let (_dir, backends) = backends().await;

    for fs in backends {
        fs.write_all(&lpath!("a.txt"), Bytes::new()).await.unwrap();
        fs.write_all(&lpath!("dir/b.txt"), Bytes::new()).await.unwrap();
        fs.clear().await.unwrap();
        assert!(fs.list_dir(&LogicalPath::root()).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn both_backends_build_identical_trees() {
    let (_dir, backends) = backends().await;
    let writes = [
        ("a.txt", &b"alpha"[..]),
        ("dir/b.txt", &b"bravo"[..]),
        ("dir/sub/c.bin", &[1u8, 2, 3][..]),
        ("a.txt", &b"alpha again"[..]),
    ];

    let mut snapshots = Vec::new();
    for fs in &backends {
        for (path, data) in writes {
            fs.write_all(&LogicalPath::parse(path).unwrap(), Bytes::copy_from_slice(data))
                .await
                .unwrap();
        }
        snapshots.push(snapshot(fs.as_ref()).await);
    }

    assert_eq!(snapshots[0], snapshots[1]);
    assert_eq!(snapshots[0].len(), 3);
    assert_eq!(snapshots[0]["a.txt"].as_ref(), b"alpha again");
}

#[tokio::test]
async fn config_selected_backends_share_the_contract() {
    let dir = tempfile::tempdir().unwrap();
    let configs = [
        BackendConfig::Ephemeral,
        BackendConfig::Persistent {
            storage_root: Some(dir.path().to_path_buf()),
            origin: "app".to_string(),
        },
    ];

    for config in configs {
        let fs = config.open().await.unwrap();
        fs.write_all(&lpath!("scene.gltf"), Bytes::from_static(b"{}"))
            .await
            .unwrap();
        assert_eq!(fs.read_text(&lpath!("scene.gltf")).await.unwrap(), "{}");
    }
}

#[tokio::test]
async fn long_leaf_names_are_accepted_by_both_backends() {
    let (_dir, backends) = backends().await;
    let path = LogicalPath::parse(&format!("dir/{}.bin", "a".repeat(230))).unwrap();

    for fs in backends {
        fs.write_all(&path, Bytes::from_static(b"long"))
            .await
            .unwrap_or_else(|e| panic!("{:?}: {}", fs.kind(), e));
        assert_eq!(fs.read_binary(&path).await.unwrap().as_ref(), b"long");
        assert_eq!(fs.list_dir(&lpath!("dir")).await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn every_written_file_is_listed() {
    let (_dir, backends) = backends().await;
    let names = ["save.resfs-partial", ".hidden", ".resfs-staging"];

    for fs in backends {
        for name in names {
            fs.write_all(&LogicalPath::parse(name).unwrap(), Bytes::from_static(b"x"))
                .await
                .unwrap();
        }
        let mut listed: Vec<String> = fs
            .list_dir(&LogicalPath::root())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        listed.sort();
        assert_eq!(
            listed,
            vec![".hidden", ".resfs-staging", "save.resfs-partial"],
            "{:?}",
            fs.kind()
        );
    }
}
