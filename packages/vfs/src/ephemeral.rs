//! In-memory backend that lives as long as the process.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::backend::{BackendKind, DirEntry, FilesystemBackend, NodeKind};
use crate::error::{FsError, Result};
use crate::path::LogicalPath;

#[derive(Debug, Clone)]
enum Node {
    Directory,
    File(Bytes),
}

impl Node {
    fn kind(&self) -> NodeKind {
        match self {
            Node::Directory => NodeKind::Directory,
            Node::File(_) => NodeKind::File,
        }
    }
}

type Tree = BTreeMap<String, Node>;

/// A hierarchical store kept in a string-keyed map.
///
/// Keys are the `/`-joined logical paths of every file and directory; the
/// root is implicit. A write checks each ancestor key in turn and inserts the
/// missing directories before inserting the leaf, all under one lock.
///
/// # Example
///
/// ```rust
/// use resfs_vfs::{lpath, EphemeralBackend, FilesystemBackend};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let fs = EphemeralBackend::new();
/// fs.write_all(&lpath!("dir/b.txt"), "hi".into()).await.unwrap();
/// assert!(fs.exists(&lpath!("dir")).await);
/// assert_eq!(fs.read_text(&lpath!("dir/b.txt")).await.unwrap(), "hi");
/// # });
/// ```
#[derive(Debug, Default)]
pub struct EphemeralBackend {
    tree: RwLock<Tree>,
}

impl EphemeralBackend {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files and directories currently stored.
    pub fn node_count(&self) -> usize {
        self.tree.read().map(|t| t.len()).unwrap_or(0)
    }

    fn read_tree(&self) -> Result<std::sync::RwLockReadGuard<'_, Tree>> {
        self.tree.read().map_err(|_| FsError::StorageUnavailable {
            message: "lock poisoned".into(),
        })
    }

    fn write_tree(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tree>> {
        self.tree.write().map_err(|_| FsError::StorageUnavailable {
            message: "lock poisoned".into(),
        })
    }

    /// Check that every ancestor of `path` exists as a directory.
    fn resolve_parents(tree: &Tree, path: &LogicalPath) -> Result<()> {
        for ancestor in path.ancestors() {
            match tree.get(&ancestor.to_string()) {
                Some(Node::Directory) => {}
                Some(Node::File(_)) => return Err(FsError::not_a_directory(ancestor)),
                None => return Err(FsError::not_found(ancestor)),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FilesystemBackend for EphemeralBackend {
    async fn read_binary(&self, path: &LogicalPath) -> Result<Bytes> {
        path.require_leaf()?;
        let tree = self.read_tree()?;
        Self::resolve_parents(&tree, path)?;
        match tree.get(&path.to_string()) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(Node::Directory) | None => Err(FsError::not_found(path)),
        }
    }

    async fn write_all(&self, path: &LogicalPath, data: Bytes) -> Result<()> {
        path.require_leaf()?;
        let mut tree = self.write_tree()?;

        for ancestor in path.ancestors() {
            let key = ancestor.to_string();
            match tree.get(&key) {
                Some(Node::Directory) => {}
                Some(Node::File(_)) => return Err(FsError::not_a_directory(ancestor)),
                None => {
                    tracing::trace!(dir = %key, "creating directory");
                    tree.insert(key, Node::Directory);
                }
            }
        }

        let key = path.to_string();
        if let Some(Node::Directory) = tree.get(&key) {
            return Err(FsError::IsADirectory { path: key });
        }
        tracing::debug!(path = %key, bytes = data.len(), "writing file");
        tree.insert(key, Node::File(data));
        Ok(())
    }

    async fn list_dir(&self, path: &LogicalPath) -> Result<Vec<DirEntry>> {
        let tree = self.read_tree()?;

        let prefix = if path.is_root() {
            String::new()
        } else {
            Self::resolve_parents(&tree, path)?;
            match tree.get(&path.to_string()) {
                Some(Node::Directory) => {}
                Some(Node::File(_)) => return Err(FsError::not_a_directory(path)),
                None => return Err(FsError::not_found(path)),
            }
            format!("{}/", path)
        };

        let entries = tree
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, node)| {
                let name = &key[prefix.len()..];
                (!name.contains('/')).then(|| DirEntry {
                    name: name.to_string(),
                    kind: node.kind(),
                })
            })
            .collect();
        Ok(entries)
    }

    async fn exists(&self, path: &LogicalPath) -> bool {
        if path.is_root() {
            return true;
        }
        match self.read_tree() {
            Ok(tree) => {
                Self::resolve_parents(&tree, path).is_ok() && tree.contains_key(&path.to_string())
            }
            Err(_) => false,
        }
    }

    async fn clear(&self) -> Result<()> {
        self.write_tree()?.clear();
        Ok(())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Ephemeral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lpath;

    #[tokio::test]
    async fn write_then_read() {
        let fs = EphemeralBackend::new();
        fs.write_all(&lpath!("a.txt"), Bytes::from_static(b"alpha"))
            .await
            .unwrap();
        assert_eq!(
            fs.read_binary(&lpath!("a.txt")).await.unwrap(),
            Bytes::from_static(b"alpha")
        );
    }

    #[tokio::test]
    async fn write_creates_every_ancestor() {
        let fs = EphemeralBackend::new();
        fs.write_all(&lpath!("x/y/z.bin"), Bytes::from_static(&[1, 2, 3]))
            .await
            .unwrap();

        assert_eq!(fs.list_dir(&lpath!("")).await.unwrap(), vec![DirEntry::directory("x")]);
        assert_eq!(fs.list_dir(&lpath!("x")).await.unwrap(), vec![DirEntry::directory("y")]);
        assert_eq!(fs.list_dir(&lpath!("x/y")).await.unwrap(), vec![DirEntry::file("z.bin")]);
        assert_eq!(fs.node_count(), 3);
    }

    #[tokio::test]
    async fn read_does_not_create_directories() {
        let fs = EphemeralBackend::new();
        let err = fs.read_binary(&lpath!("missing/file")).await.unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
        assert!(!fs.exists(&lpath!("missing")).await);
        assert_eq!(fs.node_count(), 0);
    }

    #[tokio::test]
    async fn reading_a_directory_is_not_found() {
        let fs = EphemeralBackend::new();
        fs.write_all(&lpath!("dir/f"), Bytes::new()).await.unwrap();
        let err = fs.read_binary(&lpath!("dir")).await.unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[tokio::test]
    async fn file_in_the_chain_is_not_a_directory() {
        let fs = EphemeralBackend::new();
        fs.write_all(&lpath!("a"), Bytes::from_static(b"file"))
            .await
            .unwrap();

        let err = fs.write_all(&lpath!("a/b"), Bytes::new()).await.unwrap_err();
        assert!(matches!(err, FsError::NotADirectory { .. }));

        let err = fs.list_dir(&lpath!("a")).await.unwrap_err();
        assert!(matches!(err, FsError::NotADirectory { .. }));
        assert!(!fs.exists(&lpath!("a/b")).await);
    }

    #[tokio::test]
    async fn writing_over_a_directory_fails() {
        let fs = EphemeralBackend::new();
        fs.write_all(&lpath!("dir/f"), Bytes::new()).await.unwrap();
        let err = fs.write_all(&lpath!("dir"), Bytes::new()).await.unwrap_err();
        assert!(matches!(err, FsError::IsADirectory { .. }));
    }

    #[tokio::test]
    async fn overwrite_truncates() {
        let fs = EphemeralBackend::new();
        let p = lpath!("f");
        fs.write_all(&p, Bytes::from_static(b"longer")).await.unwrap();
        fs.write_all(&p, Bytes::from_static(b"s")).await.unwrap();
        assert_eq!(fs.read_text(&p).await.unwrap(), "s");
    }

    #[tokio::test]
    async fn list_dir_ignores_similar_prefixes() {
        let fs = EphemeralBackend::new();
        fs.write_all(&lpath!("a/one"), Bytes::new()).await.unwrap();
        fs.write_all(&lpath!("ab/two"), Bytes::new()).await.unwrap();
        fs.write_all(&lpath!("a/nested/three"), Bytes::new())
            .await
            .unwrap();

        let mut names: Vec<String> = fs
            .list_dir(&lpath!("a"))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["nested", "one"]);
    }

    #[tokio::test]
    async fn root_operations_on_leaf_api_fail() {
        let fs = EphemeralBackend::new();
        assert!(matches!(
            fs.read_binary(&LogicalPath::root()).await.unwrap_err(),
            FsError::Path(_)
        ));
        assert!(fs.exists(&LogicalPath::root()).await);
    }

    #[tokio::test]
    async fn clear_empties_root() {
        let fs = EphemeralBackend::new();
        fs.write_all(&lpath!("dir/b.txt"), Bytes::new()).await.unwrap();
        fs.clear().await.unwrap();
        assert!(fs.list_dir(&LogicalPath::root()).await.unwrap().is_empty());
        assert!(!fs.exists(&lpath!("dir/b.txt")).await);
    }

    #[tokio::test]
    async fn read_text_rejects_invalid_utf8() {
        let fs = EphemeralBackend::new();
        fs.write_all(&lpath!("bin"), Bytes::from_static(&[0xff, 0xfe]))
            .await
            .unwrap();
        let err = fs.read_text(&lpath!("bin")).await.unwrap_err();
        assert!(matches!(err, FsError::InvalidText { .. }));
    }
}
