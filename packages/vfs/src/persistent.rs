//! Durable backend rooted in an origin-scoped directory on local disk.

use std::io;
use std::path::{Path as HostPath, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::backend::{BackendKind, DirEntry, FilesystemBackend, NodeKind};
use crate::error::{FsError, Result};
use crate::path::LogicalPath;

/// Suffix of the sibling directory holding writes in flight.
const STAGING_DIR_SUFFIX: &str = ".resfs-staging";

/// Turn an application origin into a single directory name.
///
/// `http://localhost:3000` becomes `http_localhost_3000`.
pub fn origin_key(origin: &str) -> String {
    let mut key = String::with_capacity(origin.len());
    for c in origin.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
            key.push(c.to_ascii_lowercase());
        } else if !key.ends_with('_') {
            key.push('_');
        }
    }
    let key = key.trim_matches(|c| c == '_' || c == '.').to_string();
    if key.is_empty() {
        "default".to_string()
    } else {
        key
    }
}

/// Default parent directory for persistent stores, `<data dir>/resfs`.
pub fn default_storage_root() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("resfs"))
}

/// A filesystem backend that keeps its tree under
/// `<storage_root>/<origin_key>` and survives process restarts.
///
/// Paths are resolved one directory at a time on every call. Reads never
/// create anything; writes create each missing directory in turn.
///
/// Writes land in a sibling staging directory (`.<origin_key>.resfs-staging`)
/// and are renamed into the tree, so nothing partial is ever visible inside it.
#[derive(Debug, Clone)]
pub struct PersistentBackend {
    root: PathBuf,
    staging: PathBuf,
}

impl PersistentBackend {
    /// Open (creating if needed) the store for `origin` under `storage_root`.
    pub async fn open(storage_root: impl AsRef<HostPath>, origin: &str) -> Result<Self> {
        let root = storage_root.as_ref().join(origin_key(origin));
        Self::open_dir(root).await
    }

    /// Open a store rooted directly at `root`.
    pub async fn open_dir(root: PathBuf) -> Result<Self> {
        let unavailable = |root: &HostPath, reason: String| FsError::StorageUnavailable {
            message: format!("{}: {}", root.display(), reason),
        };

        fs::create_dir_all(&root)
            .await
            .map_err(|e| unavailable(&root, e.to_string()))?;

        let attr = fs::metadata(&root)
            .await
            .map_err(|e| unavailable(&root, e.to_string()))?;
        if !attr.is_dir() {
            return Err(unavailable(&root, "root path must be a directory".into()));
        }
        if attr.permissions().readonly() {
            return Err(unavailable(&root, "root directory must be writable".into()));
        }

        let root = fs::canonicalize(&root)
            .await
            .map_err(|e| unavailable(&root, e.to_string()))?;

        let (Some(parent), Some(name)) = (root.parent(), root.file_name()) else {
            return Err(unavailable(&root, "root must not be a filesystem root".into()));
        };
        let staging = parent.join(format!(
            ".{}{}",
            name.to_string_lossy(),
            STAGING_DIR_SUFFIX
        ));
        fs::create_dir_all(&staging)
            .await
            .map_err(|e| unavailable(&staging, e.to_string()))?;

        tracing::debug!(root = %root.display(), "opened persistent store");
        Ok(Self { root, staging })
    }

    /// The host directory backing this store.
    pub fn root(&self) -> &HostPath {
        &self.root
    }

    fn host_path(&self, path: &LogicalPath) -> PathBuf {
        let mut host = self.root.clone();
        host.extend(path.iter());
        host
    }

    /// Walk every ancestor of `path` without creating anything.
    async fn resolve_parents(&self, path: &LogicalPath) -> Result<()> {
        for ancestor in path.ancestors() {
            self.resolve_dir(&ancestor).await?;
        }
        Ok(())
    }

    async fn resolve_dir(&self, dir: &LogicalPath) -> Result<PathBuf> {
        let host = self.host_path(dir);
        match fs::metadata(&host).await {
            Ok(attr) if attr.is_dir() => Ok(host),
            Ok(_) => Err(FsError::not_a_directory(dir)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FsError::not_found(dir)),
            Err(e) => Err(e.into()),
        }
    }

    /// Walk every ancestor of `path`, creating missing directories.
    async fn create_parents(&self, path: &LogicalPath) -> Result<()> {
        for ancestor in path.ancestors() {
            let host = self.host_path(&ancestor);
            match fs::metadata(&host).await {
                Ok(attr) if attr.is_dir() => continue,
                Ok(_) => return Err(FsError::not_a_directory(&ancestor)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            tracing::trace!(dir = %host.display(), "creating directory");
            match fs::create_dir(&host).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if !fs::metadata(&host).await?.is_dir() {
                        return Err(FsError::not_a_directory(&ancestor));
                    }
                }
                Err(e) => {
                    return Err(FsError::Write {
                        path: ancestor.to_string(),
                        message: e.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        self.staging.join(uuid::Uuid::new_v4().simple().to_string())
    }
}

#[async_trait]
impl FilesystemBackend for PersistentBackend {
    async fn read_binary(&self, path: &LogicalPath) -> Result<Bytes> {
        path.require_leaf()?;
        self.resolve_parents(path).await?;

        let host = self.host_path(path);
        tracing::debug!(path = %host.display(), "reading file");
        match fs::metadata(&host).await {
            Ok(attr) if attr.is_file() => {}
            Ok(_) => return Err(FsError::not_found(path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(FsError::not_found(path)),
            Err(e) => return Err(e.into()),
        }
        Ok(Bytes::from(fs::read(&host).await?))
    }

    async fn write_all(&self, path: &LogicalPath, data: Bytes) -> Result<()> {
        path.require_leaf()?;
        self.create_parents(path).await?;

        let target = self.host_path(path);
        if let Ok(attr) = fs::metadata(&target).await {
            if attr.is_dir() {
                return Err(FsError::IsADirectory {
                    path: path.to_string(),
                });
            }
        }

        tracing::debug!(path = %target.display(), bytes = data.len(), "writing file");
        let staging = self.staging_path();
        let write_error = |e: io::Error| FsError::Write {
            path: path.to_string(),
            message: e.to_string(),
        };

        if let Err(e) = fs::write(&staging, &data).await {
            let _ = fs::remove_file(&staging).await;
            return Err(write_error(e));
        }
        if let Err(e) = fs::rename(&staging, &target).await {
            let _ = fs::remove_file(&staging).await;
            return Err(write_error(e));
        }
        Ok(())
    }

    async fn list_dir(&self, path: &LogicalPath) -> Result<Vec<DirEntry>> {
        self.resolve_parents(path).await?;
        let host = if path.is_root() {
            self.root.clone()
        } else {
            self.resolve_dir(path).await?
        };

        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&host).await?;
        while let Some(entry) = dir.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!(entry = ?entry.path(), "skipping entry with non UTF-8 name");
                continue;
            };
            let file_type = entry.file_type().await?;
            let kind = if file_type.is_dir() {
                NodeKind::Directory
            } else if file_type.is_file() {
                NodeKind::File
            } else {
                continue;
            };
            entries.push(DirEntry { name, kind });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn exists(&self, path: &LogicalPath) -> bool {
        if path.is_root() {
            return true;
        }
        if self.resolve_parents(path).await.is_err() {
            return false;
        }
        fs::metadata(self.host_path(path))
            .await
            .map(|attr| attr.is_dir() || attr.is_file())
            .unwrap_or(false)
    }

    async fn clear(&self) -> Result<()> {
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let entry_path = entry.path();
            if entry.file_type().await?.is_dir() {
                fs::remove_dir_all(&entry_path).await?;
            } else {
                fs::remove_file(&entry_path).await?;
            }
        }
        tracing::debug!(root = %self.root.display(), "cleared persistent store");
        Ok(())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Persistent
    }
}
