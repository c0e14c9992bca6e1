//! The filesystem capability shared by every backend.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{FsError, Result};
use crate::path::LogicalPath;

/// Kind of a node in a backend tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Directory,
}

/// An immediate child returned by [`FilesystemBackend::list_dir`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub kind: NodeKind,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// Which concrete backend sits behind a `dyn FilesystemBackend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Persistent,
    Ephemeral,
}

/// Uniform asynchronous access to a hierarchical file store.
///
/// Every call resolves its path from the root again; no directory handle
/// outlives the call that obtained it. Implementations take `&self` so a
/// single backend can be shared as `Arc<dyn FilesystemBackend>` between the
/// provisioning pipeline and the engine.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Arc<dyn FilesystemBackend>`.
#[async_trait]
pub trait FilesystemBackend: Send + Sync {
    /// Read a whole file.
    ///
    /// Intermediate directories are never created. Fails with `NotFound`
    /// if any segment is missing or the leaf is a directory.
    async fn read_binary(&self, path: &LogicalPath) -> Result<Bytes>;

    /// Read a whole file as UTF-8 text.
    async fn read_text(&self, path: &LogicalPath) -> Result<String> {
        let bytes = self.read_binary(path).await?;
        String::from_utf8(bytes.to_vec()).map_err(|source| FsError::InvalidText {
            path: path.to_string(),
            source,
        })
    }

    /// Create or truncate a file, creating missing parent directories.
    ///
    /// Readers never observe a partially written leaf.
    async fn write_all(&self, path: &LogicalPath, data: Bytes) -> Result<()>;

    /// List the immediate children of a directory.
    ///
    /// Order is backend-defined.
    async fn list_dir(&self, path: &LogicalPath) -> Result<Vec<DirEntry>>;

    /// Check whether the path resolves to a file or a directory.
    ///
    /// Resolution failures yield `false`, never an error.
    async fn exists(&self, path: &LogicalPath) -> bool;

    /// Remove everything under the root.
    async fn clear(&self) -> Result<()> {
        Err(FsError::Unsupported("clear"))
    }

    /// The concrete backend variant.
    fn kind(&self) -> BackendKind;
}

/// Decode bytes as little-endian UTF-16, one code unit per byte pair.
///
/// Legacy text format only. A trailing odd byte is ignored and unpaired
/// surrogates become U+FFFD.
pub fn decode_utf16_pairs(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
