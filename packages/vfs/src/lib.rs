//! # resfs-vfs
//!
//! A path-addressed virtual filesystem with interchangeable backends.
//!
//! - `LogicalPath`: `/`-delimited path, normalized and validated
//! - `FilesystemBackend`: the async capability every backend provides
//!   (read bytes, read text, write bytes, list a directory, test existence)
//! - `PersistentBackend`: directory tree on disk, scoped to an origin
//! - `EphemeralBackend`: in-memory tree that disappears with the process
//! - `BackendConfig`: picks one of the two at construction time
//!
//! Callers hold an `Arc<dyn FilesystemBackend>` and never learn which variant
//! they are talking to.
//!
//! # Example
//!
//! ```rust
//! use resfs_vfs::{lpath, BackendConfig, FilesystemBackend};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let fs = BackendConfig::Ephemeral.open().await.unwrap();
//! fs.write_all(&lpath!("textures/wood.png"), vec![0x89, b'P'].into()).await.unwrap();
//!
//! let entries = fs.list_dir(&lpath!("textures")).await.unwrap();
//! assert_eq!(entries[0].name, "wood.png");
//! # });
//! ```

pub use bytes::Bytes;

mod backend;
mod config;
mod ephemeral;
mod error;
mod path;
mod persistent;

pub use backend::{decode_utf16_pairs, BackendKind, DirEntry, FilesystemBackend, NodeKind};
pub use config::BackendConfig;
pub use ephemeral::EphemeralBackend;
pub use error::{FsError, Result};
pub use path::{LogicalPath, PathError};
pub use persistent::{default_storage_root, origin_key, PersistentBackend};
