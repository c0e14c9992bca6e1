//! Backend selection.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::FilesystemBackend;
use crate::ephemeral::EphemeralBackend;
use crate::error::{FsError, Result};
use crate::persistent::{default_storage_root, PersistentBackend};

/// Which backend to construct.
///
/// ```rust
/// use resfs_vfs::BackendConfig;
///
/// let config: BackendConfig = serde_json::from_str(
///     r#"{ "kind": "persistent", "origin": "http://localhost:3000" }"#,
/// ).unwrap();
/// assert!(matches!(config, BackendConfig::Persistent { .. }));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-memory, gone when the process exits.
    #[default]
    Ephemeral,
    /// On disk under `<storage_root>/<origin key>`.
    Persistent {
        /// Parent directory for all origins. Defaults to `<data dir>/resfs`.
        #[serde(default)]
        storage_root: Option<PathBuf>,
        origin: String,
    },
}

impl BackendConfig {
    /// Construct the configured backend.
    pub async fn open(&self) -> Result<Arc<dyn FilesystemBackend>> {
        match self {
            BackendConfig::Ephemeral => Ok(Arc::new(EphemeralBackend::new())),
            BackendConfig::Persistent {
                storage_root,
                origin,
            } => {
                let storage_root = match storage_root {
                    Some(root) => root.clone(),
                    None => default_storage_root().ok_or_else(|| FsError::StorageUnavailable {
                        message: "no data directory for this platform".to_string(),
                    })?,
                };
                let backend = PersistentBackend::open(storage_root, origin).await?;
                Ok(Arc::new(backend))
            }
        }
    }
}
