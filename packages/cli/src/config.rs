//! Command line configuration.
//!
//! A JSON file may set the backend and pipeline; flags override it:
//!
//! ```json
//! {
//!   "backend": { "kind": "persistent", "origin": "http://localhost:3000" },
//!   "pipeline": { "base_url": "http://localhost:3000/", "project_base": "examples/blank" }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use resfs::{BackendConfig, PipelineConfig, Url};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// `None` means a persistent store keyed by the pipeline's origin.
    pub backend: Option<BackendConfig>,
    pub pipeline: PipelineConfig,
}

/// Flag overrides applied on top of a [`CliConfig`].
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ephemeral: bool,
    pub storage_root: Option<PathBuf>,
    pub origin: Option<String>,
    pub base_url: Option<Url>,
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(base_url) = overrides.base_url {
            self.pipeline.base_url = base_url;
        }

        if overrides.ephemeral {
            self.backend = Some(BackendConfig::Ephemeral);
        } else if overrides.storage_root.is_some() || overrides.origin.is_some() {
            let (root, origin) = match self.backend.take() {
                Some(BackendConfig::Persistent {
                    storage_root,
                    origin,
                }) => (storage_root, Some(origin)),
                _ => (None, None),
            };
            self.backend = Some(BackendConfig::Persistent {
                storage_root: overrides.storage_root.or(root),
                origin: overrides
                    .origin
                    .or(origin)
                    .unwrap_or_else(|| self.default_origin()),
            });
        }
    }

    /// The backend to open, falling back to a persistent store for the
    /// pipeline's origin.
    pub fn backend(&self) -> BackendConfig {
        self.backend
            .clone()
            .unwrap_or_else(|| BackendConfig::Persistent {
                storage_root: None,
                origin: self.default_origin(),
            })
    }

    fn default_origin(&self) -> String {
        self.pipeline.base_url.origin().ascii_serialization()
    }
}
