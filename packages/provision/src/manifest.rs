//! Resource manifests: the ordered list of files to provision.
//!
//! On the wire a manifest is a JSON array:
//!
//! ```json
//! [
//!   { "filepath": "cube.glb" },
//!   { "filepath": "textures/main_mat_normal.png" },
//!   { "filepath": "remote/Box.glb", "fileUrl": "https://cdn.example.com/Box.glb" }
//! ]
//! ```
//!
//! `filePath` and `sourceUrl` are accepted as aliases.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use resfs_vfs::LogicalPath;

/// Name of the manifest document inside a project.
pub const MANIFEST_FILE_NAME: &str = "files.json";

/// Errors building or reading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("malformed manifest document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("descriptor {index} has an empty file path")]
    EmptyPath { index: usize },

    #[error("cannot derive source URL for {path}: {message}")]
    Source { path: String, message: String },

    #[error("unable to scan {}: {message}", path.display())]
    Scan { path: PathBuf, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One file to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Where the file lands, relative to the project base.
    #[serde(rename = "filepath", alias = "filePath")]
    pub file_path: LogicalPath,

    /// Explicit source. Absent means "derive from `file_path`".
    #[serde(
        rename = "fileUrl",
        alias = "sourceUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_url: Option<String>,
}

impl ResourceDescriptor {
    pub fn new(file_path: LogicalPath) -> Self {
        Self {
            file_path,
            source_url: None,
        }
    }

    pub fn with_source(file_path: LogicalPath, source_url: impl Into<String>) -> Self {
        Self {
            file_path,
            source_url: Some(source_url.into()),
        }
    }

    /// The URL to download this resource from.
    ///
    /// An explicit source is resolved against `base` (so it may be relative).
    /// Otherwise the file path is appended, segment by segment, to
    /// `base` joined with `resource_prefix`.
    pub fn source(&self, base: &Url, resource_prefix: &str) -> Result<Url, ManifestError> {
        let source_error = |message: String| ManifestError::Source {
            path: self.file_path.to_string(),
            message,
        };

        if let Some(explicit) = &self.source_url {
            return base.join(explicit).map_err(|e| source_error(e.to_string()));
        }

        let mut url = base
            .join(resource_prefix)
            .map_err(|e| source_error(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| source_error(format!("{} cannot be a base URL", base)))?
            .pop_if_empty()
            .extend(self.file_path.iter());
        Ok(url)
    }
}

/// An ordered sequence of descriptors. Order is provisioning order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceManifest {
    resources: Vec<ResourceDescriptor>,
}

impl ResourceManifest {
    pub fn new(resources: Vec<ResourceDescriptor>) -> Self {
        Self { resources }
    }

    /// Parse a manifest document. One bad entry rejects the whole document.
    pub fn from_json(data: &[u8]) -> Result<Self, ManifestError> {
        let manifest: ResourceManifest = serde_json::from_slice(data)?;
        if let Some(index) = manifest
            .resources
            .iter()
            .position(|r| r.file_path.is_root())
        {
            return Err(ManifestError::EmptyPath { index });
        }
        Ok(manifest)
    }

    /// Build a manifest listing every regular file under `project_root`.
    ///
    /// Entries are visited in file-name order so the result is stable across
    /// platforms. A `files.json` directly under the root is skipped.
    pub fn scan_dir(project_root: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let project_root = project_root.as_ref();
        let scan_error = |path: &Path, message: String| ManifestError::Scan {
            path: path.to_path_buf(),
            message,
        };

        let mut resources = Vec::new();
        for entry in walkdir::WalkDir::new(project_root)
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| scan_error(project_root, e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.depth() == 1 && entry.file_name() == MANIFEST_FILE_NAME {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(project_root)
                .map_err(|e| scan_error(entry.path(), e.to_string()))?;
            let segments = relative
                .iter()
                .map(|s| {
                    s.to_str()
                        .map(str::to_string)
                        .ok_or_else(|| scan_error(entry.path(), "non UTF-8 file name".into()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let file_path = LogicalPath::try_from_segments(segments)
                .map_err(|e| scan_error(entry.path(), e.to_string()))?;

            resources.push(ResourceDescriptor::new(file_path));
        }

        tracing::debug!(
            root = %project_root.display(),
            files = resources.len(),
            "scanned project directory"
        );
        Ok(Self { resources })
    }

    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the pretty-printed document to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResourceDescriptor> {
        self.resources.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.iter()
    }
}

impl FromIterator<ResourceDescriptor> for ResourceManifest {
    fn from_iter<I: IntoIterator<Item = ResourceDescriptor>>(iter: I) -> Self {
        Self {
            resources: iter.into_iter().collect(),
        }
    }
}
