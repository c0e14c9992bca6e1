use resfs_http::FetchError;
use resfs_vfs::{FsError, LogicalPath};
use url::Url;

use crate::manifest::ManifestError;

/// Errors that abort a provisioning session.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("unable to fetch manifest {url}: {source}")]
    Manifest {
        url: Url,
        #[source]
        source: FetchError,
    },

    #[error("invalid manifest: {0}")]
    ManifestFormat(#[from] ManifestError),

    #[error("unable to download {url}: {source}")]
    Download {
        url: Url,
        #[source]
        source: FetchError,
    },

    #[error("unable to write {path}: {source}")]
    Write {
        path: LogicalPath,
        #[source]
        source: FsError,
    },

    #[error("invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("provisioning session already failed: {reason}")]
    Aborted { reason: String },
}

impl ProvisionError {
    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ProvisionError::Manifest { .. } | ProvisionError::ManifestFormat(_) => {
                "Unable to fetch resource files, please try again later"
            }
            ProvisionError::Download { .. } => {
                "Unable to download resource files, please try again later"
            }
            ProvisionError::Write { .. } => "Unable to store resource files on this device",
            ProvisionError::BaseUrl(_) => "Resource server address is invalid",
            ProvisionError::Aborted { .. } => "File system preparation failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
