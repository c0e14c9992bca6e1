use std::path::PathBuf;

use resfs::provision::ManifestError;
use resfs::{FetchError, FsError, PathError, ProvisionError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("unable to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
