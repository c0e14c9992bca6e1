//! Error types for filesystem backends.

use thiserror::Error;

use crate::path::PathError;

/// Errors returned by [`FilesystemBackend`](crate::FilesystemBackend) operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// The backend root could not be obtained.
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },

    /// A segment of the path does not exist, or the leaf is not a file.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// A segment that must be a directory exists as a file.
    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    /// The leaf of a write is an existing directory.
    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    /// The path itself is malformed or unusable for the operation.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// The backend rejected a write.
    #[error("write failed for {path}: {message}")]
    Write { path: String, message: String },

    /// File contents are not valid UTF-8.
    #[error("invalid UTF-8 text in {path}")]
    InvalidText {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// The backend does not implement the operation.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// True for errors raised while resolving a path to a node.
    ///
    /// These are the errors `exists` turns into `false`.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            FsError::NotFound { .. } | FsError::NotADirectory { .. } | FsError::IsADirectory { .. }
        )
    }

    pub(crate) fn not_found(path: impl ToString) -> Self {
        FsError::NotFound {
            path: path.to_string(),
        }
    }

    pub(crate) fn not_a_directory(path: impl ToString) -> Self {
        FsError::NotADirectory {
            path: path.to_string(),
        }
    }
}

/// Result type alias for filesystem operations.
pub type Result<T> = std::result::Result<T, FsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn error_display() {
        let e = FsError::not_found("a/b.txt");
        assert_eq!(e.to_string(), "not found: a/b.txt");

        let e = FsError::Write {
            path: "x".to_string(),
            message: "disk full".to_string(),
        };
        assert!(e.to_string().contains("disk full"));
    }

    #[test]
    fn resolution_errors_are_classified() {
        assert!(FsError::not_found("a").is_resolution());
        assert!(FsError::not_a_directory("a").is_resolution());
        assert!(FsError::IsADirectory {
            path: "a".to_string()
        }
        .is_resolution());
        assert!(!FsError::Unsupported("clear").is_resolution());
        assert!(!FsError::StorageUnavailable {
            message: "gone".to_string()
        }
        .is_resolution());
    }

    #[test]
    fn invalid_text_has_source() {
        let source = String::from_utf8(vec![0xff]).unwrap_err();
        let e = FsError::InvalidText {
            path: "a".to_string(),
            source,
        };
        assert!(StdError::source(&e).is_some());
    }

    #[test]
    fn path_error_conversion() {
        let e: FsError = PathError::InvalidPath {
            message: "root".to_string(),
        }
        .into();
        assert!(matches!(e, FsError::Path(_)));
    }
}
