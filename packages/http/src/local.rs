//! Fetcher that reads resources from a local directory.
//!
//! Used when the project files already sit on disk next to the binary, so
//! provisioning can run without an HTTP server. The URL's path is mapped onto
//! the directory; host and query are ignored. `file://` URLs are read as-is.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::FetchError;
use crate::executor::Fetcher;

#[derive(Debug, Clone)]
pub struct LocalFetcher {
    root: PathBuf,
}

impl LocalFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &Url) -> Result<PathBuf, FetchError> {
        if url.scheme() == "file" {
            return url.to_file_path().map_err(|()| FetchError::InvalidUrl {
                message: format!("not a local file URL: {}", url),
            });
        }

        let mut path = self.root.clone();
        for segment in url.path_segments().into_iter().flatten() {
            if segment.is_empty() {
                continue;
            }
            let decoded = urlencoding::decode(segment).map_err(|e| FetchError::InvalidUrl {
                message: format!("{}: {}", url, e),
            })?;
            // Only plain names may be appended below the root.
            let mut parts = Path::new(decoded.as_ref()).components();
            match (parts.next(), parts.next()) {
                (Some(Component::Normal(name)), None) => path.push(name),
                _ => {
                    return Err(FetchError::InvalidUrl {
                        message: format!("segment {:?} escapes {}", decoded, self.root.display()),
                    })
                }
            }
        }
        Ok(path)
    }
}

#[async_trait]
impl Fetcher for LocalFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        let path = self.resolve(url)?;
        tracing::debug!(%url, path = %path.display(), "reading local resource");
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound { url: url.clone() })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn maps_url_path_onto_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("res/textures")).unwrap();
        std::fs::write(dir.path().join("res/textures/a b.png"), b"png").unwrap();

        let fetcher = LocalFetcher::new(dir.path());
        let url = Url::parse("http://localhost:3000/res/textures/a%20b.png").unwrap();
        assert_eq!(fetcher.fetch(&url).await.unwrap(), Bytes::from_static(b"png"));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = LocalFetcher::new(dir.path());
        let url = Url::parse("http://localhost/nothing.bin").unwrap();
        assert!(matches!(
            fetcher.fetch(&url).await.unwrap_err(),
            FetchError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn encoded_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = LocalFetcher::new(dir.path());
        let url = Url::parse("http://localhost/res/..%2Fsecret").unwrap();
        assert!(matches!(
            fetcher.fetch(&url).await.unwrap_err(),
            FetchError::InvalidUrl { .. }
        ));
    }

    #[tokio::test]
    async fn file_urls_are_read_directly() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("files.json");
        std::fs::write(&file, b"[]").unwrap();

        let fetcher = LocalFetcher::new("/unused");
        let url = Url::from_file_path(&file).unwrap();
        assert_eq!(fetcher.fetch(&url).await.unwrap(), Bytes::from_static(b"[]"));
    }
}
