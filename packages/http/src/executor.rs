//! Fetch abstraction.
//!
//! Provisioning only needs "give me the bytes at this URL". This module puts
//! that behind a trait so the pipeline can run against a real HTTP client, a
//! local directory, or canned responses in tests.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use url::Url;

use crate::error::FetchError;

/// Trait for downloading the full body at a URL.
///
/// A non-success response is an error. Implementations decide timeouts;
/// nothing is retried.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        self.as_ref().fetch(url).await
    }
}

/// Production fetcher using reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a new fetcher with the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Create with default timeout of 30 seconds.
    pub fn with_default_timeout() -> Result<Self, FetchError> {
        Self::new(Duration::from_secs(30))
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        tracing::debug!(%url, "downloading");
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { url: url.clone() });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        tracing::debug!(%url, bytes = body.len(), "downloaded");
        Ok(body)
    }
}

/// Canned fetcher for tests.
///
/// Returns configured bodies by exact URL, records every request in order,
/// and answers `NotFound` for anything unknown.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    pub struct MockFetcher {
        /// Bodies keyed by URL.
        responses: Arc<Mutex<HashMap<String, Bytes>>>,
        /// URLs that fail with a transport error.
        failing: Arc<Mutex<HashSet<String>>>,
        /// Recorded requests for verification.
        recorded: Arc<Mutex<Vec<Url>>>,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a body for a URL.
        pub fn with_response(self, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(url.into(), body.into());
            self
        }

        /// Make requests for a URL fail.
        pub fn failing(self, url: impl Into<String>) -> Self {
            self.failing.lock().unwrap().insert(url.into());
            self
        }

        /// All requested URLs, in request order.
        pub fn requests(&self) -> Vec<Url> {
            self.recorded.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
            self.recorded.lock().unwrap().push(url.clone());

            if self.failing.lock().unwrap().contains(url.as_str()) {
                return Err(FetchError::Other {
                    message: format!("mock failure for {}", url),
                });
            }

            match self.responses.lock().unwrap().get(url.as_str()) {
                Some(body) => Ok(body.clone()),
                None => Err(FetchError::NotFound { url: url.clone() }),
            }
        }
    }
}
