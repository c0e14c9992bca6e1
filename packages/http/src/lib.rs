//! # resfs-http
//!
//! The fetch primitive used by provisioning.
//!
//! ## Fetchers
//!
//! ### HttpFetcher
//!
//! Downloads over HTTP(S) with reqwest. Any non-2xx status is an error:
//!
//! ```ignore
//! use resfs_http::{Fetcher, HttpFetcher};
//!
//! let fetcher = HttpFetcher::with_default_timeout()?;
//! let manifest = fetcher.fetch(&"http://localhost:3000/files.json".parse()?).await?;
//! ```
//!
//! ### LocalFetcher
//!
//! Maps URL paths onto a local directory, for running without a server:
//!
//! ```ignore
//! use resfs_http::{Fetcher, LocalFetcher};
//!
//! let fetcher = LocalFetcher::new("web");
//! let bytes = fetcher.fetch(&"http://localhost/res/cube.glb".parse()?).await?;
//! ```
//!
//! ### MockFetcher
//!
//! Canned responses for tests, behind the `test-utils` feature.

pub mod error;
pub mod executor;
pub mod local;

// Re-export main types
pub use error::FetchError;
pub use executor::{Fetcher, HttpFetcher};
pub use local::LocalFetcher;

#[cfg(any(test, feature = "test-utils"))]
pub use executor::mock::MockFetcher;

pub use url::Url;
