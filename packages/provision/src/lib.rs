//! # resfs-provision
//!
//! Downloads the resources listed in a manifest into a filesystem backend.
//!
//! A session clears the store, fetches `files.json`, then downloads each
//! listed resource in order and writes it below the project base, reporting
//! progress along the way:
//!
//! ```ignore
//! use std::sync::Arc;
//! use resfs_http::HttpFetcher;
//! use resfs_provision::{LogProgress, PipelineConfig, ProvisioningPipeline};
//! use resfs_vfs::EphemeralBackend;
//!
//! let mut pipeline = ProvisioningPipeline::new(
//!     PipelineConfig::default(),
//!     Arc::new(EphemeralBackend::new()),
//!     Arc::new(HttpFetcher::with_default_timeout()?),
//! )
//! .with_progress(Arc::new(LogProgress));
//!
//! let report = pipeline.run().await?;
//! println!("{} files, {} bytes", report.resources, report.bytes);
//! ```
//!
//! [`ResourceManifest::scan_dir`] builds the manifest document from a local
//! project directory.

pub mod config;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod progress;

pub use config::PipelineConfig;
pub use error::{ProvisionError, Result};
pub use manifest::{ManifestError, ResourceDescriptor, ResourceManifest, MANIFEST_FILE_NAME};
pub use pipeline::{PipelineState, ProvisionReport, ProvisioningPipeline, ProvisioningSession};
pub use progress::{LogProgress, NullProgress, ProgressEvent, ProgressSink};
