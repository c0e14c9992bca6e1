//! The provisioning state machine.
//!
//! ```text
//! Idle -> ClearingStore -> FetchingManifest -> DownloadingResource { 0..n } -> Completed
//!                                  \                     \
//!                                   `--------------------`--> Failed(reason)
//! ```
//!
//! Resources are downloaded strictly one after another, in manifest order.

use std::sync::Arc;

use resfs_http::Fetcher;
use resfs_vfs::FilesystemBackend;

use crate::config::PipelineConfig;
use crate::error::{ProvisionError, Result};
use crate::manifest::ResourceManifest;
use crate::progress::{NullProgress, ProgressSink};

pub const PREPARING_STATUS: &str = "Preparing file system";
pub const FETCHING_MANIFEST_STATUS: &str = "Fetching resource list";
pub const READY_STATUS: &str = "Ready";

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    ClearingStore,
    FetchingManifest,
    DownloadingResource { index: usize, total: usize },
    Completed,
    Failed(String),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed(_))
    }
}

/// Progress bookkeeping for the session currently in flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvisioningSession {
    pub current: usize,
    pub total: usize,
    pub overlay_visible: bool,
}

impl ProvisioningSession {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Outcome of a completed session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub resources: usize,
    pub bytes: u64,
}

pub struct ProvisioningPipeline {
    config: PipelineConfig,
    backend: Arc<dyn FilesystemBackend>,
    fetcher: Arc<dyn Fetcher>,
    progress: Arc<dyn ProgressSink>,
    state: PipelineState,
    manifest: ResourceManifest,
    session: Option<ProvisioningSession>,
    last_fraction: f64,
    report: ProvisionReport,
}

impl ProvisioningPipeline {
    pub fn new(
        config: PipelineConfig,
        backend: Arc<dyn FilesystemBackend>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            config,
            backend,
            fetcher,
            progress: Arc::new(NullProgress),
            state: PipelineState::Idle,
            manifest: ResourceManifest::default(),
            session: None,
            last_fraction: 0.0,
            report: ProvisionReport::default(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn session(&self) -> Option<&ProvisioningSession> {
        self.session.as_ref()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn FilesystemBackend> {
        &self.backend
    }

    /// Perform exactly one transition. Terminal states are left unchanged.
    ///
    /// On error the pipeline moves to `Failed`, reports the failure through
    /// the progress sink and returns the error.
    pub async fn step(&mut self) -> Result<&PipelineState> {
        let next = match self.state.clone() {
            PipelineState::Idle => Ok(self.begin()),
            PipelineState::ClearingStore => Ok(self.clear_store().await),
            PipelineState::FetchingManifest => self.fetch_manifest().await,
            PipelineState::DownloadingResource { index, total } => {
                self.download(index, total).await
            }
            PipelineState::Completed | PipelineState::Failed(_) => return Ok(&self.state),
        };

        match next {
            Ok(state) => {
                tracing::info!(from = ?self.state, to = ?state, "provisioning transition");
                self.state = state;
                if self.state == PipelineState::Completed {
                    self.finish();
                }
                Ok(&self.state)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Step until a terminal state is reached.
    pub async fn run(&mut self) -> Result<ProvisionReport> {
        loop {
            match self.state {
                PipelineState::Completed => return Ok(self.report),
                PipelineState::Failed(ref reason) => {
                    return Err(ProvisionError::Aborted {
                        reason: reason.clone(),
                    })
                }
                _ => {}
            }
            self.step().await?;
        }
    }

    fn begin(&mut self) -> PipelineState {
        self.session = Some(ProvisioningSession {
            overlay_visible: true,
            ..Default::default()
        });
        self.last_fraction = 0.0;
        self.report = ProvisionReport::default();
        self.progress.overlay(true);
        self.progress.status(PREPARING_STATUS);
        self.progress.fraction(0.0);
        PipelineState::ClearingStore
    }

    async fn clear_store(&mut self) -> PipelineState {
        if let Err(e) = self.backend.clear().await {
            tracing::warn!(backend = ?self.backend.kind(), error = %e, "unable to clear store");
        }
        self.progress.status(FETCHING_MANIFEST_STATUS);
        PipelineState::FetchingManifest
    }

    async fn fetch_manifest(&mut self) -> Result<PipelineState> {
        let url = self.config.manifest_url()?;
        let data = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|source| ProvisionError::Manifest {
                url: url.clone(),
                source,
            })?;
        self.manifest = ResourceManifest::from_json(&data)?;

        let total = self.manifest.len();
        tracing::info!(%url, resources = total, "fetched resource manifest");
        if let Some(session) = self.session.as_mut() {
            session.total = total;
        }

        if total == 0 {
            Ok(PipelineState::Completed)
        } else {
            Ok(PipelineState::DownloadingResource { index: 0, total })
        }
    }

    async fn download(&mut self, index: usize, total: usize) -> Result<PipelineState> {
        let descriptor = self
            .manifest
            .get(index)
            .cloned()
            .ok_or_else(|| ProvisionError::Aborted {
                reason: format!("resource {} of {} missing from manifest", index + 1, total),
            })?;

        let url = descriptor.source(&self.config.base(), &self.config.resource_prefix)?;
        let contents = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|source| ProvisionError::Download {
                url: url.clone(),
                source,
            })?;

        let target = self.config.project_base.join(&descriptor.file_path);
        let size = contents.len() as u64;
        self.backend
            .write_all(&target, contents)
            .await
            .map_err(|source| ProvisionError::Write {
                path: target.clone(),
                source,
            })?;

        self.report.resources += 1;
        self.report.bytes += size;
        tracing::debug!(path = %target, %url, bytes = size, "provisioned resource");

        let done = index + 1;
        if let Some(session) = self.session.as_mut() {
            session.current = done;
        }
        self.emit_fraction(done as f64 / total as f64);
        if self.config.status_lines {
            self.progress.status(&format!(
                "Downloaded {} ({}/{})",
                descriptor.file_path, done, total
            ));
        }

        if done == total {
            return Ok(PipelineState::Completed);
        }
        if self.config.delay_ms > 0 {
            tokio::time::sleep(self.config.delay()).await;
        }
        Ok(PipelineState::DownloadingResource { index: done, total })
    }

    fn finish(&mut self) {
        self.emit_fraction(1.0);
        self.progress.status(READY_STATUS);
        self.progress.overlay(false);
        if let Some(session) = self.session.as_mut() {
            session.overlay_visible = false;
        }
        tracing::info!(
            resources = self.report.resources,
            bytes = self.report.bytes,
            "provisioning complete"
        );
    }

    fn fail(&mut self, error: &ProvisionError) {
        tracing::error!(state = ?self.state, %error, "provisioning failed");
        self.state = PipelineState::Failed(error.to_string());
        self.session = None;
        self.progress.failure(error.user_message());
    }

    // Never report a smaller fraction than one already shown.
    fn emit_fraction(&mut self, value: f64) {
        let value = value.clamp(0.0, 1.0).max(self.last_fraction);
        if value > self.last_fraction {
            self.last_fraction = value;
            self.progress.fraction(value);
        }
    }
}
