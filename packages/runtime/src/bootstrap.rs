//! Bringing the engine up after provisioning.

use std::sync::Arc;

use resfs_http::Fetcher;
use resfs_provision::{NullProgress, ProgressSink, ProvisionReport, ProvisioningPipeline};
use resfs_vfs::FilesystemBackend;

use crate::config::BootstrapConfig;
use crate::engine::{attach, EngineContext, EngineLoader};
use crate::error::{BootstrapError, Result};
use crate::handle::RuntimeHandle;
use crate::pump::TaskPump;
use crate::worker::WorkerHandle;

pub const STARTING_STATUS: &str = "Starting runtime";

/// A running engine.
#[derive(Debug)]
pub struct Launched {
    pub handle: RuntimeHandle,
    pub pump: TaskPump,
    pub report: ProvisionReport,
}

impl Launched {
    /// Stop the pump and the worker, if any.
    pub async fn shutdown(self) {
        self.pump.stop();
        self.handle.shutdown().await;
    }
}

/// One attempt at provisioning the filesystem and starting the engine.
///
/// There is no retry and no cancellation: [`launch`](Self::launch) runs to
/// completion or to the first failure.
pub struct RuntimeBootstrap {
    config: BootstrapConfig,
    backend: Arc<dyn FilesystemBackend>,
    fetcher: Arc<dyn Fetcher>,
    loader: Arc<dyn EngineLoader>,
    progress: Arc<dyn ProgressSink>,
}

impl RuntimeBootstrap {
    pub fn new(
        config: BootstrapConfig,
        backend: Arc<dyn FilesystemBackend>,
        fetcher: Arc<dyn Fetcher>,
        loader: Arc<dyn EngineLoader>,
    ) -> Self {
        Self {
            config,
            backend,
            fetcher,
            loader,
            progress: Arc::new(NullProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    pub async fn launch(self) -> std::result::Result<Launched, BootstrapError> {
        // The pipeline reports its own failures through the progress sink.
        let report = ProvisioningPipeline::new(
            self.config.pipeline.clone(),
            self.backend.clone(),
            self.fetcher.clone(),
        )
        .with_progress(self.progress.clone())
        .run()
        .await?;

        self.progress.status(STARTING_STATUS);
        let handle = match self.start_engine().await {
            Ok(handle) => handle,
            Err(e) => {
                let e = BootstrapError::from(e);
                tracing::error!(module = %self.config.module, error = %e, "runtime bootstrap failed");
                self.progress.failure(e.user_message());
                return Err(e);
            }
        };

        let pump = TaskPump::start(handle.clone(), self.config.pump_interval());
        tracing::info!(
            module = %self.config.module,
            site = ?handle.site(),
            resources = report.resources,
            "runtime launched"
        );
        Ok(Launched {
            handle,
            pump,
            report,
        })
    }

    async fn start_engine(&self) -> Result<RuntimeHandle> {
        let module = &self.config.module;
        let mut engine = self.loader.load(module)?;
        let memory = attach(
            engine.as_mut(),
            EngineContext::main_thread(self.backend.clone())
                .with_project_base(self.config.pipeline.project_base.clone()),
        )
        .await?;

        let threads = match self.config.execution.thread_pool_size() {
            None => return Ok(RuntimeHandle::main_thread(engine)),
            Some(threads) => threads,
        };

        // The region moves to the worker; nothing on this side keeps it.
        drop(engine);
        let worker = WorkerHandle::spawn(
            &self.config.worker_name,
            threads,
            self.loader.clone(),
            self.backend.clone(),
            self.config.pipeline.project_base.clone(),
        )
        .await?;
        match worker.start(memory, module).await {
            Ok(ready) => {
                tracing::info!(threads = ready.threads, "engine relocated to worker");
                Ok(RuntimeHandle::worker(worker))
            }
            Err(e) => {
                worker.shutdown().await;
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for RuntimeBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeBootstrap")
            .field("config", &self.config)
            .field("backend", &self.backend.kind())
            .finish()
    }
}
