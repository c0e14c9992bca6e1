//! Worker relocation.
//!
//! The worker is a dedicated OS thread owning a multi-thread tokio runtime.
//! The initiating side talks to it over a typed request channel: one
//! `Start` carrying the memory region and module name, then any number of
//! `DrivePending` requests, then `Shutdown`.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use resfs_vfs::{FilesystemBackend, LogicalPath};
use tokio::sync::{mpsc, oneshot};

use crate::engine::{attach, Engine, EngineContext, EngineLoader, ExecutionSite};
use crate::error::{Result, RuntimeError};
use crate::memory::SharedMemoryRegion;

const REQUEST_CAPACITY: usize = 32;

/// Messages understood by a worker.
#[derive(Debug)]
pub enum WorkerRequest {
    /// Take ownership of `memory` and initialize `module` against it.
    Start {
        memory: SharedMemoryRegion,
        module: String,
        reply: oneshot::Sender<Result<WorkerReady>>,
    },
    /// Advance the engine's pending work once.
    DrivePending { reply: oneshot::Sender<Result<usize>> },
    Shutdown,
}

/// Sent back once the worker's engine is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReady {
    pub threads: usize,
}

/// Thread pool size used when none is configured.
pub fn default_thread_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// The initiating side of a worker. Cheap to clone.
#[derive(Clone, Debug)]
pub struct WorkerHandle {
    tx: mpsc::Sender<WorkerRequest>,
    threads: usize,
    thread: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl WorkerHandle {
    /// Start the worker thread and its pool of `threads` runtime threads.
    ///
    /// Engines started on it see `fs` with `project_base` as their project root.
    pub async fn spawn(
        name: &str,
        threads: usize,
        loader: Arc<dyn EngineLoader>,
        fs: Arc<dyn FilesystemBackend>,
        project_base: LogicalPath,
    ) -> Result<Self> {
        let threads = threads.max(1);
        let (tx, rx) = mpsc::channel(REQUEST_CAPACITY);
        let (booted_tx, booted_rx) = oneshot::channel::<std::result::Result<(), String>>();
        let pool_name = format!("{}-pool", name);

        let thread = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(threads)
                    .thread_name(pool_name)
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = booted_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let _ = booted_tx.send(Ok(()));

                let pool = runtime.handle().clone();
                runtime.block_on(serve(rx, loader, fs, project_base, pool, threads));
                tracing::debug!("worker stopped");
            })
            .map_err(|e| RuntimeError::WorkerSpawn {
                message: e.to_string(),
            })?;

        match booted_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(message)) => return Err(RuntimeError::WorkerSpawn { message }),
            Err(_) => {
                return Err(RuntimeError::WorkerSpawn {
                    message: "worker thread exited during startup".into(),
                })
            }
        }

        tracing::info!(worker = name, threads, "worker started");
        Ok(Self {
            tx,
            threads,
            thread: Arc::new(Mutex::new(Some(thread))),
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Hand `memory` to the worker and wait until its engine is attached.
    pub async fn start(&self, memory: SharedMemoryRegion, module: &str) -> Result<WorkerReady> {
        let (reply, response) = oneshot::channel();
        self.send(WorkerRequest::Start {
            memory,
            module: module.to_string(),
            reply,
        })
        .await?;
        response.await.map_err(|_| RuntimeError::WorkerGone)?
    }

    pub async fn drive_pending(&self) -> Result<usize> {
        let (reply, response) = oneshot::channel();
        self.send(WorkerRequest::DrivePending { reply }).await?;
        response.await.map_err(|_| RuntimeError::WorkerGone)?
    }

    /// Stop the worker and wait for its thread to exit.
    pub async fn shutdown(&self) {
        // A closed channel means the worker already exited.
        let _ = self.tx.send(WorkerRequest::Shutdown).await;

        let thread = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(thread) = thread {
            match tokio::task::spawn_blocking(move || thread.join()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => tracing::error!("worker thread panicked"),
                Err(e) => tracing::error!(error = %e, "unable to join worker thread"),
            }
        }
    }

    async fn send(&self, request: WorkerRequest) -> Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| RuntimeError::WorkerGone)
    }
}

async fn serve(
    mut rx: mpsc::Receiver<WorkerRequest>,
    loader: Arc<dyn EngineLoader>,
    fs: Arc<dyn FilesystemBackend>,
    project_base: LogicalPath,
    pool: tokio::runtime::Handle,
    threads: usize,
) {
    let mut engine: Option<Box<dyn Engine>> = None;

    while let Some(request) = rx.recv().await {
        match request {
            WorkerRequest::Start {
                memory,
                module,
                reply,
            } => {
                let result = if engine.is_some() {
                    Err(RuntimeError::init_failed("worker already started"))
                } else {
                    let ctx = EngineContext {
                        memory: Some(memory),
                        fs: fs.clone(),
                        project_base: project_base.clone(),
                        pool: Some(pool.clone()),
                        site: ExecutionSite::Worker { threads },
                    };
                    start(&*loader, &module, ctx).await.map(|started| {
                        engine = Some(started);
                        WorkerReady { threads }
                    })
                };
                if let Err(e) = &result {
                    tracing::error!(%module, error = %e, "worker failed to start engine");
                }
                let _ = reply.send(result);
            }
            WorkerRequest::DrivePending { reply } => {
                let result = match engine.as_mut() {
                    Some(engine) => engine.drive_pending().await,
                    None => Err(RuntimeError::NotStarted),
                };
                let _ = reply.send(result);
            }
            WorkerRequest::Shutdown => break,
        }
    }
}

async fn start(
    loader: &dyn EngineLoader,
    module: &str,
    ctx: EngineContext,
) -> Result<Box<dyn Engine>> {
    let mut engine = loader.load(module)?;
    attach(engine.as_mut(), ctx).await?;
    Ok(engine)
}
