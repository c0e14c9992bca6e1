use std::sync::Arc;

use tokio::sync::Mutex;

use crate::engine::{Engine, ExecutionSite};
use crate::error::Result;
use crate::worker::WorkerHandle;

#[derive(Clone)]
enum Target {
    MainThread(Arc<Mutex<Box<dyn Engine>>>),
    Worker(WorkerHandle),
}

/// Where subsequent engine calls execute. Cheap to clone.
#[derive(Clone)]
pub struct RuntimeHandle {
    target: Target,
}

impl RuntimeHandle {
    pub fn main_thread(engine: Box<dyn Engine>) -> Self {
        Self {
            target: Target::MainThread(Arc::new(Mutex::new(engine))),
        }
    }

    pub fn worker(worker: WorkerHandle) -> Self {
        Self {
            target: Target::Worker(worker),
        }
    }

    pub fn site(&self) -> ExecutionSite {
        match &self.target {
            Target::MainThread(_) => ExecutionSite::MainThread,
            Target::Worker(worker) => ExecutionSite::Worker {
                threads: worker.threads(),
            },
        }
    }

    /// Advance the engine's pending work once, wherever it runs.
    pub async fn drive_pending(&self) -> Result<usize> {
        match &self.target {
            Target::MainThread(engine) => engine.lock().await.drive_pending().await,
            Target::Worker(worker) => worker.drive_pending().await,
        }
    }

    /// Stop the worker, if any.
    pub async fn shutdown(&self) {
        if let Target::Worker(worker) = &self.target {
            worker.shutdown().await;
        }
    }
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("site", &self.site())
            .finish()
    }
}
