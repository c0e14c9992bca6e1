//! # resfs-runtime
//!
//! Starts the computation engine once its files are provisioned.
//!
//! ## Core Concepts
//!
//! ### Engines
//!
//! An [`Engine`] is initialized once against an [`EngineContext`] and hands
//! back the [`SharedMemoryRegion`] it computes in. Its asynchronous work is
//! cooperative: nothing advances until [`Engine::drive_pending`] is called,
//! typically by polling a [`TaskQueue`].
//!
//! ### Relocation
//!
//! With [`ExecutionMode::Worker`] the engine is first initialized on the
//! calling task, then its region is moved to a dedicated worker thread that
//! owns a multi-thread tokio pool. The worker loads a fresh engine from the
//! same [`EngineLoader`] and attaches it to the transferred region:
//!
//! ```text
//!   caller                         worker thread
//!   ------                         -------------
//!   load + initialize  ──region──▶ Start { memory, module }
//!   drop local engine              load + attach to region
//!                      ◀─────────  WorkerReady { threads }
//!   TaskPump (16 ms)   ──────────▶ DrivePending
//! ```
//!
//! ### Bootstrap
//!
//! [`RuntimeBootstrap::launch`] provisions the filesystem, starts the engine
//! and its [`TaskPump`], and reports any failure once through the
//! [`ProgressSink`](resfs_provision::ProgressSink):
//!
//! ```ignore
//! let registry = EngineRegistry::new().with("engine", || Box::new(MyEngine::default()));
//! let launched = RuntimeBootstrap::new(config, backend, fetcher, Arc::new(registry))
//!     .with_progress(Arc::new(LogProgress))
//!     .launch()
//!     .await?;
//! ```

pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod memory;
pub mod pump;
pub mod task_queue;
pub mod worker;

pub use bootstrap::{Launched, RuntimeBootstrap};
pub use config::{BootstrapConfig, ExecutionMode};
pub use engine::{attach, Engine, EngineContext, EngineLoader, EngineRegistry, ExecutionSite};
pub use error::{BootstrapError, Result, RuntimeError};
pub use handle::RuntimeHandle;
pub use memory::SharedMemoryRegion;
pub use pump::{TaskPump, DEFAULT_PUMP_INTERVAL};
pub use task_queue::{TaskQueue, TaskSender};
pub use worker::{default_thread_pool_size, WorkerHandle, WorkerReady, WorkerRequest};
