//! Error types for the resfs runtime.

use thiserror::Error;

use resfs_provision::ProvisionError;
use resfs_vfs::FsError;

/// Errors raised while starting or driving an engine.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// No engine is registered under the requested module name.
    #[error("engine module not found: {module}")]
    ModuleNotFound { module: String },

    /// The engine rejected initialization.
    #[error("engine initialization failed: {message}")]
    InitFailed { message: String },

    /// The worker thread or its runtime could not be created.
    #[error("failed to spawn worker: {message}")]
    WorkerSpawn { message: String },

    /// The worker stopped answering requests.
    #[error("worker is gone")]
    WorkerGone,

    /// The worker has not received its start message yet.
    #[error("engine not started")]
    NotStarted,

    /// The engine attached to a different memory region than it was handed.
    #[error("engine did not attach to the transferred memory region")]
    MemoryMismatch,

    /// An access fell outside the shared memory region.
    #[error("memory access out of bounds: offset {offset}, length {len}, region size {size}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },

    /// The engine reported an error while running tasks.
    #[error("engine error: {message}")]
    Engine { message: String },

    /// A filesystem operation made by the engine failed.
    #[error("filesystem error: {0}")]
    Fs(#[from] FsError),
}

impl RuntimeError {
    pub fn engine(message: impl Into<String>) -> Self {
        RuntimeError::Engine {
            message: message.into(),
        }
    }

    pub fn init_failed(message: impl Into<String>) -> Self {
        RuntimeError::InitFailed {
            message: message.into(),
        }
    }
}

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Failure of a whole bootstrap attempt.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("provisioning failed: {0}")]
    Provisioning(#[from] ProvisionError),

    #[error("runtime failed to start: {0}")]
    Runtime(#[from] RuntimeError),
}

impl BootstrapError {
    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            BootstrapError::Provisioning(e) => e.user_message(),
            BootstrapError::Runtime(_) => "Unable to start the application, please reload",
        }
    }
}
