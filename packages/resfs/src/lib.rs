//! resfs: a path-addressed virtual filesystem, populated from a resource
//! manifest before the engine that consumes it starts.
//!
//! The crate re-exports the layers underneath:
//!
//! - [`vfs`]: logical paths and the persistent/ephemeral backends
//! - [`http`]: fetching bytes by URL
//! - [`provision`]: manifests and the provisioning pipeline
//! - [`runtime`]: engine bootstrap, worker relocation and the task pump

pub use resfs_http as http;
pub use resfs_provision as provision;
pub use resfs_runtime as runtime;
pub use resfs_vfs as vfs;

pub use resfs_vfs::{
    lpath, BackendConfig, BackendKind, DirEntry, EphemeralBackend, FilesystemBackend, FsError,
    LogicalPath, NodeKind, PathError, PersistentBackend,
};

pub use resfs_http::{FetchError, Fetcher, HttpFetcher, LocalFetcher, Url};

pub use resfs_provision::{
    LogProgress, NullProgress, PipelineConfig, PipelineState, ProgressEvent, ProgressSink,
    ProvisionError, ProvisionReport, ProvisioningPipeline, ResourceDescriptor, ResourceManifest,
};

pub use resfs_runtime::{
    BootstrapConfig, BootstrapError, Engine, EngineContext, EngineLoader, EngineRegistry,
    ExecutionMode, Launched, RuntimeBootstrap, RuntimeError, RuntimeHandle, SharedMemoryRegion,
    TaskPump, TaskQueue,
};
