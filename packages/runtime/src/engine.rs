//! Engine types for the resfs runtime.
//!
//! An engine is the computation that runs once provisioning has finished. It
//! owns a [`SharedMemoryRegion`] created on first initialization, reads its
//! files through the [`FilesystemBackend`] it is handed, and advances its own
//! cooperative scheduler whenever [`Engine::drive_pending`] is called.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use resfs_vfs::{FilesystemBackend, LogicalPath};
use tokio::runtime::Handle;

use crate::error::{Result, RuntimeError};
use crate::memory::SharedMemoryRegion;

/// Where an engine instance is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionSite {
    MainThread,
    Worker { threads: usize },
}

/// Everything an engine gets at initialization.
pub struct EngineContext {
    /// Region to attach to. `None` means "create one".
    pub memory: Option<SharedMemoryRegion>,

    /// The provisioned filesystem.
    pub fs: Arc<dyn FilesystemBackend>,

    /// Directory the project's resources were provisioned under.
    pub project_base: LogicalPath,

    /// The worker's thread pool, when running on a worker.
    pub pool: Option<Handle>,

    pub site: ExecutionSite,
}

impl EngineContext {
    pub fn main_thread(fs: Arc<dyn FilesystemBackend>) -> Self {
        Self {
            memory: None,
            fs,
            project_base: LogicalPath::root(),
            pool: None,
            site: ExecutionSite::MainThread,
        }
    }

    pub fn with_project_base(mut self, project_base: LogicalPath) -> Self {
        self.project_base = project_base;
        self
    }

    /// Resolve a project-relative path against the project base.
    pub fn project_path(&self, relative: &LogicalPath) -> LogicalPath {
        self.project_base.join(relative)
    }
}

impl fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineContext")
            .field("memory", &self.memory)
            .field("fs", &self.fs.kind())
            .field("project_base", &self.project_base)
            .field("pool", &self.pool.is_some())
            .field("site", &self.site)
            .finish()
    }
}

/// A computation engine.
///
/// # Example
///
/// ```ignore
/// struct Counter { memory: Option<SharedMemoryRegion> }
///
/// #[async_trait]
/// impl Engine for Counter {
///     async fn initialize(&mut self, ctx: EngineContext) -> Result<SharedMemoryRegion> {
///         let memory = ctx.memory.unwrap_or_else(|| SharedMemoryRegion::new(64));
///         self.memory = Some(memory.share());
///         Ok(memory)
///     }
///
///     async fn drive_pending(&mut self) -> Result<usize> {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait Engine: Send {
    /// Initialize against `ctx`, returning the engine's memory region.
    ///
    /// When `ctx.memory` is `Some`, the returned region must be that region.
    async fn initialize(&mut self, ctx: EngineContext) -> Result<SharedMemoryRegion>;

    /// Run whatever work is ready without waiting. Returns the number of
    /// tasks that completed.
    async fn drive_pending(&mut self) -> Result<usize>;
}

/// Initialize `engine`, checking that it attached to the region it was given.
pub async fn attach(engine: &mut dyn Engine, ctx: EngineContext) -> Result<SharedMemoryRegion> {
    let expected = ctx.memory.as_ref().map(SharedMemoryRegion::share);
    let site = ctx.site;
    let region = engine.initialize(ctx).await?;

    if let Some(expected) = expected {
        if !region.same_region(&expected) {
            return Err(RuntimeError::MemoryMismatch);
        }
    }
    tracing::debug!(?site, region = %region.id(), bytes = region.len(), "engine initialized");
    Ok(region)
}

/// Produces engine instances by module name.
pub trait EngineLoader: Send + Sync {
    fn load(&self, module: &str) -> Result<Box<dyn Engine>>;
}

type EngineFactory = Arc<dyn Fn() -> Box<dyn Engine> + Send + Sync>;

/// An [`EngineLoader`] backed by a table of factories.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    factories: BTreeMap<String, EngineFactory>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, module: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Engine> + Send + Sync + 'static,
    {
        self.factories.insert(module.into(), Arc::new(factory));
        self
    }

    pub fn with<F>(mut self, module: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Engine> + Send + Sync + 'static,
    {
        self.register(module, factory);
        self
    }

    pub fn contains(&self, module: &str) -> bool {
        self.factories.contains_key(module)
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl EngineLoader for EngineRegistry {
    fn load(&self, module: &str) -> Result<Box<dyn Engine>> {
        let factory = self
            .factories
            .get(module)
            .ok_or_else(|| RuntimeError::ModuleNotFound {
                module: module.to_string(),
            })?;
        Ok(factory())
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.modules()).finish()
    }
}
