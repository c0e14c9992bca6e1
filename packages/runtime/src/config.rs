use std::time::Duration;

use serde::{Deserialize, Serialize};

use resfs_provision::PipelineConfig;

use crate::worker::default_thread_pool_size;

pub const DEFAULT_MODULE: &str = "engine";
pub const DEFAULT_WORKER_NAME: &str = "resfs-worker";

/// Where the engine runs after initialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    MainThread,
    /// Relocate to a worker thread with its own pool. `threads` defaults to
    /// the host's available parallelism.
    Worker {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threads: Option<usize>,
    },
}

impl ExecutionMode {
    pub fn worker() -> Self {
        ExecutionMode::Worker { threads: None }
    }

    pub fn is_worker(&self) -> bool {
        matches!(self, ExecutionMode::Worker { .. })
    }

    /// Pool size for worker mode, `None` on the main thread.
    pub fn thread_pool_size(&self) -> Option<usize> {
        match self {
            ExecutionMode::MainThread => None,
            ExecutionMode::Worker { threads } => {
                Some(threads.unwrap_or_else(default_thread_pool_size).max(1))
            }
        }
    }
}

/// Configuration for [`RuntimeBootstrap`](crate::RuntimeBootstrap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Engine module to load.
    pub module: String,
    pub execution: ExecutionMode,
    pub pump_interval_ms: u64,
    pub worker_name: String,
    pub pipeline: PipelineConfig,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            module: DEFAULT_MODULE.to_string(),
            execution: ExecutionMode::default(),
            pump_interval_ms: 16,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl BootstrapConfig {
    pub fn pump_interval(&self) -> Duration {
        Duration::from_millis(self.pump_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BootstrapConfig::default();
        assert_eq!(config.module, "engine");
        assert_eq!(config.execution, ExecutionMode::MainThread);
        assert_eq!(config.pump_interval(), Duration::from_millis(16));
        assert_eq!(config.pipeline.manifest_path, "files.json");
    }

    #[test]
    fn worker_mode_from_json() {
        let config: BootstrapConfig = serde_json::from_str(
            r#"{"module":"dream","execution":{"kind":"worker","threads":4},"pipeline":{"delay_ms":0}}"#,
        )
        .unwrap();
        assert_eq!(config.module, "dream");
        assert_eq!(config.execution.thread_pool_size(), Some(4));
        assert_eq!(config.pipeline.delay_ms, 0);
        assert_eq!(config.pump_interval_ms, 16);
    }

    #[test]
    fn worker_threads_default_to_available_parallelism() {
        let mode: ExecutionMode = serde_json::from_str(r#"{"kind":"worker"}"#).unwrap();
        assert_eq!(mode.thread_pool_size(), Some(default_thread_pool_size()));
        assert_eq!(ExecutionMode::MainThread.thread_pool_size(), None);
    }
}
