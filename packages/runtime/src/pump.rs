//! Periodic task pump.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::handle::RuntimeHandle;

pub const DEFAULT_PUMP_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Default)]
struct PumpStats {
    ticks: AtomicU64,
    completed: AtomicU64,
    failures: AtomicU64,
}

/// Calls [`RuntimeHandle::drive_pending`] on a fixed interval until stopped.
///
/// A failed drive is logged and the pump keeps going.
#[derive(Debug)]
pub struct TaskPump {
    task: JoinHandle<()>,
    stats: Arc<PumpStats>,
    interval: Duration,
}

impl TaskPump {
    /// Spawn the pump on the current tokio runtime.
    pub fn start(handle: RuntimeHandle, interval: Duration) -> Self {
        let stats = Arc::new(PumpStats::default());
        let task_stats = stats.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                task_stats.ticks.fetch_add(1, Ordering::Relaxed);
                match handle.drive_pending().await {
                    Ok(completed) => {
                        task_stats
                            .completed
                            .fetch_add(completed as u64, Ordering::Relaxed);
                    }
                    Err(e) => {
                        task_stats.failures.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(error = %e, "task pump drive failed");
                    }
                }
            }
        });

        tracing::debug!(interval_ms = interval.as_millis() as u64, "task pump started");
        Self {
            task,
            stats,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of times the pump has fired.
    pub fn ticks(&self) -> u64 {
        self.stats.ticks.load(Ordering::Relaxed)
    }

    /// Total tasks the engine reported as completed.
    pub fn completed(&self) -> u64 {
        self.stats.completed.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.stats.failures.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        self.task.abort();
        tracing::debug!(ticks = self.ticks(), "task pump stopped");
    }
}

impl Drop for TaskPump {
    fn drop(&mut self) {
        self.task.abort();
    }
}
