/*!
 * Process Management
 * Shared handle tying the registry, the scheduler collaborator and statistics together
 */

use super::frame::{ResumableState, TrapFrame};
use super::registry::ProcessRegistry;
use super::spawner::{ContextSpawner, QueueSpawner};
use super::stats::{AtomicLifecycleStats, LifecycleStats};
use super::types::ProcessInfo;
use crate::core::config::KernelConfig;
use crate::core::types::{KernelResult, Pid};
use std::sync::Arc;
use tracing::info;

/// Process lifecycle kernel
///
/// Cheap to clone; every clone shares the same registry. Operations live in
/// `fork.rs`, `lifecycle.rs` and `signals::delivery`.
pub struct ProcessManager<S: ResumableState = TrapFrame> {
    pub(crate) registry: Arc<ProcessRegistry>,
    pub(crate) spawner: Arc<dyn ContextSpawner<S>>,
    pub(crate) stats: Arc<AtomicLifecycleStats>,
    config: Arc<KernelConfig>,
}

/// Builder for ProcessManager
pub struct ProcessManagerBuilder<S: ResumableState = TrapFrame> {
    config: KernelConfig,
    spawner: Option<Arc<dyn ContextSpawner<S>>>,
}

impl<S: ResumableState> ProcessManagerBuilder<S> {
    /// Create a new ProcessManager builder
    pub fn new() -> Self {
        Self {
            config: KernelConfig::default(),
            spawner: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the pid table capacity
    pub fn with_max_processes(mut self, max_processes: usize) -> Self {
        self.config.max_processes = max_processes;
        self
    }

    /// Scheduler collaborator that runs forked children
    pub fn with_spawner(mut self, spawner: Arc<dyn ContextSpawner<S>>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Build the ProcessManager
    ///
    /// Without an explicit spawner, forked children are parked in a
    /// `QueueSpawner` that nothing drains.
    pub fn build(self) -> KernelResult<ProcessManager<S>> {
        let registry = ProcessRegistry::new(&self.config)?;
        let spawner: Arc<dyn ContextSpawner<S>> = match self.spawner {
            Some(spawner) => spawner,
            None => Arc::new(QueueSpawner::new()),
        };

        info!(
            max_processes = self.config.max_processes,
            pid_min = self.config.pid_min,
            "Process manager initialized"
        );

        Ok(ProcessManager {
            registry: Arc::new(registry),
            spawner,
            stats: Arc::new(AtomicLifecycleStats::new()),
            config: Arc::new(self.config),
        })
    }
}

impl<S: ResumableState> Default for ProcessManagerBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ResumableState> ProcessManager<S> {
    /// Create a builder for constructing a ProcessManager
    pub fn builder() -> ProcessManagerBuilder<S> {
        ProcessManagerBuilder::new()
    }

    /// Manager with `config` and the given spawner
    pub fn new(config: KernelConfig, spawner: Arc<dyn ContextSpawner<S>>) -> KernelResult<Self> {
        Self::builder()
            .with_config(config)
            .with_spawner(spawner)
            .build()
    }

    #[inline]
    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    #[inline]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn stats(&self) -> LifecycleStats {
        self.stats.snapshot()
    }

    /// Snapshot of one process
    pub fn process_info(&self, pid: Pid) -> Option<ProcessInfo> {
        self.registry.snapshot(pid)
    }

    /// Snapshot of every registered process, ordered by pid
    pub fn list_processes(&self) -> Vec<ProcessInfo> {
        self.registry
            .pids()
            .into_iter()
            .filter_map(|pid| self.registry.snapshot(pid))
            .collect()
    }
}

impl<S: ResumableState> Clone for ProcessManager<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            spawner: Arc::clone(&self.spawner),
            stats: Arc::clone(&self.stats),
            config: Arc::clone(&self.config),
        }
    }
}
