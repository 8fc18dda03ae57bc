/*!
 * Process Module
 * Pid registry, fork, exit and wait
 */

mod fork;
pub mod frame;
mod lifecycle;
pub mod manager;
pub mod record;
pub mod registry;
pub mod spawner;
pub mod stats;
pub mod types;

// Re-export for convenience
pub use frame::{ResumableState, TrapFrame};
pub use manager::{ProcessManager, ProcessManagerBuilder};
pub use record::ProcessRecord;
pub use registry::{ProcessRegistry, BOOT_PROCESS_NAME};
pub use spawner::{
    current_pid, set_current_pid, ContextSpawner, ForkedChild, ProcessProgram, QueueSpawner,
    SpawnError, ThreadSpawner,
};
pub use stats::{AtomicLifecycleStats, LifecycleStats};
pub use types::{ProcessInfo, ProcessState, WaitOptions, WaitStatus};
