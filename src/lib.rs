/*!
 * Process Lifecycle Kernel Library
 * Process identity, fork/exit/wait synchronization and signal flags
 */

pub mod core;
pub mod monitoring;
pub mod process;
pub mod signals;
pub mod syscalls;

// Re-exports
pub use crate::core::config::KernelConfig;
pub use crate::core::errors::{KernelError, ProcessError};
pub use crate::core::types::{KernelResult, Pid, ProcessResult};
pub use monitoring::init_tracing;
pub use process::{
    ContextSpawner, ForkedChild, ProcessInfo, ProcessManager, ProcessManagerBuilder,
    ProcessRegistry, ProcessState, QueueSpawner, ResumableState, ThreadSpawner, TrapFrame,
    WaitOptions, WaitStatus,
};
pub use signals::{Signal, SignalAction, SignalError};
pub use syscalls::{Errno, SyscallExecutor, SyscallReturn};
