/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::inline_string::InlineString;
use super::types::Pid;
use miette::Diagnostic;
use nix::errno::Errno;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export SignalError from signals module
pub use crate::signals::types::SignalError;

/// Process lifecycle errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProcessError {
    #[error("Invalid argument: {0}")]
    #[diagnostic(
        code(process::invalid_argument),
        help("An option, pid or signal number passed to the call is out of range.")
    )]
    InvalidArgument(InlineString),

    #[error("No such process: {0}")]
    #[diagnostic(
        code(process::no_such_process),
        help("The pid was never allocated or its status has already been collected.")
    )]
    NoSuchProcess(Pid),

    #[error("Process {pid} is not a child of {caller}")]
    #[diagnostic(
        code(process::not_a_child),
        help("Only the parent that forked a process may wait for it.")
    )]
    NotAChild { caller: Pid, pid: Pid },

    #[error("Process {0} has not exited yet")]
    #[diagnostic(
        code(process::would_block),
        help("Retry the non-blocking wait later, or wait without WNOHANG.")
    )]
    WouldBlock(Pid),

    #[error("Pid table exhausted: {capacity} processes allocated")]
    #[diagnostic(
        code(process::pids_exhausted),
        help("Reap exited children to return their pids to the free list.")
    )]
    PidsExhausted { capacity: usize },

    #[error("Out of memory: {0}")]
    #[diagnostic(
        code(process::out_of_memory),
        help("The execution state copy for the child could not be allocated.")
    )]
    OutOfMemory(InlineString),

    #[error("Failed to start execution context: {0}")]
    #[diagnostic(
        code(process::spawn_failed),
        help("The scheduler refused the new context. View logs for details.")
    )]
    SpawnFailed(InlineString),

    #[error("Process {0} has already exited")]
    #[diagnostic(code(process::already_exited))]
    AlreadyExited(Pid),

    #[error("Invalid process state: {0}")]
    #[diagnostic(
        code(process::invalid_state),
        help("Operation cannot be performed in current process state.")
    )]
    InvalidState(InlineString),
}

impl ProcessError {
    /// Errno reported to user space for this error
    pub fn errno(&self) -> Errno {
        match self {
            ProcessError::InvalidArgument(_)
            | ProcessError::AlreadyExited(_)
            | ProcessError::InvalidState(_) => Errno::EINVAL,
            ProcessError::NoSuchProcess(_) => Errno::ESRCH,
            ProcessError::NotAChild { .. } => Errno::ECHILD,
            ProcessError::WouldBlock(_) | ProcessError::PidsExhausted { .. } => Errno::EAGAIN,
            ProcessError::OutOfMemory(_) | ProcessError::SpawnFailed(_) => Errno::ENOMEM,
        }
    }

    #[inline]
    pub fn invalid_argument(msg: impl Into<InlineString>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    #[inline]
    pub fn invalid_state(msg: impl Into<InlineString>) -> Self {
        Self::InvalidState(msg.into())
    }
}

impl From<SignalError> for ProcessError {
    fn from(err: SignalError) -> Self {
        match err {
            SignalError::ProcessNotFound(pid) => ProcessError::NoSuchProcess(pid),
            SignalError::InvalidSignal(n) => {
                ProcessError::InvalidArgument(format!("invalid signal number {}", n).into())
            }
        }
    }
}

/// Unified kernel error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum KernelError {
    #[error("Process error: {0}")]
    #[diagnostic(transparent)]
    Process(#[from] ProcessError),

    #[error("Signal error: {0}")]
    #[diagnostic(transparent)]
    Signal(#[from] SignalError),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(kernel::configuration_error),
        help("Invalid configuration. Review KERNEL_* environment variables.")
    )]
    Configuration(InlineString),
}

impl KernelError {
    #[inline]
    pub fn configuration(msg: impl Into<InlineString>) -> Self {
        Self::Configuration(msg.into())
    }
}
