/*!
 * Core Types
 * Common types used across the kernel
 */

/// Process ID type
pub type Pid = u32;

/// Raw signal number as passed to `kill`
pub type SignalNumber = u32;

/// Common result type for kernel operations
pub type KernelResult<T> = Result<T, super::errors::KernelError>;

/// Result type for process lifecycle operations
pub type ProcessResult<T> = Result<T, super::errors::ProcessError>;
