/*!
 * Syscalls Module
 * Process system call entry points
 */

mod executor;
mod types;

// Re-export public API
pub use executor::SyscallExecutor;
pub use types::{Errno, SyscallReturn};
