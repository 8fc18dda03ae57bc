/*!
 * Syscall Types
 * Return convention shared by every syscall entry point
 */

use crate::core::errors::ProcessError;
use crate::core::types::Pid;

pub use nix::errno::Errno;

/// Non-negative value on success, errno on failure
pub type SyscallReturn = Result<i32, Errno>;

/// Map a kernel error onto its errno
#[inline]
pub(crate) fn errno(err: ProcessError) -> Errno {
    err.errno()
}

/// Pid as a syscall return value
#[inline]
pub(crate) fn pid_return(pid: Pid) -> SyscallReturn {
    i32::try_from(pid).map_err(|_| Errno::ERANGE)
}

/// Pid argument from a syscall register
///
/// Process-group and "any child" forms are not supported, so anything below 1
/// names no process.
#[inline]
pub(crate) fn pid_argument(raw: i32) -> Result<Pid, Errno> {
    match Pid::try_from(raw) {
        Ok(pid) if pid > 0 => Ok(pid),
        _ => Err(Errno::ESRCH),
    }
}
