/*!
 * Syscall Executor
 * Process syscalls bound to one calling context
 */

use super::types::{errno, pid_argument, pid_return, Errno, SyscallReturn};
use crate::core::types::{Pid, SignalNumber};
use crate::monitoring::syscall_span;
use crate::process::{current_pid, ProcessManager, ResumableState, TrapFrame, WaitOptions, WaitStatus};
use tracing::debug;

/// Syscall entry points for the process `pid`
///
/// Each context builds its own executor, usually from the pid its spawner
/// hands it.
pub struct SyscallExecutor<S: ResumableState = TrapFrame> {
    kernel: ProcessManager<S>,
    pid: Pid,
}

impl<S: ResumableState> SyscallExecutor<S> {
    pub fn new(kernel: ProcessManager<S>, pid: Pid) -> Self {
        Self { kernel, pid }
    }

    /// Executor for the process bound to the calling thread
    pub fn current(kernel: ProcessManager<S>) -> Result<Self, Errno> {
        let pid = current_pid().ok_or(Errno::ESRCH)?;
        Ok(Self::new(kernel, pid))
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn kernel(&self) -> &ProcessManager<S> {
        &self.kernel
    }

    /// Returns the child's pid; the child itself sees 0 through
    /// `ForkedChild::enter`
    pub fn sys_fork(&self, state: &S) -> SyscallReturn {
        let span = syscall_span("fork", self.pid);
        let _guard = span.enter();

        let result = self.kernel.fork(self.pid, state).map_err(errno).and_then(pid_return);
        span.record_result(&result);
        result
    }

    pub fn sys_getpid(&self) -> SyscallReturn {
        pid_return(self.pid)
    }

    /// Collect child `pid`, writing its wait status to `status` on success
    ///
    /// `status` is left untouched on every failure, including EAGAIN.
    pub fn sys_waitpid(&self, pid: i32, status: Option<&mut i32>, options: i32) -> SyscallReturn {
        let span = syscall_span("waitpid", self.pid);
        let _guard = span.enter();

        let result = self.waitpid_inner(pid, options).map(|(collected, wait_status)| {
            if let Some(out) = status {
                *out = wait_status.raw();
            }
            collected
        });
        span.record_result(&result);
        result
    }

    fn waitpid_inner(&self, pid: i32, options: i32) -> Result<(i32, WaitStatus), Errno> {
        // Options are checked before the target is looked up
        let bits = u32::try_from(options).map_err(|_| Errno::EINVAL)?;
        let options = WaitOptions::from_bits(bits).map_err(errno)?;
        let target = pid_argument(pid)?;

        let (collected, status) = self.kernel.wait(self.pid, target, options).map_err(errno)?;
        Ok((pid_return(collected)?, status))
    }

    /// Set signal `signal` pending on `pid`; 0 probes for existence
    pub fn sys_kill(&self, pid: i32, signal: i32) -> SyscallReturn {
        let span = syscall_span("kill", self.pid);
        let _guard = span.enter();

        let result = SignalNumber::try_from(signal)
            .map_err(|_| Errno::EINVAL)
            .and_then(|signal| {
                let target = pid_argument(pid)?;
                self.kernel.kill(self.pid, target, signal).map_err(errno)
            })
            .map(|()| 0);
        span.record_result(&result);
        result
    }

    /// Publish a normal exit with `code`
    ///
    /// The context must stop running after this returns Ok.
    pub fn sys_exit(&self, code: i32) -> SyscallReturn {
        self.exit_with(WaitStatus::exited(code))
    }

    /// Exit with an arbitrary status, e.g. one produced by `check_signals`
    pub fn exit_with(&self, status: WaitStatus) -> SyscallReturn {
        let span = syscall_span("exit", self.pid);
        let _guard = span.enter();

        let result = self.kernel.exit(self.pid, status).map_err(errno).map(|()| 0);
        span.record_result(&result);
        result
    }

    /// Observation point: exit status to terminate with, if a fatal signal
    /// was pending
    pub fn check_signals(&self) -> Option<WaitStatus> {
        match self.kernel.check_signals(self.pid) {
            Ok(status) => status,
            Err(e) => {
                debug!(pid = %self.pid, error = %e, "Signal check on unknown process");
                None
            }
        }
    }
}

impl SyscallExecutor<TrapFrame> {
    /// Run fork from a trap and write the parent's return value into `frame`
    pub fn trap_fork(&self, frame: &mut TrapFrame) {
        let result = self.sys_fork(frame);
        frame.set_syscall_result(result);
    }
}
