/*!
 * Process Record
 *
 * Per-process bookkeeping owned by the registry. Immutable identity fields are
 * plain; everything that changes after creation sits behind the record lock,
 * and the record's condvar is the wait channel for its exit.
 */

use super::types::{ProcessInfo, ProcessState, WaitStatus};
use crate::core::errors::ProcessError;
use crate::core::inline_string::InlineString;
use crate::core::types::{Pid, ProcessResult};
use crate::signals::Signal;
use parking_lot::{Condvar, Mutex};

/// Mutable half of a record
#[derive(Debug)]
struct RecordState {
    state: ProcessState,
    exit_status: Option<WaitStatus>,
    pending_signal: Option<Signal>,
    /// Parent exited; no one will ever wait for this record
    detached: bool,
    /// Exit status consumed; the pid is being (or has been) released
    collected: bool,
}

/// What the exit path must do after publishing a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitOutcome {
    /// Parent may collect; `woken` waiters were released
    AwaitingParent { woken: usize },
    /// Record was detached and is already claimed for release
    SelfReaped,
}

/// Result of a successful collection
#[derive(Debug, Clone, Copy)]
pub(crate) struct Collected {
    pub status: WaitStatus,
    /// The caller slept on the wait channel at least once
    pub blocked: bool,
}

#[derive(Debug)]
pub struct ProcessRecord {
    pid: Pid,
    parent_pid: Pid,
    name: InlineString,
    inner: Mutex<RecordState>,
    exited: Condvar,
}

impl ProcessRecord {
    pub(crate) fn new(pid: Pid, parent_pid: Pid, name: InlineString) -> Self {
        Self {
            pid,
            parent_pid,
            name,
            inner: Mutex::new(RecordState {
                state: ProcessState::Running,
                exit_status: None,
                pending_signal: None,
                detached: false,
                collected: false,
            }),
            exited: Condvar::new(),
        }
    }

    #[inline(always)]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline(always)]
    pub fn parent_pid(&self) -> Pid {
        self.parent_pid
    }

    #[inline(always)]
    pub fn name(&self) -> &InlineString {
        &self.name
    }

    pub fn state(&self) -> ProcessState {
        self.inner.lock().state
    }

    pub fn is_zombie(&self) -> bool {
        self.state() == ProcessState::Zombie
    }

    pub fn exit_status(&self) -> Option<WaitStatus> {
        self.inner.lock().exit_status
    }

    pub fn is_detached(&self) -> bool {
        self.inner.lock().detached
    }

    pub fn is_collected(&self) -> bool {
        self.inner.lock().collected
    }

    pub fn pending_signal(&self) -> Option<Signal> {
        self.inner.lock().pending_signal
    }

    /// Overwrite the pending signal (last writer wins)
    pub(crate) fn set_pending_signal(&self, signal: Signal) -> Option<Signal> {
        self.inner.lock().pending_signal.replace(signal)
    }

    /// Clear and return the pending signal
    pub(crate) fn take_pending_signal(&self) -> Option<Signal> {
        self.inner.lock().pending_signal.take()
    }

    /// Run `f` while the record is locked and known to be running
    ///
    /// Used by fork so a child can't be inserted after its parent's exit path
    /// has already scanned for children.
    pub(crate) fn with_running<R>(&self, f: impl FnOnce() -> ProcessResult<R>) -> ProcessResult<R> {
        let inner = self.inner.lock();
        if inner.state != ProcessState::Running {
            return Err(ProcessError::AlreadyExited(self.pid));
        }
        let result = f();
        drop(inner);
        result
    }

    /// Store the exit status and transition to zombie
    ///
    /// `before_wake` runs under the record lock after the transition and
    /// before any waiter is released.
    pub(crate) fn publish_exit(
        &self,
        status: WaitStatus,
        before_wake: impl FnOnce(),
    ) -> ProcessResult<ExitOutcome> {
        let mut inner = self.inner.lock();
        if inner.state == ProcessState::Zombie {
            return Err(ProcessError::AlreadyExited(self.pid));
        }

        inner.exit_status = Some(status);
        inner.state = ProcessState::Zombie;
        before_wake();

        // Detached records are claimed before the wake so released waiters
        // see them as gone
        let detached = inner.detached;
        if detached {
            inner.collected = true;
        }

        let woken = self.exited.notify_all();
        if detached {
            return Ok(ExitOutcome::SelfReaped);
        }
        Ok(ExitOutcome::AwaitingParent { woken })
    }

    /// Consume the exit status, blocking until it exists unless `nohang`
    ///
    /// Exactly one caller ever succeeds; later or losing callers observe
    /// `NoSuchProcess` because the pid is on its way back to the free list.
    /// A record detached while the caller sleeps refuses it with `NotAChild`.
    pub(crate) fn collect(&self, nohang: bool) -> ProcessResult<Collected> {
        let mut inner = self.inner.lock();
        let mut blocked = false;

        loop {
            if inner.collected {
                return Err(ProcessError::NoSuchProcess(self.pid));
            }

            if inner.detached {
                return Err(ProcessError::NotAChild {
                    caller: self.parent_pid,
                    pid: self.pid,
                });
            }

            if inner.state == ProcessState::Zombie {
                let status = inner.exit_status.ok_or_else(|| {
                    ProcessError::invalid_state(format!("zombie {} has no exit status", self.pid))
                })?;
                inner.collected = true;
                return Ok(Collected { status, blocked });
            }

            if nohang {
                return Err(ProcessError::WouldBlock(self.pid));
            }

            // Loop re-checks: wakeups may be spurious
            blocked = true;
            self.exited.wait(&mut inner);
        }
    }

    /// Mark the record as orphaned
    ///
    /// Returns true when the record is already a zombie and has now been
    /// claimed for release by the caller.
    ///
    /// Waiters still blocked on the record are released either way.
    pub(crate) fn detach(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.detached = true;
        let claimed = inner.state == ProcessState::Zombie && !inner.collected;
        if claimed {
            inner.collected = true;
        }
        self.exited.notify_all();
        claimed
    }

    /// Claim an uncollected zombie for kernel-driven release
    pub(crate) fn claim_zombie(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state == ProcessState::Zombie && !inner.collected {
            inner.collected = true;
            return true;
        }
        false
    }

    pub fn snapshot(&self) -> ProcessInfo {
        let inner = self.inner.lock();
        ProcessInfo {
            pid: self.pid,
            parent_pid: self.parent_pid,
            name: self.name.clone(),
            state: inner.state,
            exit_status: inner.exit_status,
            pending_signal: inner.pending_signal,
            detached: inner.detached,
        }
    }
}
