/*!
 * Resumable Execution State
 *
 * The fork engine only needs two things from a saved register snapshot: a
 * fallible heap copy, and a way to make the copy resume as the child side of
 * fork. `TrapFrame` is the in-tree implementation.
 */

use crate::core::limits::{SYSCALL_INSN_BYTES, TRAPFRAME_GPRS};
use crate::core::types::ProcessResult;
use nix::errno::Errno;
use serde::{Deserialize, Serialize};

/// Execution state that can be cloned into a new context
pub trait ResumableState: Send + Sized + 'static {
    /// Copy the state onto the heap
    ///
    /// The copy must be independent of `self`: the caller keeps running and
    /// may overwrite its own state before the child is scheduled.
    fn try_duplicate(&self) -> ProcessResult<Box<Self>>;

    /// Rewrite the copy so it resumes after the fork call returning 0
    fn resume_as_child(&mut self);
}

/// Register snapshot taken at syscall entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapFrame {
    /// Address of the syscall instruction
    pub pc: u64,
    pub sp: u64,
    /// Syscall return value, or errno when `error` is set
    pub retval: i64,
    pub error: bool,
    pub gprs: [u64; TRAPFRAME_GPRS],
}

impl TrapFrame {
    pub fn new(pc: u64, sp: u64) -> Self {
        Self {
            pc,
            sp,
            retval: 0,
            error: false,
            gprs: [0; TRAPFRAME_GPRS],
        }
    }

    /// Write a syscall result and step past the syscall instruction
    pub fn set_syscall_result(&mut self, result: Result<i32, Errno>) {
        match result {
            Ok(value) => {
                self.retval = i64::from(value);
                self.error = false;
            }
            Err(errno) => {
                self.retval = errno as i64;
                self.error = true;
            }
        }
        self.pc = self.pc.wrapping_add(SYSCALL_INSN_BYTES);
    }

    /// Decode the result last written by `set_syscall_result`
    pub fn syscall_result(&self) -> Result<i32, Errno> {
        if self.error {
            Err(Errno::from_raw(self.retval as i32))
        } else {
            Ok(self.retval as i32)
        }
    }
}

impl ResumableState for TrapFrame {
    fn try_duplicate(&self) -> ProcessResult<Box<Self>> {
        Ok(Box::new(self.clone()))
    }

    fn resume_as_child(&mut self) {
        self.set_syscall_result(Ok(0));
    }
}
