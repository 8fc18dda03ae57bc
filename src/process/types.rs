/*!
 * Process Types
 * Lifecycle state, wait options and the encoded wait status
 */

use crate::core::errors::ProcessError;
use crate::core::inline_string::InlineString;
use crate::core::limits::WNOHANG;
use crate::core::types::{Pid, ProcessResult};
use crate::signals::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Executing, or blocked in the kernel on its own behalf
    Running,
    /// Terminated; exit status stored and waiting to be collected
    Zombie,
}

/// Encoded termination value, bit-compatible with the Unix wait status
///
/// | bits   | exited       | signaled           | stopped       |
/// |--------|--------------|--------------------|---------------|
/// | 0..=6  | 0            | signal number      | 0x7f          |
/// | 7      | 0            | core dumped        | 0             |
/// | 8..=15 | exit code    | 0                  | stop signal   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaitStatus(i32);

impl WaitStatus {
    const SIG_MASK: i32 = 0x7f;
    const CORE_FLAG: i32 = 0x80;
    const STOPPED: i32 = 0x7f;

    /// Normal exit with `code` (truncated to 8 bits)
    #[inline]
    pub const fn exited(code: i32) -> Self {
        Self((code & 0xff) << 8)
    }

    /// Termination by signal `signal`
    #[inline]
    pub const fn signaled(signal: u32, core_dumped: bool) -> Self {
        let core = if core_dumped { Self::CORE_FLAG } else { 0 };
        Self((signal as i32 & Self::SIG_MASK) | core)
    }

    /// Stopped by signal `signal`
    #[inline]
    pub const fn stopped(signal: u32) -> Self {
        Self(((signal as i32 & 0xff) << 8) | Self::STOPPED)
    }

    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    pub fn is_exited(self) -> bool {
        self.0 & Self::SIG_MASK == 0
    }

    #[inline]
    pub fn is_signaled(self) -> bool {
        let sig = self.0 & Self::SIG_MASK;
        sig != 0 && sig != Self::STOPPED
    }

    #[inline]
    pub fn is_stopped(self) -> bool {
        self.0 & 0xff == Self::STOPPED
    }

    pub fn exit_code(self) -> Option<i32> {
        self.is_exited().then_some((self.0 >> 8) & 0xff)
    }

    pub fn term_signal(self) -> Option<u32> {
        self.is_signaled().then_some((self.0 & Self::SIG_MASK) as u32)
    }

    pub fn core_dumped(self) -> bool {
        self.is_signaled() && self.0 & Self::CORE_FLAG != 0
    }

    pub fn stop_signal(self) -> Option<u32> {
        self.is_stopped().then_some(((self.0 >> 8) & 0xff) as u32)
    }
}

impl fmt::Display for WaitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.exit_code() {
            return write!(f, "exited with code {}", code);
        }
        if let Some(sig) = self.term_signal() {
            let name = Signal::from_number(sig)
                .map(|s| s.to_string())
                .unwrap_or_else(|_| format!("signal {}", sig));
            let core = if self.core_dumped() { " (core dumped)" } else { "" };
            return write!(f, "killed by {}{}", name, core);
        }
        if let Some(sig) = self.stop_signal() {
            return write!(f, "stopped by signal {}", sig);
        }
        write!(f, "raw status {:#x}", self.0)
    }
}

/// Validated `waitpid` options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WaitOptions {
    nohang: bool,
}

impl WaitOptions {
    /// Block until the child exits
    pub const BLOCKING: Self = Self { nohang: false };
    /// Return `WouldBlock` instead of blocking
    pub const NOHANG: Self = Self { nohang: true };

    /// Parse raw option bits; anything besides 0 and WNOHANG is rejected
    pub fn from_bits(bits: u32) -> ProcessResult<Self> {
        match bits {
            0 => Ok(Self::BLOCKING),
            WNOHANG => Ok(Self::NOHANG),
            other => Err(ProcessError::invalid_argument(format!(
                "unsupported wait options {:#x}",
                other
            ))),
        }
    }

    #[inline]
    pub fn bits(&self) -> u32 {
        if self.nohang {
            WNOHANG
        } else {
            0
        }
    }

    #[inline]
    pub fn is_nohang(&self) -> bool {
        self.nohang
    }
}

/// Point-in-time view of a process record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    pub parent_pid: Pid,
    pub name: InlineString,
    pub state: ProcessState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<WaitStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_signal: Option<Signal>,
    pub detached: bool,
}
