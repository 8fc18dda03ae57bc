/*!
 * Signal Types
 * UNIX-style signal definitions and result types
 */

use crate::core::limits::MAX_SIGNAL;
use crate::core::types::{Pid, SignalNumber};
use miette::Diagnostic;
use nix::errno::Errno;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Signal operation result
pub type SignalResult<T> = Result<T, SignalError>;

/// Signal errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SignalError {
    #[error("Process not found: {0}")]
    #[diagnostic(
        code(signal::process_not_found),
        help("The target pid was never allocated or has already been reaped.")
    )]
    ProcessNotFound(Pid),

    #[error("Invalid signal: {0}")]
    #[diagnostic(
        code(signal::invalid_signal),
        help("Signal numbers range from 1 to 31; 0 only probes the target.")
    )]
    InvalidSignal(SignalNumber),
}

impl SignalError {
    pub fn errno(&self) -> Errno {
        match self {
            SignalError::ProcessNotFound(_) => Errno::ESRCH,
            SignalError::InvalidSignal(_) => Errno::EINVAL,
        }
    }
}

/// UNIX-style signal numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Signal {
    /// Hangup detected on controlling terminal or death of controlling process
    SIGHUP = 1,
    /// Interrupt from keyboard (Ctrl+C)
    SIGINT = 2,
    /// Quit from keyboard (Ctrl+\)
    SIGQUIT = 3,
    /// Illegal instruction
    SIGILL = 4,
    /// Trace/breakpoint trap
    SIGTRAP = 5,
    /// Abort signal
    SIGABRT = 6,
    /// Bus error (bad memory access)
    SIGBUS = 7,
    /// Floating-point exception
    SIGFPE = 8,
    /// Kill signal (cannot be caught or ignored)
    SIGKILL = 9,
    /// User-defined signal 1
    SIGUSR1 = 10,
    /// Invalid memory reference
    SIGSEGV = 11,
    /// User-defined signal 2
    SIGUSR2 = 12,
    /// Broken pipe
    SIGPIPE = 13,
    /// Timer signal
    SIGALRM = 14,
    /// Termination signal
    SIGTERM = 15,
    /// Coprocessor stack fault
    SIGSTKFLT = 16,
    /// Child process stopped or terminated
    SIGCHLD = 17,
    /// Continue if stopped
    SIGCONT = 18,
    /// Stop process (cannot be caught or ignored)
    SIGSTOP = 19,
    /// Stop typed at terminal (Ctrl+Z)
    SIGTSTP = 20,
    /// Terminal input for background process
    SIGTTIN = 21,
    /// Terminal output for background process
    SIGTTOU = 22,
    /// Urgent condition on socket
    SIGURG = 23,
    /// CPU time limit exceeded
    SIGXCPU = 24,
    /// File size limit exceeded
    SIGXFSZ = 25,
    /// Virtual alarm clock
    SIGVTALRM = 26,
    /// Profiling timer expired
    SIGPROF = 27,
    /// Window resize signal
    SIGWINCH = 28,
    /// I/O now possible
    SIGIO = 29,
    /// Power failure
    SIGPWR = 30,
    /// Bad system call
    SIGSYS = 31,
}

/// What happens when a process observes a pending signal
///
/// Only default dispositions exist; there are no user handlers or masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAction {
    /// Process terminates; `core` marks the core-dump flag in its wait status
    Terminate { core: bool },
    /// Signal is discarded
    Ignore,
}

impl Signal {
    const ALL: [Signal; MAX_SIGNAL as usize] = [
        Signal::SIGHUP,
        Signal::SIGINT,
        Signal::SIGQUIT,
        Signal::SIGILL,
        Signal::SIGTRAP,
        Signal::SIGABRT,
        Signal::SIGBUS,
        Signal::SIGFPE,
        Signal::SIGKILL,
        Signal::SIGUSR1,
        Signal::SIGSEGV,
        Signal::SIGUSR2,
        Signal::SIGPIPE,
        Signal::SIGALRM,
        Signal::SIGTERM,
        Signal::SIGSTKFLT,
        Signal::SIGCHLD,
        Signal::SIGCONT,
        Signal::SIGSTOP,
        Signal::SIGTSTP,
        Signal::SIGTTIN,
        Signal::SIGTTOU,
        Signal::SIGURG,
        Signal::SIGXCPU,
        Signal::SIGXFSZ,
        Signal::SIGVTALRM,
        Signal::SIGPROF,
        Signal::SIGWINCH,
        Signal::SIGIO,
        Signal::SIGPWR,
        Signal::SIGSYS,
    ];

    /// Convert from signal number
    pub fn from_number(n: SignalNumber) -> SignalResult<Self> {
        match n {
            1..=MAX_SIGNAL => Ok(Self::ALL[(n - 1) as usize]),
            _ => Err(SignalError::InvalidSignal(n)),
        }
    }

    /// Get signal number
    #[inline]
    pub fn number(&self) -> SignalNumber {
        *self as SignalNumber
    }

    /// Default disposition
    ///
    /// Stop and continue signals are ignored since there is no job control.
    pub fn default_action(&self) -> SignalAction {
        match self {
            Signal::SIGQUIT
            | Signal::SIGILL
            | Signal::SIGTRAP
            | Signal::SIGABRT
            | Signal::SIGBUS
            | Signal::SIGFPE
            | Signal::SIGSEGV
            | Signal::SIGXCPU
            | Signal::SIGXFSZ
            | Signal::SIGSYS => SignalAction::Terminate { core: true },
            Signal::SIGCHLD
            | Signal::SIGCONT
            | Signal::SIGSTOP
            | Signal::SIGTSTP
            | Signal::SIGTTIN
            | Signal::SIGTTOU
            | Signal::SIGURG
            | Signal::SIGWINCH => SignalAction::Ignore,
            _ => SignalAction::Terminate { core: false },
        }
    }

    /// Check if the default action ends the process
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self.default_action(), SignalAction::Terminate { .. })
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
