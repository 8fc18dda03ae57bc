/*!
 * Signal Flag Delivery
 *
 * `kill` only records the signal on the target. The target acts on it at its
 * own observation points through `check_signals`.
 */

use super::traits::SignalDelivery;
use super::types::{Signal, SignalAction, SignalError, SignalResult};
use crate::core::types::{Pid, ProcessResult, SignalNumber};
use crate::process::{ProcessManager, ProcessRegistry, ResumableState, WaitStatus};
use tracing::{debug, info};

/// Probe number: validates the target, delivers nothing
pub const SIGNAL_PROBE: SignalNumber = 0;

impl SignalDelivery for ProcessRegistry {
    fn send(&self, sender_pid: Pid, target_pid: Pid, signal: SignalNumber) -> SignalResult<()> {
        let signal = match signal {
            SIGNAL_PROBE => None,
            n => Some(Signal::from_number(n)?),
        };

        let record = self
            .lookup(target_pid)
            .map_err(|_| SignalError::ProcessNotFound(target_pid))?;

        if let Some(signal) = signal {
            if let Some(previous) = record.set_pending_signal(signal) {
                debug!(pid = %target_pid, previous = %previous, "Pending signal overwritten");
            }
            debug!(sender = %sender_pid, pid = %target_pid, signal = %signal, "Signal pending");
        }
        Ok(())
    }

    fn pending_signal(&self, pid: Pid) -> SignalResult<Option<Signal>> {
        self.lookup(pid)
            .map(|record| record.pending_signal())
            .map_err(|_| SignalError::ProcessNotFound(pid))
    }

    fn take_pending(&self, pid: Pid) -> SignalResult<Option<Signal>> {
        self.lookup(pid)
            .map(|record| record.take_pending_signal())
            .map_err(|_| SignalError::ProcessNotFound(pid))
    }
}

impl<S: ResumableState> ProcessManager<S> {
    /// Mark `signal` pending on `target`
    pub fn kill(&self, sender: Pid, target: Pid, signal: SignalNumber) -> ProcessResult<()> {
        self.registry.send(sender, target, signal)?;
        if signal != SIGNAL_PROBE {
            self.stats.inc_signals_sent();
        }
        Ok(())
    }

    /// Clear and return the pending signal of `pid`
    pub fn take_pending_signal(&self, pid: Pid) -> ProcessResult<Option<Signal>> {
        Ok(self.registry.take_pending(pid)?)
    }

    /// Observation point
    ///
    /// Consumes the pending signal. Returns the status the process should exit
    /// with when the signal's default action terminates it.
    pub fn check_signals(&self, pid: Pid) -> ProcessResult<Option<WaitStatus>> {
        let Some(signal) = self.registry.take_pending(pid)? else {
            return Ok(None);
        };

        match signal.default_action() {
            SignalAction::Terminate { core } => {
                info!(pid = %pid, signal = %signal, "Process terminated by signal");
                Ok(Some(WaitStatus::signaled(signal.number(), core)))
            }
            SignalAction::Ignore => {
                debug!(pid = %pid, signal = %signal, "Signal ignored");
                Ok(None)
            }
        }
    }
}
