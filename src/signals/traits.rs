/*!
 * Signal Traits
 * Signal flag delivery abstraction
 */

use super::types::{Signal, SignalResult};
use crate::core::types::{Pid, SignalNumber};

/// Signal delivery interface
///
/// A process holds at most one pending signal; a later send overwrites an
/// earlier one that has not been observed yet.
pub trait SignalDelivery: Send + Sync {
    /// Set the pending signal of `target_pid`
    ///
    /// Signal number 0 only checks that the target exists.
    fn send(&self, sender_pid: Pid, target_pid: Pid, signal: SignalNumber) -> SignalResult<()>;

    /// Pending signal without consuming it
    fn pending_signal(&self, pid: Pid) -> SignalResult<Option<Signal>>;

    /// Clear and return the pending signal
    fn take_pending(&self, pid: Pid) -> SignalResult<Option<Signal>>;

    /// Check if process has a pending signal
    fn has_pending(&self, pid: Pid) -> bool {
        matches!(self.pending_signal(pid), Ok(Some(_)))
    }
}
