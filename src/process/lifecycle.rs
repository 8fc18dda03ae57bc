/*!
 * Wait/Exit Synchronizer
 *
 * Exit publishes a status and wakes the record's wait channel; wait validates
 * parentage, blocks on that channel and consumes the record.
 *
 * # Orphans
 *
 * When a process exits, each of its children is detached. A detached zombie is
 * released on the spot; a detached running child releases itself when it
 * exits. Detached records can no longer be waited for, even by a later
 * process that happens to reuse the dead parent's pid.
 */

use super::frame::ResumableState;
use super::manager::ProcessManager;
use super::record::ExitOutcome;
use super::types::{WaitOptions, WaitStatus};
use crate::core::errors::ProcessError;
use crate::core::limits::BOOT_PID;
use crate::core::types::{Pid, ProcessResult};
use tracing::{debug, info};

impl<S: ResumableState> ProcessManager<S> {
    /// Publish `status` for `pid` and make it collectable
    ///
    /// Called by the termination collaborator before the context is torn
    /// down. Fails if the pid is unknown or has already exited.
    pub fn exit(&self, pid: Pid, status: WaitStatus) -> ProcessResult<()> {
        if pid == BOOT_PID {
            return Err(ProcessError::invalid_state("boot process cannot exit"));
        }

        let record = self.registry.lookup(pid)?;
        // Children are detached before any waiter can reap this record and
        // recycle its pid
        let outcome = record.publish_exit(status, || self.orphan_children(pid))?;
        self.stats.inc_exits();

        match outcome {
            ExitOutcome::SelfReaped => {
                self.registry.release_record(&record);
                self.stats.inc_orphans_reaped();
                debug!(pid = %pid, "Orphan released its own pid");
            }
            ExitOutcome::AwaitingParent { woken } => {
                debug!(pid = %pid, parent = %record.parent_pid(), woken, "Exit status published");
            }
        }

        info!(pid = %pid, status = %status, "Process exited");
        Ok(())
    }

    fn orphan_children(&self, parent: Pid) {
        for child in self.registry.children_of(parent) {
            if child.detach() {
                self.registry.release_record(&child);
                self.stats.inc_orphans_reaped();
                debug!(pid = %child.pid(), parent = %parent, "Reaped orphaned zombie");
            }
        }
    }

    /// Collect the exit status of `pid` on behalf of its parent `caller`
    pub fn wait(
        &self,
        caller: Pid,
        pid: Pid,
        options: WaitOptions,
    ) -> ProcessResult<(Pid, WaitStatus)> {
        let record = self.registry.lookup_child(caller, pid)?;
        let collected = record.collect(options.is_nohang())?;
        if collected.blocked {
            self.stats.inc_waits_blocked();
        }

        self.registry.release_record(&record);
        self.stats.inc_reaped();
        info!(parent = %caller, pid = %pid, status = %collected.status, "Collected child");

        Ok((pid, collected.status))
    }

    /// Wait with raw option bits, rejecting anything but 0 and WNOHANG
    pub fn waitpid(
        &self,
        caller: Pid,
        pid: Pid,
        options: u32,
    ) -> ProcessResult<(Pid, WaitStatus)> {
        let options = WaitOptions::from_bits(options)?;
        self.wait(caller, pid, options)
    }

    /// Release every uncollected zombie
    ///
    /// Kernel shutdown path; returns the number of records reclaimed.
    pub fn reap_all(&self) -> usize {
        let mut reaped = 0;
        for record in self.registry.zombies() {
            if record.claim_zombie() && self.registry.release_record(&record) {
                reaped += 1;
            }
        }
        if reaped > 0 {
            info!(reaped, "Reclaimed uncollected zombies");
        }
        reaped
    }
}
