/*!
 * Fork Engine
 *
 * Parent side of fork. The child side is `ForkedChild::enter`, run by
 * whichever context the spawner creates.
 */

use super::frame::ResumableState;
use super::manager::ProcessManager;
use super::spawner::ForkedChild;
use crate::core::types::{Pid, ProcessResult};
use tracing::{info, warn};

impl<S: ResumableState> ProcessManager<S> {
    /// Clone the caller into a new process
    ///
    /// Returns the child's pid to the caller. On any failure nothing is left
    /// behind: no state copy, no pid, no context.
    pub fn fork(&self, caller: Pid, state: &S) -> ProcessResult<Pid> {
        let result = self.fork_inner(caller, state);
        match &result {
            Ok(child) => {
                self.stats.inc_forks();
                info!(parent = %caller, child = %child, "Forked process");
            }
            Err(e) => {
                self.stats.inc_fork_failures();
                warn!(parent = %caller, error = %e, "Fork failed");
            }
        }
        result
    }

    fn fork_inner(&self, caller: Pid, state: &S) -> ProcessResult<Pid> {
        // Copy first; the caller's in-place state is not stable past this call
        let copy = state.try_duplicate()?;

        let parent = self.registry.lookup(caller)?;
        let pid = self.registry.allocate(caller, parent.name().clone())?;

        let child = ForkedChild::new(pid, caller, parent.name().clone(), copy);
        if let Err(e) = self.spawner.spawn(self, child) {
            self.registry.unwind(pid);
            return Err(e.into());
        }

        Ok(pid)
    }
}
