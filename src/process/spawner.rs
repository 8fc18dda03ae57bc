/*!
 * Context Spawning
 *
 * Boundary to the scheduler. The fork engine hands a `ForkedChild` to a
 * `ContextSpawner`; whatever runs the child calls `ForkedChild::enter`, which
 * is the second return of fork.
 *
 * Two spawners ship in-tree:
 * - `ThreadSpawner`: one OS thread per context, exits through the kernel when
 *   the program returns
 * - `QueueSpawner`: parks children until a cooperative scheduler runs them
 */

use super::frame::ResumableState;
use super::manager::ProcessManager;
use super::types::WaitStatus;
use crate::core::errors::ProcessError;
use crate::core::inline_string::InlineString;
use crate::core::types::Pid;
use parking_lot::Mutex;
use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

/// Scheduler refused to create a context
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("Thread creation failed: {0}")]
    Thread(#[from] std::io::Error),

    #[error("Scheduler rejected context: {0}")]
    Rejected(InlineString),
}

impl From<SpawnError> for ProcessError {
    fn from(err: SpawnError) -> Self {
        ProcessError::SpawnFailed(err.to_string().into())
    }
}

/// A freshly forked context that has not run yet
///
/// Owns the duplicated execution state exclusively. Dropping it without
/// calling `enter` frees the state.
#[derive(Debug)]
pub struct ForkedChild<S> {
    pid: Pid,
    parent: Pid,
    name: InlineString,
    state: Box<S>,
}

impl<S: ResumableState> ForkedChild<S> {
    pub(crate) fn new(pid: Pid, parent: Pid, name: InlineString, state: Box<S>) -> Self {
        Self {
            pid,
            parent,
            name,
            state,
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn parent(&self) -> Pid {
        self.parent
    }

    #[inline]
    pub fn name(&self) -> &InlineString {
        &self.name
    }

    /// Peek at the state before it is entered
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Child-side entry point: fork returns 0 here
    ///
    /// Consumes the heap copy; the returned state is what the child resumes
    /// with.
    pub fn enter(self) -> S {
        let mut state = *self.state;
        state.resume_as_child();
        state
    }
}

/// Scheduler collaborator that starts forked contexts
pub trait ContextSpawner<S: ResumableState>: Send + Sync {
    /// Make `child` schedulable
    ///
    /// On error the child (and its state copy) must have been dropped; the
    /// fork engine then rolls back the pid.
    fn spawn(&self, kernel: &ProcessManager<S>, child: ForkedChild<S>) -> Result<(), SpawnError>;
}

thread_local! {
    static CURRENT_PID: Cell<Option<Pid>> = const { Cell::new(None) };
}

/// Pid of the process the calling thread executes, if any
pub fn current_pid() -> Option<Pid> {
    CURRENT_PID.with(|cell| cell.get())
}

/// Bind the calling thread to `pid`
///
/// `ThreadSpawner` does this for every context it starts; the boot thread
/// calls it once for the boot process.
pub fn set_current_pid(pid: Pid) {
    CURRENT_PID.with(|cell| cell.set(Some(pid)));
}

/// Code a forked context runs after fork returns 0
pub type ProcessProgram<S> = dyn Fn(&ProcessManager<S>, Pid, S) -> WaitStatus + Send + Sync;

/// One OS thread per forked context
///
/// The program's return value is the exit status; the thread publishes it
/// through the kernel before finishing.
pub struct ThreadSpawner<S: ResumableState> {
    program: Arc<ProcessProgram<S>>,
    stack_size: Option<usize>,
}

impl<S: ResumableState> ThreadSpawner<S> {
    pub fn new<F>(program: F) -> Self
    where
        F: Fn(&ProcessManager<S>, Pid, S) -> WaitStatus + Send + Sync + 'static,
    {
        Self {
            program: Arc::new(program),
            stack_size: None,
        }
    }

    #[must_use]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

impl<S: ResumableState> ContextSpawner<S> for ThreadSpawner<S> {
    fn spawn(&self, kernel: &ProcessManager<S>, child: ForkedChild<S>) -> Result<(), SpawnError> {
        let pid = child.pid();
        let kernel = kernel.clone();
        let program = Arc::clone(&self.program);

        let mut builder = thread::Builder::new().name(format!("pid-{}", pid));
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }

        builder.spawn(move || {
            set_current_pid(pid);
            let state = child.enter();
            let status = program(&kernel, pid, state);
            if let Err(e) = kernel.exit(pid, status) {
                warn!(pid = %pid, error = %e, "Context finished but exit was rejected");
            }
        })?;

        debug!(pid = %pid, "Started context thread");
        Ok(())
    }
}

/// Parks forked children until someone runs them
///
/// Useful for deterministic tests and cooperative schedulers.
pub struct QueueSpawner<S> {
    ready: Mutex<VecDeque<ForkedChild<S>>>,
    limit: Option<usize>,
}

impl<S: ResumableState> QueueSpawner<S> {
    pub fn new() -> Self {
        Self {
            ready: Mutex::new(VecDeque::new()),
            limit: None,
        }
    }

    /// Reject spawns once `limit` children are parked
    pub fn bounded(limit: usize) -> Self {
        Self {
            ready: Mutex::new(VecDeque::new()),
            limit: Some(limit),
        }
    }

    pub fn len(&self) -> usize {
        self.ready.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready.lock().is_empty()
    }

    /// Take the oldest parked child
    pub fn pop(&self) -> Option<ForkedChild<S>> {
        self.ready.lock().pop_front()
    }

    /// Take the parked child with `pid`
    pub fn take(&self, pid: Pid) -> Option<ForkedChild<S>> {
        let mut ready = self.ready.lock();
        let idx = ready.iter().position(|child| child.pid() == pid)?;
        ready.remove(idx)
    }

    /// Enter the oldest child, run `program` to completion and exit with its status
    pub fn run_next<F>(&self, kernel: &ProcessManager<S>, program: F) -> Option<Pid>
    where
        F: FnOnce(&ProcessManager<S>, Pid, S) -> WaitStatus,
    {
        let child = self.pop()?;
        let pid = child.pid();
        let status = program(kernel, pid, child.enter());
        if let Err(e) = kernel.exit(pid, status) {
            warn!(pid = %pid, error = %e, "Queued context exit was rejected");
        }
        Some(pid)
    }
}

impl<S: ResumableState> Default for QueueSpawner<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ResumableState> ContextSpawner<S> for QueueSpawner<S> {
    fn spawn(&self, _kernel: &ProcessManager<S>, child: ForkedChild<S>) -> Result<(), SpawnError> {
        let mut ready = self.ready.lock();
        if let Some(limit) = self.limit {
            if ready.len() >= limit {
                return Err(SpawnError::Rejected(
                    format!("run queue full ({} contexts)", limit).into(),
                ));
            }
        }
        ready.push_back(child);
        Ok(())
    }
}
