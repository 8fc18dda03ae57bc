/*!
 * Fork Tests
 * Child setup, state isolation and rollback on failure
 */

use pretty_assertions::assert_eq;
use proc_lifecycle_kernel::core::limits::BOOT_PID;
use proc_lifecycle_kernel::process::SpawnError;
use proc_lifecycle_kernel::{
    ContextSpawner, ForkedChild, KernelConfig, ProcessError, ProcessManager, ProcessResult,
    QueueSpawner, ResumableState, TrapFrame,
};
use std::sync::Arc;

fn queued() -> (ProcessManager, Arc<QueueSpawner<TrapFrame>>) {
    let spawner = Arc::new(QueueSpawner::<TrapFrame>::new());
    let kernel = ProcessManager::new(KernelConfig::minimal(), spawner.clone()).unwrap();
    (kernel, spawner)
}

#[test]
fn test_child_copy_is_independent() {
    let (kernel, spawner) = queued();
    let mut frame = TrapFrame::new(0x1000, 0x9000);
    frame.gprs[3] = 42;

    let pid = kernel.fork(BOOT_PID, &frame).unwrap();
    frame.gprs[3] = 7;

    let child = spawner.take(pid).unwrap();
    assert_eq!(child.state().gprs[3], 42);
    let resumed = child.enter();
    assert_eq!(resumed.gprs[3], 42);
    assert_eq!(resumed.sp, 0x9000);
    assert_eq!(resumed.syscall_result(), Ok(0));
}

#[test]
fn test_child_inherits_parent_name() {
    let (kernel, spawner) = queued();
    let child = kernel.fork(BOOT_PID, &TrapFrame::new(0, 0)).unwrap();
    let grandchild = kernel.fork(child, &TrapFrame::new(0, 0)).unwrap();

    assert_eq!(kernel.process_info(grandchild).unwrap().name.as_str(), "init");
    assert_eq!(kernel.process_info(grandchild).unwrap().parent_pid, child);
    assert_eq!(spawner.len(), 2);
}

#[test]
fn test_unknown_caller_cannot_fork() {
    let (kernel, spawner) = queued();
    assert_eq!(
        kernel.fork(99, &TrapFrame::new(0, 0)),
        Err(ProcessError::NoSuchProcess(99))
    );
    assert!(spawner.is_empty());
}

#[test]
fn test_zombie_cannot_fork() {
    let (kernel, _spawner) = queued();
    let pid = kernel.fork(BOOT_PID, &TrapFrame::new(0, 0)).unwrap();
    kernel
        .exit(pid, proc_lifecycle_kernel::WaitStatus::exited(0))
        .unwrap();

    assert_eq!(
        kernel.fork(pid, &TrapFrame::new(0, 0)),
        Err(ProcessError::AlreadyExited(pid))
    );
}

struct RefusingSpawner;

impl ContextSpawner<TrapFrame> for RefusingSpawner {
    fn spawn(
        &self,
        _kernel: &ProcessManager<TrapFrame>,
        _child: ForkedChild<TrapFrame>,
    ) -> Result<(), SpawnError> {
        Err(SpawnError::Rejected("no contexts left".into()))
    }
}

#[test]
fn test_spawn_failure_leaves_nothing_behind() {
    let kernel = ProcessManager::new(KernelConfig::minimal(), Arc::new(RefusingSpawner)).unwrap();
    let available = kernel.registry().available();

    let err = kernel.fork(BOOT_PID, &TrapFrame::new(0, 0)).unwrap_err();
    assert!(matches!(err, ProcessError::SpawnFailed(_)));
    assert_eq!(err.errno(), nix::errno::Errno::ENOMEM);
    assert_eq!(kernel.registry().available(), available);
    assert_eq!(kernel.registry().pids(), vec![BOOT_PID]);
}

/// State whose heap copy always fails
#[derive(Debug)]
struct Unclonable;

impl ResumableState for Unclonable {
    fn try_duplicate(&self) -> ProcessResult<Box<Self>> {
        Err(ProcessError::OutOfMemory("state copy".into()))
    }

    fn resume_as_child(&mut self) {}
}

#[test]
fn test_copy_failure_allocates_no_pid() {
    let spawner = Arc::new(QueueSpawner::<Unclonable>::new());
    let kernel = ProcessManager::new(KernelConfig::minimal(), spawner.clone()).unwrap();

    let err = kernel.fork(BOOT_PID, &Unclonable).unwrap_err();
    assert_eq!(err.errno(), nix::errno::Errno::ENOMEM);
    assert_eq!(kernel.registry().allocated(), 0);
    assert!(spawner.is_empty());
    assert_eq!(kernel.stats().fork_failures, 1);
    assert_eq!(kernel.stats().forks, 0);
}
