/*!
 * Orphan Tests
 * Children outliving their parent are never left uncollectable
 */

use pretty_assertions::assert_eq;
use proc_lifecycle_kernel::core::limits::BOOT_PID;
use proc_lifecycle_kernel::{
    KernelConfig, ProcessError, ProcessManager, QueueSpawner, TrapFrame, WaitOptions, WaitStatus,
};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn kernel(max: usize) -> ProcessManager {
    let config = KernelConfig::default().with_max_processes(max);
    ProcessManager::new(config, Arc::new(QueueSpawner::<TrapFrame>::new())).unwrap()
}

#[test]
fn test_zombie_child_released_when_parent_exits() {
    let kernel = kernel(4);
    let parent = kernel.fork(BOOT_PID, &TrapFrame::new(0, 0)).unwrap();
    let child = kernel.fork(parent, &TrapFrame::new(0, 0)).unwrap();

    kernel.exit(child, WaitStatus::exited(0)).unwrap();
    kernel.exit(parent, WaitStatus::exited(0)).unwrap();

    assert!(!kernel.registry().contains(child));
    assert!(kernel.registry().contains(parent));
    assert_eq!(kernel.stats().orphans_reaped, 1);
}

#[test]
fn test_running_orphan_releases_itself() {
    let kernel = kernel(4);
    let parent = kernel.fork(BOOT_PID, &TrapFrame::new(0, 0)).unwrap();
    let child = kernel.fork(parent, &TrapFrame::new(0, 0)).unwrap();

    kernel.exit(parent, WaitStatus::exited(0)).unwrap();
    assert!(kernel.process_info(child).unwrap().detached);

    kernel.exit(child, WaitStatus::exited(5)).unwrap();
    assert!(!kernel.registry().contains(child));
    assert_eq!(kernel.stats().orphans_reaped, 1);
}

#[test]
fn test_reused_parent_pid_cannot_collect_orphan() {
    // One slot left over after parent and child, so the parent's pid is the
    // next one handed out once it is collected
    let kernel = kernel(2);
    let parent = kernel.fork(BOOT_PID, &TrapFrame::new(0, 0)).unwrap();
    let orphan = kernel.fork(parent, &TrapFrame::new(0, 0)).unwrap();

    kernel.exit(parent, WaitStatus::exited(0)).unwrap();
    kernel.wait(BOOT_PID, parent, WaitOptions::BLOCKING).unwrap();

    let impostor = kernel.fork(BOOT_PID, &TrapFrame::new(0, 0)).unwrap();
    assert_eq!(impostor, parent);

    kernel.exit(orphan, WaitStatus::exited(0)).unwrap();
    assert_eq!(
        kernel.wait(impostor, orphan, WaitOptions::NOHANG),
        Err(ProcessError::NoSuchProcess(orphan))
    );
}

#[test]
fn test_detached_running_child_refuses_wait() {
    let kernel = kernel(2);
    let parent = kernel.fork(BOOT_PID, &TrapFrame::new(0, 0)).unwrap();
    let orphan = kernel.fork(parent, &TrapFrame::new(0, 0)).unwrap();
    kernel.exit(parent, WaitStatus::exited(0)).unwrap();
    kernel.wait(BOOT_PID, parent, WaitOptions::BLOCKING).unwrap();

    let impostor = kernel.fork(BOOT_PID, &TrapFrame::new(0, 0)).unwrap();
    assert_eq!(impostor, parent);
    assert_eq!(
        kernel.wait(impostor, orphan, WaitOptions::NOHANG),
        Err(ProcessError::NotAChild { caller: impostor, pid: orphan })
    );
}

#[test]
fn test_parent_exit_releases_its_own_blocked_waiter() {
    // A second context of the parent is still blocked on the child when the
    // parent exits
    let kernel = kernel(4);
    let parent = kernel.fork(BOOT_PID, &TrapFrame::new(0, 0)).unwrap();
    let child = kernel.fork(parent, &TrapFrame::new(0, 0)).unwrap();

    let (tx, rx) = mpsc::channel();
    let waiter = {
        let kernel = kernel.clone();
        thread::spawn(move || {
            let _ = tx.send(kernel.wait(parent, child, WaitOptions::BLOCKING));
        })
    };

    thread::sleep(Duration::from_millis(50));
    kernel.exit(parent, WaitStatus::exited(0)).unwrap();
    kernel.exit(child, WaitStatus::exited(0)).unwrap();

    let result = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(result, Err(ProcessError::NotAChild { caller: parent, pid: child }));
    waiter.join().unwrap();
    assert!(!kernel.registry().contains(child));
    assert_eq!(kernel.stats().reaped, 0);
}
