/*!
 * Wait/Exit Tests
 * Collection rules, blocking and exactly-once reaping
 */

use pretty_assertions::assert_eq;
use proc_lifecycle_kernel::core::limits::BOOT_PID;
use proc_lifecycle_kernel::{
    KernelConfig, ProcessError, ProcessManager, ProcessState, QueueSpawner, Signal, TrapFrame,
    WaitOptions, WaitStatus,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn kernel() -> ProcessManager {
    ProcessManager::new(KernelConfig::minimal(), Arc::new(QueueSpawner::<TrapFrame>::new())).unwrap()
}

fn fork(kernel: &ProcessManager, parent: u32) -> u32 {
    kernel.fork(parent, &TrapFrame::new(0, 0)).unwrap()
}

#[test]
fn test_wait_never_forked_pid() {
    let kernel = kernel();
    assert_eq!(
        kernel.wait(BOOT_PID, 500, WaitOptions::BLOCKING),
        Err(ProcessError::NoSuchProcess(500))
    );
}

#[test]
fn test_wait_on_foreign_zombie() {
    let kernel = kernel();
    let a = fork(&kernel, BOOT_PID);
    let c = fork(&kernel, BOOT_PID);
    kernel.exit(a, WaitStatus::exited(0)).unwrap();

    assert_eq!(
        kernel.wait(c, a, WaitOptions::NOHANG),
        Err(ProcessError::NotAChild { caller: c, pid: a })
    );
    // Refusal does not consume the status
    assert_eq!(kernel.process_info(a).unwrap().state, ProcessState::Zombie);
    assert!(kernel.wait(BOOT_PID, a, WaitOptions::NOHANG).is_ok());
}

#[test]
fn test_nohang_then_exit_then_nohang() {
    let kernel = kernel();
    let pid = fork(&kernel, BOOT_PID);

    assert_eq!(
        kernel.wait(BOOT_PID, pid, WaitOptions::NOHANG),
        Err(ProcessError::WouldBlock(pid))
    );
    assert_eq!(kernel.process_info(pid).unwrap().state, ProcessState::Running);

    kernel.exit(pid, WaitStatus::exited(9)).unwrap();
    let (_, status) = kernel.wait(BOOT_PID, pid, WaitOptions::NOHANG).unwrap();
    assert_eq!(status.exit_code(), Some(9));
}

#[test]
fn test_blocking_wait_sees_final_status() {
    let kernel = kernel();
    let pid = fork(&kernel, BOOT_PID);

    let waiter = {
        let kernel = kernel.clone();
        thread::spawn(move || kernel.wait(BOOT_PID, pid, WaitOptions::BLOCKING))
    };

    thread::sleep(Duration::from_millis(50));
    kernel
        .exit(pid, WaitStatus::signaled(Signal::SIGKILL.number(), false))
        .unwrap();

    let (collected, status) = waiter.join().unwrap().unwrap();
    assert_eq!(collected, pid);
    assert_eq!(status.term_signal(), Some(9));
    assert!(!status.core_dumped());
    assert_eq!(kernel.stats().reaped, 1);
    assert_eq!(kernel.stats().waits_blocked, 1);
}

#[test]
fn test_exit_status_written_once() {
    let kernel = kernel();
    let pid = fork(&kernel, BOOT_PID);
    kernel.exit(pid, WaitStatus::exited(1)).unwrap();
    assert_eq!(
        kernel.exit(pid, WaitStatus::exited(2)),
        Err(ProcessError::AlreadyExited(pid))
    );

    let (_, status) = kernel.wait(BOOT_PID, pid, WaitOptions::BLOCKING).unwrap();
    assert_eq!(status, WaitStatus::exited(1));
}

#[test]
fn test_second_wait_is_no_such_process() {
    let kernel = kernel();
    let pid = fork(&kernel, BOOT_PID);
    kernel.exit(pid, WaitStatus::exited(0)).unwrap();

    assert!(kernel.wait(BOOT_PID, pid, WaitOptions::BLOCKING).is_ok());
    assert_eq!(
        kernel.wait(BOOT_PID, pid, WaitOptions::BLOCKING),
        Err(ProcessError::NoSuchProcess(pid))
    );
}

#[test]
fn test_reap_all_at_shutdown() {
    let kernel = kernel();
    let pids: Vec<u32> = (0..3).map(|_| fork(&kernel, BOOT_PID)).collect();
    for &pid in &pids {
        kernel.exit(pid, WaitStatus::exited(0)).unwrap();
    }

    assert_eq!(kernel.reap_all(), 3);
    assert_eq!(kernel.registry().pids(), vec![BOOT_PID]);
    assert_eq!(kernel.registry().allocated(), 0);
}
