/*!
 * Process Registry Tests
 * Pid allocation, capacity and recycling
 */

use pretty_assertions::assert_eq;
use proc_lifecycle_kernel::core::limits::{BOOT_PID, INVALID_PID, PID_MIN};
use proc_lifecycle_kernel::{
    KernelConfig, ProcessError, ProcessManager, ProcessState, QueueSpawner, TrapFrame, WaitOptions,
    WaitStatus,
};
use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

fn kernel(max: usize) -> ProcessManager {
    let config = KernelConfig::default().with_max_processes(max);
    ProcessManager::new(config, Arc::new(QueueSpawner::<TrapFrame>::new())).unwrap()
}

#[test]
fn test_boot_process_visible() {
    let kernel = kernel(4);
    let info = kernel.process_info(BOOT_PID).unwrap();
    assert_eq!(info.parent_pid, INVALID_PID);
    assert_eq!(info.state, ProcessState::Running);
    assert_eq!(kernel.list_processes().len(), 1);
}

#[test]
fn test_pids_start_at_configured_minimum() {
    let config = KernelConfig::default().with_pid_min(100).with_max_processes(2);
    let kernel = ProcessManager::new(config, Arc::new(QueueSpawner::<TrapFrame>::new())).unwrap();
    let frame = TrapFrame::new(0, 0);

    assert_eq!(kernel.fork(BOOT_PID, &frame).unwrap(), 100);
    assert_eq!(kernel.fork(BOOT_PID, &frame).unwrap(), 101);
    assert_eq!(kernel.registry().pid_range(), (100, 101));
}

#[test]
fn test_invalid_configuration_rejected() {
    let config = KernelConfig::default().with_max_processes(0);
    assert!(ProcessManager::new(config, Arc::new(QueueSpawner::<TrapFrame>::new())).is_err());

    let config = KernelConfig::default().with_pid_min(BOOT_PID);
    assert!(ProcessManager::new(config, Arc::new(QueueSpawner::<TrapFrame>::new())).is_err());
}

#[test]
fn test_exhaustion_reports_capacity() {
    let kernel = kernel(3);
    let frame = TrapFrame::new(0, 0);
    for _ in 0..3 {
        kernel.fork(BOOT_PID, &frame).unwrap();
    }

    let err = kernel.fork(BOOT_PID, &frame).unwrap_err();
    assert_eq!(err, ProcessError::PidsExhausted { capacity: 3 });
    assert_eq!(err.errno(), nix::errno::Errno::EAGAIN);
    assert_eq!(kernel.registry().available(), 0);
}

#[test]
fn test_collected_pid_is_reusable() {
    let kernel = kernel(1);
    let frame = TrapFrame::new(0, 0);

    let pid = kernel.fork(BOOT_PID, &frame).unwrap();
    kernel.exit(pid, WaitStatus::exited(0)).unwrap();
    kernel.wait(BOOT_PID, pid, WaitOptions::BLOCKING).unwrap();

    assert_eq!(kernel.fork(BOOT_PID, &frame).unwrap(), PID_MIN);
}

#[test]
fn test_process_info_serializes() {
    let kernel = kernel(2);
    let pid = kernel.fork(BOOT_PID, &TrapFrame::new(0, 0)).unwrap();
    kernel.exit(pid, WaitStatus::exited(3)).unwrap();

    let info = kernel.process_info(pid).unwrap();
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["state"], "zombie");
    assert_eq!(json["exit_status"], 3 << 8);
    assert_eq!(json["parent_pid"], BOOT_PID);
}

#[derive(Debug, Clone)]
enum Op {
    Fork,
    Reap,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![3 => Just(Op::Fork), 2 => Just(Op::Reap)]
}

proptest! {
    #[test]
    fn prop_live_pids_unique_and_in_range(ops in proptest::collection::vec(op(), 1..64)) {
        let capacity = 6;
        let kernel = kernel(capacity);
        let frame = TrapFrame::new(0, 0);
        let (lo, hi) = kernel.registry().pid_range();
        let mut live: VecDeque<u32> = VecDeque::new();

        for op in ops {
            match op {
                Op::Fork => match kernel.fork(BOOT_PID, &frame) {
                    Ok(pid) => {
                        prop_assert!(pid >= lo && pid <= hi);
                        prop_assert!(!live.contains(&pid));
                        live.push_back(pid);
                    }
                    Err(e) => {
                        prop_assert_eq!(live.len(), capacity);
                        prop_assert_eq!(e, ProcessError::PidsExhausted { capacity });
                    }
                },
                Op::Reap => {
                    if let Some(pid) = live.pop_front() {
                        kernel.exit(pid, WaitStatus::exited(1)).unwrap();
                        let (collected, _) = kernel.wait(BOOT_PID, pid, WaitOptions::NOHANG).unwrap();
                        prop_assert_eq!(collected, pid);
                    }
                }
            }

            let registered: HashSet<u32> = kernel.registry().pids().into_iter().collect();
            prop_assert_eq!(registered.len(), live.len() + 1);
            prop_assert_eq!(kernel.registry().allocated(), live.len());
            prop_assert_eq!(kernel.registry().available(), capacity - live.len());
        }
    }
}
