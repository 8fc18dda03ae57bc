/*!
 * Process Lifecycle Kernel - Demo Entry Point
 *
 * Boots pid 1 on the main thread, forks a few contexts onto OS threads and
 * collects them:
 * - two workers that exit with a computed code
 * - one server that runs until a signal terminates it
 */

use miette::IntoDiagnostic;
use proc_lifecycle_kernel::process::set_current_pid;
use proc_lifecycle_kernel::{
    init_tracing, KernelConfig, Pid, ProcessManager, Signal, SyscallExecutor, ThreadSpawner,
    TrapFrame, WaitStatus,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

const ENTRY_POINT: u64 = 0x0040_0000;
const STACK_TOP: u64 = 0x7fff_0000;

/// Register carrying the role a child takes after fork
const ROLE_REG: usize = 0;
const ROLE_WORKER: u64 = 1;
const ROLE_SERVER: u64 = 2;

const SIGNAL_POLL: Duration = Duration::from_millis(5);

/// Stack for each context thread; the demo programs need very little
const CONTEXT_STACK_BYTES: usize = 256 * 1024;

fn program(kernel: &ProcessManager, pid: Pid, frame: TrapFrame) -> WaitStatus {
    let sys = SyscallExecutor::new(kernel.clone(), pid);

    match frame.gprs[ROLE_REG] {
        ROLE_SERVER => loop {
            if let Some(status) = sys.check_signals() {
                return status;
            }
            thread::sleep(SIGNAL_POLL);
        },
        _ => {
            let work: u64 = (1..=u64::from(pid)).sum();
            info!(pid, work, "Worker finished");
            WaitStatus::exited((work % 64) as i32)
        }
    }
}

fn main() -> miette::Result<()> {
    let config = KernelConfig::from_env()?;
    init_tracing(&config);

    info!("Process lifecycle kernel starting...");

    let kernel = ProcessManager::<TrapFrame>::builder()
        .with_config(config)
        .with_spawner(Arc::new(
            ThreadSpawner::new(program).with_stack_size(CONTEXT_STACK_BYTES),
        ))
        .build()?;

    set_current_pid(proc_lifecycle_kernel::core::limits::BOOT_PID);
    let init = SyscallExecutor::current(kernel.clone()).into_diagnostic()?;

    let mut frame = TrapFrame::new(ENTRY_POINT, STACK_TOP);
    let mut children = Vec::new();
    for role in [ROLE_WORKER, ROLE_WORKER, ROLE_SERVER] {
        frame.gprs[ROLE_REG] = role;
        init.trap_fork(&mut frame);
        let pid = frame.syscall_result().into_diagnostic()?;
        info!(pid, role, "Forked child");
        children.push((pid, role));
    }

    for (pid, role) in children {
        if role == ROLE_SERVER {
            init.sys_kill(pid, Signal::SIGTERM.number() as i32)
                .into_diagnostic()?;
        }

        let mut raw = 0;
        init.sys_waitpid(pid, Some(&mut raw), 0).into_diagnostic()?;
        info!(pid, status = %WaitStatus::from_raw(raw), "Child collected");
    }

    let leftover = kernel.reap_all();
    info!(leftover, "Shutdown complete");

    let stats = serde_json::to_string_pretty(&kernel.stats()).into_diagnostic()?;
    println!("{}", stats);
    Ok(())
}
