/*!
 * System Limits and Constants
 *
 * Centralized location for the pid space and syscall ABI constants.
 * [LINUX-COMPAT] marks values that mirror Linux/POSIX.
 */

// =============================================================================
// PID SPACE
// =============================================================================

/// Sentinel parent of the boot process; never allocated
pub const INVALID_PID: u32 = 0;

/// Process the kernel boots into; parent of every first-generation process
pub const BOOT_PID: u32 = 1;

/// First pid handed out to forked processes
pub const PID_MIN: u32 = 2;

/// Largest pid the registry may ever hand out
/// [LINUX-COMPAT] Default /proc/sys/kernel/pid_max
pub const PID_MAX: u32 = 32767;

/// Default number of concurrently allocated pids (excluding the boot process)
pub const DEFAULT_MAX_PROCESSES: usize = 128;

// =============================================================================
// WAIT / SIGNAL ABI
// =============================================================================

/// Non-blocking wait option bit
/// [LINUX-COMPAT]
pub const WNOHANG: u32 = 1;

/// Report stopped children; recognised only so it can be rejected
/// [LINUX-COMPAT]
pub const WUNTRACED: u32 = 2;

/// Highest valid signal number (exclusive of real-time signals)
pub const MAX_SIGNAL: u32 = 31;

// =============================================================================
// TRAP FRAME
// =============================================================================

/// Width of the syscall instruction; a resumed context skips past it
pub const SYSCALL_INSN_BYTES: u64 = 4;

/// General purpose registers saved in a trap frame
pub const TRAPFRAME_GPRS: usize = 16;
