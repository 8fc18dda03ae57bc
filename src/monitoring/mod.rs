/*!
 * Monitoring
 * Structured tracing setup and syscall spans
 */

mod tracer;

pub use crate::process::stats::{AtomicLifecycleStats, LifecycleStats};
pub use tracer::{init_tracing, syscall_span, try_init_tracing, SyscallSpan};
