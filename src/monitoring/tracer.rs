/*!
 * Structured Tracing
 * Subscriber setup and per-syscall spans using the tracing crate
 *
 * Features:
 * - Sequential trace IDs for correlating a syscall with its log lines
 * - JSON-formatted logs for structured parsing
 * - Durations recorded when a span closes
 */

use crate::core::config::KernelConfig;
use crate::core::types::Pid;
use nix::errno::Errno;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, span, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Slow-call threshold; blocking waits are expected to exceed it
const SLOW_SYSCALL_MS: u128 = 10;

static NEXT_TRACE_ID: AtomicU64 = AtomicU64::new(1);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - KERNEL_TRACE_JSON: Enable JSON output, read into `KernelConfig::trace_json`
///
/// A subscriber installed earlier (by a test harness, say) is left in place.
pub fn init_tracing(config: &KernelConfig) {
    if let Err(e) = try_init_tracing(config) {
        debug!(error = %e, "Global subscriber already installed");
    }
}

/// Like `init_tracing`, but reports an already installed subscriber
pub fn try_init_tracing(
    config: &KernelConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if config.trace_json {
        // JSON output for production/parsing
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?;
        info!("Structured tracing initialized with JSON output");
    } else {
        // Human-readable output for development
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .compact(),
            )
            .try_init()?;
        info!("Structured tracing initialized");
    }
    Ok(())
}

/// Span wrapping one syscall dispatch
pub struct SyscallSpan {
    span: Span,
    start: Instant,
    trace_id: u64,
}

impl SyscallSpan {
    pub fn new(syscall_name: &'static str, pid: Pid) -> Self {
        let trace_id = NEXT_TRACE_ID.fetch_add(1, Ordering::Relaxed);
        let span = span!(
            Level::INFO,
            "syscall",
            trace_id,
            syscall = syscall_name,
            pid,
            result = tracing::field::Empty,
            errno = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            trace_id,
        }
    }

    pub fn trace_id(&self) -> u64 {
        self.trace_id
    }

    /// Record the outcome of the call
    pub fn record_result(&self, result: &Result<i32, Errno>) {
        match result {
            Ok(value) => {
                self.span.record("result", *value);
            }
            Err(errno) => {
                self.span.record("errno", tracing::field::display(errno));
            }
        }
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for SyscallSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        self.span.record("duration_us", elapsed.as_micros() as u64);

        if elapsed.as_millis() > SLOW_SYSCALL_MS {
            let _entered = self.span.enter();
            debug!(
                trace_id = self.trace_id,
                duration_ms = elapsed.as_millis() as u64,
                "Slow syscall"
            );
        }
    }
}

/// Helper to create a syscall span
#[inline]
pub fn syscall_span(name: &'static str, pid: Pid) -> SyscallSpan {
    SyscallSpan::new(name, pid)
}
