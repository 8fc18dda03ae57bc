/*!
 * Lock-Free Lifecycle Statistics
 * Atomic counters updated on fork, exit, wait and kill
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of lifecycle counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LifecycleStats {
    pub forks: u64,
    pub fork_failures: u64,
    pub exits: u64,
    pub reaped: u64,
    pub orphans_reaped: u64,
    pub waits_blocked: u64,
    pub signals_sent: u64,
}

/// Atomic lifecycle statistics
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - Relaxed ordering; counters are independent of each other
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct AtomicLifecycleStats {
    forks: AtomicU64,
    fork_failures: AtomicU64,
    exits: AtomicU64,
    reaped: AtomicU64,
    orphans_reaped: AtomicU64,
    waits_blocked: AtomicU64,
    signals_sent: AtomicU64,
}

impl AtomicLifecycleStats {
    #[inline]
    pub const fn new() -> Self {
        Self {
            forks: AtomicU64::new(0),
            fork_failures: AtomicU64::new(0),
            exits: AtomicU64::new(0),
            reaped: AtomicU64::new(0),
            orphans_reaped: AtomicU64::new(0),
            waits_blocked: AtomicU64::new(0),
            signals_sent: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn inc_forks(&self) {
        self.forks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_fork_failures(&self) {
        self.fork_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_exits(&self) {
        self.exits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_reaped(&self) {
        self.reaped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_orphans_reaped(&self) {
        self.orphans_reaped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_waits_blocked(&self) {
        self.waits_blocked.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_signals_sent(&self) {
        self.signals_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats (no locks required)
    ///
    /// # Note
    /// Values may not be perfectly consistent with each other due to concurrent updates,
    /// but each individual value is accurate.
    pub fn snapshot(&self) -> LifecycleStats {
        LifecycleStats {
            forks: self.forks.load(Ordering::Relaxed),
            fork_failures: self.fork_failures.load(Ordering::Relaxed),
            exits: self.exits.load(Ordering::Relaxed),
            reaped: self.reaped.load(Ordering::Relaxed),
            orphans_reaped: self.orphans_reaped.load(Ordering::Relaxed),
            waits_blocked: self.waits_blocked.load(Ordering::Relaxed),
            signals_sent: self.signals_sent.load(Ordering::Relaxed),
        }
    }
}
