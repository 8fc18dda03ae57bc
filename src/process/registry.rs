/*!
 * Process Registry
 *
 * Fixed-capacity pid table. Owns every `ProcessRecord` and the free list of
 * recyclable pids.
 *
 * # Design
 *
 * - Records live in a sharded `DashMap`; lookups take a shard read lock only
 *   long enough to clone the record's `Arc`
 * - The free list is a bounded lock-free queue pre-filled with the whole pid
 *   range, so capacity is enforced by the queue itself
 * - Released pids go to the back of the queue, which delays reuse as long as
 *   possible
 *
 * # Lock ordering
 *
 * A record lock may be held while taking a shard lock (fork inserts the child
 * while its parent is locked). The reverse never happens: nothing locks a
 * record while holding a shard guard.
 */

use super::record::ProcessRecord;
use super::types::ProcessInfo;
use crate::core::config::KernelConfig;
use crate::core::errors::ProcessError;
use crate::core::inline_string::InlineString;
use crate::core::limits::{BOOT_PID, INVALID_PID};
use crate::core::types::{KernelResult, Pid, ProcessResult};
use ahash::RandomState;
use crossbeam_queue::ArrayQueue;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Name given to the boot process
pub const BOOT_PROCESS_NAME: &str = "init";

pub struct ProcessRegistry {
    records: DashMap<Pid, Arc<ProcessRecord>, RandomState>,
    free: ArrayQueue<Pid>,
    capacity: usize,
    pid_min: Pid,
    pid_max: Pid,
}

impl ProcessRegistry {
    /// Create a registry seeded with the boot process
    pub fn new(config: &KernelConfig) -> KernelResult<Self> {
        config.validate()?;

        let capacity = config.max_processes;
        let free = ArrayQueue::new(capacity);
        for pid in config.pid_min..=config.pid_max() {
            // Queue is sized to the range, so this cannot overflow
            let _ = free.push(pid);
        }

        let records = DashMap::with_capacity_and_hasher(capacity + 1, RandomState::new());
        records.insert(
            BOOT_PID,
            Arc::new(ProcessRecord::new(
                BOOT_PID,
                INVALID_PID,
                InlineString::from(BOOT_PROCESS_NAME),
            )),
        );

        info!(
            capacity,
            pid_min = config.pid_min,
            pid_max = config.pid_max(),
            "Process registry initialized"
        );

        Ok(Self {
            records,
            free,
            capacity,
            pid_min: config.pid_min,
            pid_max: config.pid_max(),
        })
    }

    /// Reserve a pid and create a running record whose parent is `parent`
    ///
    /// The parent must be a running process; the child is inserted while the
    /// parent is locked so the parent's exit path always sees it.
    pub fn allocate(&self, parent: Pid, name: impl Into<InlineString>) -> ProcessResult<Pid> {
        let parent_record = self.lookup(parent)?;
        let name = name.into();

        parent_record.with_running(|| {
            let pid = self.free.pop().ok_or(ProcessError::PidsExhausted {
                capacity: self.capacity,
            })?;

            let record = Arc::new(ProcessRecord::new(pid, parent, name));
            if self.records.insert(pid, record).is_some() {
                error!(pid = %pid, "Free list handed out a pid that is still allocated");
            }

            debug!(pid = %pid, parent = %parent, "Allocated pid");
            Ok(pid)
        })
    }

    /// Find the record for `pid`
    pub fn lookup(&self, pid: Pid) -> ProcessResult<Arc<ProcessRecord>> {
        self.records
            .get(&pid)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ProcessError::NoSuchProcess(pid))
    }

    /// Check whether `candidate_parent` may collect `pid`
    ///
    /// False for processes it did not create, and for children detached when
    /// their parent exited.
    pub fn is_parent_of(&self, candidate_parent: Pid, pid: Pid) -> ProcessResult<bool> {
        match self.lookup_child(candidate_parent, pid) {
            Ok(_) => Ok(true),
            Err(ProcessError::NotAChild { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Find `pid` on behalf of its parent `parent`
    pub(crate) fn lookup_child(&self, parent: Pid, pid: Pid) -> ProcessResult<Arc<ProcessRecord>> {
        let record = self.lookup(pid)?;
        if record.parent_pid() != parent || record.is_detached() {
            return Err(ProcessError::NotAChild { caller: parent, pid });
        }
        Ok(record)
    }

    /// Erase a collected zombie and recycle its pid
    ///
    /// Fails if the pid is unknown, or if its status has not been claimed yet.
    pub fn release(&self, pid: Pid) -> ProcessResult<()> {
        let record = self.lookup(pid)?;
        if !record.is_collected() {
            return Err(ProcessError::invalid_state(format!(
                "pid {} released before its exit status was collected",
                pid
            )));
        }
        self.release_record(&record);
        Ok(())
    }

    /// Remove exactly this record (not a newer holder of the same pid)
    pub(crate) fn release_record(&self, record: &Arc<ProcessRecord>) -> bool {
        let pid = record.pid();
        let removed = self
            .records
            .remove_if(&pid, |_, current| Arc::ptr_eq(current, record))
            .is_some();

        if removed {
            self.recycle(pid);
        }
        removed
    }

    /// Roll back an allocation whose context never started
    pub(crate) fn unwind(&self, pid: Pid) {
        if self.records.remove(&pid).is_some() {
            self.recycle(pid);
            debug!(pid = %pid, "Unwound pid allocation");
        }
    }

    fn recycle(&self, pid: Pid) {
        if self.free.push(pid).is_err() {
            error!(pid = %pid, "Pid free list overflow; pid released twice");
        } else {
            debug!(pid = %pid, "Pid returned to free list");
        }
    }

    /// Records whose parent pid is `parent`
    ///
    /// Collected into a vector so no shard guard outlives the call.
    pub fn children_of(&self, parent: Pid) -> Vec<Arc<ProcessRecord>> {
        self.records
            .iter()
            .filter(|entry| entry.value().parent_pid() == parent)
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// All zombie records, in no particular order
    pub fn zombies(&self) -> Vec<Arc<ProcessRecord>> {
        let all: Vec<Arc<ProcessRecord>> = self
            .records
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        all.into_iter().filter(|record| record.is_zombie()).collect()
    }

    /// Registered records, boot process and zombies included
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn contains(&self, pid: Pid) -> bool {
        self.records.contains_key(&pid)
    }

    /// Maximum number of concurrently allocated pids
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pids currently on the free list
    #[inline]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Pids currently allocated (boot process excluded)
    #[inline]
    pub fn allocated(&self) -> usize {
        self.capacity - self.free.len()
    }

    /// Range of pids this registry hands out
    #[inline]
    pub fn pid_range(&self) -> (Pid, Pid) {
        (self.pid_min, self.pid_max)
    }

    /// Sorted list of every registered pid, boot process included
    pub fn pids(&self) -> Vec<Pid> {
        let mut pids: Vec<Pid> = self.records.iter().map(|entry| *entry.key()).collect();
        pids.sort_unstable();
        pids
    }

    pub fn snapshot(&self, pid: Pid) -> Option<ProcessInfo> {
        self.lookup(pid).ok().map(|record| record.snapshot())
    }
}
