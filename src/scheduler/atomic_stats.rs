/*!
 * Lock-Free Scheduler Counters
 * Atomic counters readable without taking the scheduler lock
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counter snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerCounters {
    pub dispatches: u64,
    pub preemptions: u64,
    pub completions: u64,
    pub context_switches: u64,
    pub discarded: u64,
    pub active_processes: usize,
}

/// Atomic scheduler counters
///
/// # Performance
/// - Cache-line aligned to prevent false sharing with the state lock
/// - Relaxed ordering; each value is exact, cross-counter consistency is not guaranteed
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct AtomicSchedulerStats {
    dispatches: AtomicU64,
    preemptions: AtomicU64,
    completions: AtomicU64,
    context_switches: AtomicU64,
    discarded: AtomicU64,
    active_processes: AtomicUsize,
}

impl AtomicSchedulerStats {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// A process was given the processor
    #[inline(always)]
    pub fn inc_dispatched(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        self.context_switches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_preemptions(&self) {
        self.preemptions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_completions(&self) {
        self.completions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_active(&self) {
        self.active_processes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn dec_active(&self) {
        self.active_processes.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn snapshot(&self) -> SchedulerCounters {
        SchedulerCounters {
            dispatches: self.dispatches.load(Ordering::Relaxed),
            preemptions: self.preemptions.load(Ordering::Relaxed),
            completions: self.completions.load(Ordering::Relaxed),
            context_switches: self.context_switches.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            active_processes: self.active_processes.load(Ordering::Relaxed),
        }
    }
}
