/*!
 * SRTF Scheduler
 *
 * Preemptive Shortest-Remaining-Time-First scheduling of simulated processes
 * on a single virtual processor. The run loop lives in [`task`]; arrival and
 * preemption in [`operations`]; reporting in [`stats`].
 *
 * All mutable state sits behind one lock. Preemption is applied in full by
 * `add()` while holding it, so a concurrent snapshot or report never sees a
 * process inserted without the running interval being closed.
 */

use crate::core::types::{ProcessId, SimTime};
use ahash::HashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot, Notify};
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

mod atomic_stats;
mod clock;
mod config;
mod entry;
mod events;
mod operations;
mod ready;
mod stats;
mod task;

pub use atomic_stats::SchedulerCounters;
pub use clock::Clock;
pub use config::SchedulerConfig;
pub use entry::{ExecutionEntry, Segment};
pub use events::{SchedulerEvent, EVENT_CAPACITY};
pub use ready::ReadySet;
pub use stats::{ExecutionReport, ProcessReport, ProcessStatus};
pub use task::SchedulerTask;

use atomic_stats::AtomicSchedulerStats;
use events::EventBus;

/// Lifecycle of the run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NotStarted,
    Started,
    Closed,
}

/// The run segment currently occupying the processor
#[derive(Debug)]
struct RunningSpan {
    /// Distinguishes this span from any earlier one for the same process
    seq: u64,
    pid: ProcessId,
    started_at: SimTime,
    cancel: Option<oneshot::Sender<()>>,
}

/// Engine state guarded by the scheduler lock
#[derive(Debug)]
struct State {
    ready: ReadySet,
    entries: Vec<ExecutionEntry>,
    entry_index: HashMap<ProcessId, usize>,
    running: Option<RunningSpan>,
    /// Pending wake for a parked run loop; `Some` exactly while idle
    idle: Option<oneshot::Sender<()>>,
    phase: Phase,
    next_seq: u64,
    /// End of the last closed segment; the next span never starts earlier
    busy_until: SimTime,
}

impl State {
    fn new() -> Self {
        Self {
            ready: ReadySet::new(),
            entries: Vec::new(),
            entry_index: HashMap::default(),
            running: None,
            idle: None,
            phase: Phase::NotStarted,
            next_seq: 0,
            busy_until: SimTime::ZERO,
        }
    }

    fn entry_mut(&mut self, pid: ProcessId) -> Option<&mut ExecutionEntry> {
        let idx = *self.entry_index.get(&pid)?;
        self.entries.get_mut(idx)
    }
}

struct Inner {
    config: SchedulerConfig,
    clock: Clock,
    state: Mutex<State>,
    stats: AtomicSchedulerStats,
    events: EventBus,
    /// Signalled every time the run loop parks
    idle_notify: Notify,
}

/// Shortest-Remaining-Time-First scheduler
///
/// Cloning yields another handle to the same engine.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Create a scheduler with the given configuration
    pub fn new(config: SchedulerConfig) -> Self {
        info!(
            unit_ms = config.unit.as_millis() as u64,
            resolution = %config.resolution,
            time_slice = %config.time_slice,
            "SRTF scheduler initialized"
        );

        let clock = Clock::new(&config);
        Self {
            inner: Arc::new(Inner {
                config,
                clock,
                state: Mutex::new(State::new()),
                stats: AtomicSchedulerStats::new(),
                events: EventBus::new(),
                idle_notify: Notify::new(),
            }),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// The simulation clock (read-only)
    pub fn clock(&self) -> &Clock {
        &self.inner.clock
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.inner.clock.now()
    }

    /// Lock-free counter snapshot
    pub fn counters(&self) -> SchedulerCounters {
        self.inner.stats.snapshot()
    }

    /// Subscribe to lifecycle events from this point on
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.inner.events.subscribe()
    }

    /// Lifecycle events as a stream
    pub fn event_stream(&self) -> BroadcastStream<SchedulerEvent> {
        self.inner.events.stream()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now())
            .field("counters", &self.counters())
            .finish()
    }
}
