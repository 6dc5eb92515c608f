/*!
 * Scheduler Core Operations
 * Arrival, preemption, shutdown and read-only views
 */

use super::entry::{ExecutionEntry, Segment};
use super::events::SchedulerEvent;
use super::{Phase, RunningSpan, Scheduler, State};
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::{ProcessId, ProcessName, SimTime};
use crate::process::{Process, ProcessSnapshot};
use tracing::{debug, info, instrument};

impl Scheduler {
    /// Add a process to the ready set
    ///
    /// Wakes the run loop if it is idle. If a process is running and the
    /// newcomer's burst is strictly shorter than the running process's live
    /// remaining time, the running process is preempted at the current clock
    /// value before this call returns.
    pub fn add(&self, process: Process) -> SchedulerResult<ProcessId> {
        let mut state = self.inner.state.lock();
        if state.phase == Phase::Closed {
            return Err(SchedulerError::Closed);
        }

        let now = self.now();
        let pid = process.id();
        let burst = process.burst_time();

        info!(
            pid = %pid.short(),
            name = process.name(),
            burst = %burst,
            clock = %now,
            "Adding {} with {} burst time",
            process.name(),
            burst
        );

        let idx = state.entries.len();
        state.entries.push(ExecutionEntry::new(&process, now));
        state.entry_index.insert(pid, idx);
        self.inner.events.publish(SchedulerEvent::Added {
            id: pid,
            name: process.name().into(),
            burst_time: burst,
            at: now,
        });
        state.ready.push(process);
        self.inner.stats.inc_active();

        if let Some(wake) = state.idle.take() {
            let _ = wake.send(());
            debug!(clock = %now, "Waking idle scheduler");
            self.inner.events.publish(SchedulerEvent::Woken { at: now });
        }

        if let Some(current_remaining) = live_remaining(&state, now) {
            if burst < current_remaining {
                preempt(self, &mut state, now, pid);
            } else {
                debug!(
                    pid = %pid.short(),
                    burst = %burst,
                    current_remaining = %current_remaining,
                    "Running process keeps the processor"
                );
            }
        }

        Ok(pid)
    }

    /// Close the scheduler
    ///
    /// Only allowed while the run loop is idle, or before it was ever
    /// started. Stops the clock and wakes the parked loop so it can exit.
    #[instrument(skip(self), level = "debug")]
    pub fn close(&self) -> SchedulerResult<()> {
        let mut state = self.inner.state.lock();
        match state.phase {
            Phase::Closed => return Err(SchedulerError::Closed),
            Phase::Started if state.idle.is_none() => {
                return Err(SchedulerError::StillRunning(busy_name(&state)));
            }
            _ => {}
        }

        state.phase = Phase::Closed;
        // Dropping the pending wake resolves the parked loop with an error
        drop(state.idle.take());
        self.inner.clock.stop();

        let now = self.now();
        info!(clock = %now, "Scheduler closed");
        self.inner.events.publish(SchedulerEvent::Closed { at: now });
        Ok(())
    }

    /// The ready set, in arrival order, with live remaining times
    pub fn snapshot(&self) -> Vec<ProcessSnapshot> {
        let state = self.inner.state.lock();
        let now = self.now();
        let running = state.running.as_ref().map(|s| s.pid);
        let live = live_remaining(&state, now);

        state
            .ready
            .iter()
            .map(|p| {
                if Some(p.id()) == running {
                    p.snapshot(true, live.unwrap_or(p.remaining_time()))
                } else {
                    p.snapshot(false, p.remaining_time())
                }
            })
            .collect()
    }

    /// The process that would be chosen if the processor were free now
    pub fn select_next(&self) -> Option<ProcessSnapshot> {
        let state = self.inner.state.lock();
        state
            .ready
            .select_next()
            .map(|p| p.snapshot(false, p.remaining_time()))
    }

    /// Process currently holding the processor
    pub fn current(&self) -> Option<ProcessSnapshot> {
        let state = self.inner.state.lock();
        let span = state.running.as_ref()?;
        let live = live_remaining(&state, self.now())?;
        state.ready.get(span.pid).map(|p| p.snapshot(true, live))
    }

    /// Copies of every execution entry, in arrival order
    pub fn entries(&self) -> Vec<ExecutionEntry> {
        self.inner.state.lock().entries.clone()
    }

    /// Execution entry for one process
    pub fn entry(&self, pid: ProcessId) -> Option<ExecutionEntry> {
        let state = self.inner.state.lock();
        let idx = *state.entry_index.get(&pid)?;
        state.entries.get(idx).cloned()
    }

    /// True while the run loop is parked waiting for work
    pub fn is_idle(&self) -> bool {
        self.inner.state.lock().idle.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().phase == Phase::Closed
    }

    /// Number of incomplete processes
    pub fn len(&self) -> usize {
        self.inner.state.lock().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Remaining time of the running process at `now`; the stored field only
/// shrinks when a segment closes, so the open segment is deducted here.
fn live_remaining(state: &State, now: SimTime) -> Option<SimTime> {
    let span = state.running.as_ref()?;
    let process = state.ready.get(span.pid)?;
    Some(process.remaining_time() - (now - span.started_at))
}

/// Close the running segment at `now` and signal the run loop to reselect
fn preempt(scheduler: &Scheduler, state: &mut State, now: SimTime, by: ProcessId) {
    let Some(mut span) = state.running.take() else {
        return;
    };
    let Some((remaining, name)) = close_span(state, &span, now) else {
        return;
    };

    if let Some(cancel) = span.cancel.take() {
        let _ = cancel.send(());
    }

    scheduler.inner.stats.inc_preemptions();
    info!(
        pid = %span.pid.short(),
        name = %name,
        remaining = %remaining,
        clock = %now,
        "Preempting {} with {}s left",
        name,
        remaining
    );
    scheduler.inner.events.publish(SchedulerEvent::Preempted {
        id: span.pid,
        name,
        by,
        remaining_time: remaining,
        at: now,
    });
}

/// Charge a span that ends at `now` and record its segment.
///
/// Returns the process's remaining time and name, or `None` if it already
/// left the ready set. Empty segments are not recorded.
pub(super) fn close_span(
    state: &mut State,
    span: &RunningSpan,
    now: SimTime,
) -> Option<(SimTime, ProcessName)> {
    let process = state.ready.get_mut(span.pid)?;
    let executed = process.consume(now - span.started_at);
    let remaining = process.remaining_time();
    let name: ProcessName = process.name().into();

    if !executed.is_zero() {
        let end = span.started_at + executed;
        if let Some(entry) = state.entry_mut(span.pid) {
            entry.push(Segment::new(span.started_at, end));
        }
        state.busy_until = state.busy_until.max(end);
    }
    Some((remaining, name))
}

/// Name of whatever keeps the scheduler busy, for refusal messages
fn busy_name(state: &State) -> ProcessName {
    state
        .running
        .as_ref()
        .and_then(|s| state.ready.get(s.pid))
        .or_else(|| state.ready.select_next())
        .map(|p| p.name().into())
        .unwrap_or_else(|| "scheduler".into())
}
