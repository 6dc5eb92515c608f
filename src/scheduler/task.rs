/*!
 * Scheduler Task - Run Loop
 *
 * Background task that repeatedly selects the process with the shortest
 * remaining time and runs it until it either completes or is preempted by
 * an arrival.
 *
 * Each run span is a `tokio::select!` over two wake sources: a deadline
 * timer for natural completion and a oneshot cancel fired by `add()`.
 * `add()` has already closed the preempted segment by the time the cancel
 * lands, and the completion path re-checks under the lock that its span is
 * still the active one, so a span is accounted exactly once.
 *
 * # Shutdown
 *
 * - Preferred: `shutdown().await` waits until the loop is idle, closes the
 *   scheduler and joins the task.
 * - Fallback: dropping the handle aborts the task, logs a warning and
 *   closes the scheduler with the interrupted segment accounted for.
 */

use super::entry::Segment;
use super::events::SchedulerEvent;
use super::operations::close_span;
use super::{Phase, RunningSpan, Scheduler};
use crate::core::errors::{SchedulerError, SchedulerResult};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// What the run loop should do next
enum Step {
    Run {
        seq: u64,
        deadline: Instant,
        cancel: oneshot::Receiver<()>,
    },
    Idle(oneshot::Receiver<()>),
    Exit,
}

impl Scheduler {
    /// Start the clock and spawn the run loop on the current tokio runtime
    pub fn start(&self) -> SchedulerResult<SchedulerTask> {
        {
            let mut state = self.inner.state.lock();
            match state.phase {
                Phase::Closed => return Err(SchedulerError::Closed),
                Phase::Started => return Err(SchedulerError::AlreadyStarted),
                Phase::NotStarted => state.phase = Phase::Started,
            }
            self.inner.clock.start();
        }

        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            run_loop(scheduler).await;
        });

        info!(queued = self.len(), "Scheduler run loop spawned");
        Ok(SchedulerTask {
            scheduler: self.clone(),
            handle: Some(handle),
        })
    }

    /// SELECTING: pick the next process and open a run span, or park
    fn next_step(&self) -> Step {
        let mut state = self.inner.state.lock();
        if state.phase == Phase::Closed {
            return Step::Exit;
        }

        loop {
            let now = self.now();
            let selected = state
                .ready
                .select_next()
                .map(|p| (p.id(), p.name().to_string(), p.remaining_time()));

            let Some((pid, name, remaining)) = selected else {
                let (tx, rx) = oneshot::channel();
                state.idle = Some(tx);
                drop(state);

                info!(clock = %now, "scheduler entering idle state");
                self.inner.events.publish(SchedulerEvent::Idle { at: now });
                self.inner.idle_notify.notify_waiters();
                return Step::Idle(rx);
            };

            if remaining.is_zero() {
                state.ready.remove(pid);
                self.inner.stats.inc_discarded();
                self.inner.stats.dec_active();
                debug!(pid = %pid.short(), name = %name, "Dropping process with no remaining time");
                self.inner.events.publish(SchedulerEvent::Discarded {
                    id: pid,
                    name: name.as_str().into(),
                    at: now,
                });
                continue;
            }

            let seq = state.next_seq;
            state.next_seq += 1;

            // A completion can land between ticks, so the clock may still
            // read earlier than where the previous segment ended
            let start = now.max(state.busy_until);
            let deadline = self
                .inner
                .clock
                .deadline(start + remaining)
                .unwrap_or_else(|| Instant::now() + self.inner.config.real_duration(remaining));

            let (cancel_tx, cancel_rx) = oneshot::channel();
            state.running = Some(RunningSpan {
                seq,
                pid,
                started_at: start,
                cancel: Some(cancel_tx),
            });

            self.inner.stats.inc_dispatched();
            info!(
                pid = %pid.short(),
                name = %name,
                remaining = %remaining,
                clock = %start,
                "Executing {} with {}s left",
                name,
                remaining
            );
            self.inner.events.publish(SchedulerEvent::Dispatched {
                id: pid,
                name: name.as_str().into(),
                remaining_time: remaining,
                at: start,
            });

            return Step::Run {
                seq,
                deadline,
                cancel: cancel_rx,
            };
        }
    }

    /// COMPLETED: close span `seq` if it is still the active one
    fn complete(&self, seq: u64) {
        let mut state = self.inner.state.lock();
        if state.running.as_ref().map(|s| s.seq) != Some(seq) {
            // Preempted in the same instant; add() already accounted for it
            return;
        }
        let Some(span) = state.running.take() else {
            return;
        };

        let Some(mut process) = state.ready.remove(span.pid) else {
            return;
        };
        let executed = process.consume(process.remaining_time());
        let end = span.started_at + executed;
        if let Some(entry) = state.entry_mut(span.pid) {
            entry.push(Segment::new(span.started_at, end));
        }
        state.busy_until = state.busy_until.max(end);
        drop(state);

        self.inner.stats.inc_completions();
        self.inner.stats.dec_active();

        let now = self.now();
        info!(
            pid = %span.pid.short(),
            name = process.name(),
            clock = %now,
            "Done executing {}",
            process.name()
        );
        self.inner.events.publish(SchedulerEvent::Completed {
            id: span.pid,
            name: process.name().into(),
            at: end,
        });
    }

    /// Leave the engine closed after its run loop was aborted mid-flight.
    ///
    /// The open segment is closed at the current clock value so the
    /// interrupted process keeps the time it already ran.
    fn abandon(&self) {
        let mut state = self.inner.state.lock();
        let now = self.now();
        if let Some(span) = state.running.take() {
            close_span(&mut state, &span, now);
        }
        state.idle = None;
        if state.phase == Phase::Closed {
            return;
        }
        state.phase = Phase::Closed;
        self.inner.clock.stop();
        drop(state);

        warn!(clock = %now, "Scheduler closed after its run loop was aborted");
        self.inner.events.publish(SchedulerEvent::Closed { at: now });
        self.inner.idle_notify.notify_waiters();
    }
}

/// Core run loop: SELECTING → RUNNING → (COMPLETED | PREEMPTED) → SELECTING
async fn run_loop(scheduler: Scheduler) {
    info!("Scheduler loop started");

    loop {
        match scheduler.next_step() {
            Step::Exit => break,

            Step::Idle(wake) => {
                // A dropped sender means the scheduler was closed while parked
                if wake.await.is_err() {
                    break;
                }
            }

            Step::Run {
                seq,
                deadline,
                cancel,
            } => {
                tokio::select! {
                    biased;

                    _ = cancel => {
                        debug!(seq, "Run span cancelled by arrival");
                    }

                    _ = tokio::time::sleep_until(deadline) => {
                        scheduler.complete(seq);
                    }
                }
            }
        }
    }

    info!("Scheduler loop exited");
}

/// Handle to the scheduler background task
///
/// **Shutdown Pattern: Graceful-with-Fallback**
/// - Preferred: `shutdown().await` drains running work, closes and joins
/// - Fallback: Drop aborts the task if shutdown wasn't called
pub struct SchedulerTask {
    scheduler: Scheduler,
    handle: Option<JoinHandle<()>>,
}

impl SchedulerTask {
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// True once the run loop has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait until the run loop parks with nothing to run
    pub async fn wait_idle(&self) {
        let notify = &self.scheduler.inner.idle_notify;
        loop {
            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.scheduler.is_idle() || self.scheduler.is_closed() {
                return;
            }
            notified.await;
        }
    }

    /// Shutdown the scheduler gracefully
    ///
    /// Waits for every queued process to finish, closes the scheduler and
    /// joins the run loop. Closing by hand beforehand is fine.
    pub async fn shutdown(mut self) -> SchedulerResult<()> {
        loop {
            self.wait_idle().await;
            match self.scheduler.close() {
                Ok(()) | Err(SchedulerError::Closed) => break,
                // An arrival slipped in between; drain it as well
                Err(SchedulerError::StillRunning(name)) => {
                    debug!(%name, "Shutdown deferred until idle");
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Scheduler task shutdown error: {}", e);
            } else {
                info!("Scheduler task shutdown complete");
            }
        }
        Ok(())
    }
}

impl Drop for SchedulerTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                warn!(
                    "SchedulerTask dropped without calling shutdown() - aborting task immediately. \
                     Use `task.shutdown().await` for graceful cleanup."
                );
                handle.abort();
                self.scheduler.abandon();
            }
        }
    }
}

impl std::fmt::Debug for SchedulerTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerTask")
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SimTime;
    use crate::process::Process;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_single_process_runs_to_completion() {
        let scheduler = Scheduler::default();
        let pid = scheduler
            .add(Process::new("P1", SimTime::from_units(4)))
            .unwrap();

        let task = scheduler.start().unwrap();
        task.wait_idle().await;

        let entry = scheduler.entry(pid).unwrap();
        assert_eq!(
            entry.execution_times,
            vec![Segment::new(SimTime::ZERO, SimTime::from_units(4))]
        );
        assert!(scheduler.is_empty());
        task.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_rejected() {
        let scheduler = Scheduler::default();
        let task = scheduler.start().unwrap();
        assert_eq!(scheduler.start().unwrap_err(), SchedulerError::AlreadyStarted);
        task.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_burst_is_discarded() {
        let scheduler = Scheduler::default();
        let pid = scheduler.add(Process::new("noop", SimTime::ZERO)).unwrap();
        let task = scheduler.start().unwrap();
        task.wait_idle().await;

        assert!(scheduler.is_empty());
        assert!(!scheduler.entry(pid).unwrap().has_run());
        assert_eq!(scheduler.counters().discarded, 1);
        assert_eq!(scheduler.counters().dispatches, 0);
        task.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_without_shutdown_aborts() {
        let scheduler = Scheduler::default();
        let pid = scheduler
            .add(Process::new("P1", SimTime::from_units(10)))
            .unwrap();
        let task = scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        drop(task);
        tokio::time::sleep(Duration::from_secs(20)).await;

        // The interrupted span is kept, the process itself never finished
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.counters().completions, 0);
        assert_eq!(
            scheduler.entry(pid).unwrap().execution_times,
            vec![Segment::new(SimTime::ZERO, SimTime::from_units(1))]
        );

        // Engine is closed rather than stuck in a phantom run
        assert!(scheduler.is_closed());
        assert!(scheduler.current().is_none());
        assert_eq!(scheduler.snapshot()[0].remaining_time, SimTime::from_units(9));
        assert!(!scheduler.snapshot()[0].running);
        assert_eq!(scheduler.close(), Err(SchedulerError::Closed));
        assert_eq!(scheduler.start().unwrap_err(), SchedulerError::Closed);
        assert_eq!(scheduler.now(), SimTime::from_units(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_while_idle_closes() {
        let scheduler = Scheduler::default();
        let task = scheduler.start().unwrap();
        task.wait_idle().await;

        drop(task);
        assert!(scheduler.is_closed());
        assert!(!scheduler.is_idle());
        assert_eq!(
            scheduler
                .add(Process::new("late", SimTime::from_units(1)))
                .unwrap_err(),
            SchedulerError::Closed
        );
    }
}
