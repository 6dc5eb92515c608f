/*!
 * Scheduler Statistics
 * Wait and service times derived from recorded run segments
 */

use super::entry::{ExecutionEntry, Segment};
use super::Scheduler;
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::{ProcessId, ProcessName, SimTime};
use serde::{Deserialize, Serialize};

/// Where a process stands at report time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// Ran to completion
    Completed,
    /// Has run at least once but still has work left
    InProgress,
    /// Added but never ran; wait time is provisional and excluded from averages
    Waiting,
}

/// Statistics for one process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessReport {
    pub id: ProcessId,
    pub name: ProcessName,
    pub burst_time: SimTime,
    pub entry_time: SimTime,
    pub segments: Vec<Segment>,
    pub wait_time: SimTime,
    /// Wait time plus burst; undefined for a process that never started
    pub service_time: Option<SimTime>,
    pub status: ProcessStatus,
}

/// Statistics for every process the scheduler has seen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Clock value when the report was taken
    pub generated_at: SimTime,
    pub processes: Vec<ProcessReport>,
    /// Mean over processes with at least one segment, in time units
    pub average_wait_time: f64,
    pub average_service_time: f64,
}

impl ExecutionReport {
    /// Build a report from execution entries; fails if nothing has run yet
    ///
    /// `running` names the process on the processor and when its open
    /// segment started. That segment counts as its latest run, so the
    /// process is reported in progress rather than waiting.
    pub fn from_entries<'a, I>(
        entries: I,
        running: Option<(ProcessId, SimTime)>,
        now: SimTime,
    ) -> SchedulerResult<Self>
    where
        I: IntoIterator<Item = &'a ExecutionEntry>,
    {
        let processes: Vec<ProcessReport> = entries
            .into_iter()
            .map(|entry| {
                let open = running
                    .filter(|(pid, _)| *pid == entry.process_id)
                    .map(|(_, started_at)| started_at);
                process_report(entry, open, now)
            })
            .collect();

        let served: Vec<&ProcessReport> = processes
            .iter()
            .filter(|p| p.status != ProcessStatus::Waiting)
            .collect();
        if served.is_empty() {
            return Err(SchedulerError::EmptyReport);
        }

        let count = served.len() as f64;
        let average_wait_time = served
            .iter()
            .map(|p| p.wait_time.as_units_f64())
            .sum::<f64>()
            / count;
        let average_service_time = served
            .iter()
            .filter_map(|p| p.service_time)
            .map(SimTime::as_units_f64)
            .sum::<f64>()
            / count;

        Ok(Self {
            generated_at: now,
            processes,
            average_wait_time,
            average_service_time,
        })
    }

    /// Processes that have not run yet
    pub fn waiting(&self) -> impl Iterator<Item = &ProcessReport> {
        self.processes
            .iter()
            .filter(|p| p.status == ProcessStatus::Waiting)
    }

    pub fn get(&self, name: &str) -> Option<&ProcessReport> {
        self.processes.iter().find(|p| p.name.as_str() == name)
    }
}

fn process_report(entry: &ExecutionEntry, open: Option<SimTime>, now: SimTime) -> ProcessReport {
    let wait = match open {
        Some(started_at) => {
            let prev_end = entry
                .execution_times
                .last()
                .map_or(entry.entry_time, |seg| seg.end);
            Some(entry.wait_time().unwrap_or(SimTime::ZERO) + (started_at - prev_end))
        }
        None => entry.wait_time(),
    };

    let (wait_time, service_time, status) = match wait {
        Some(wait) => {
            let status = if open.is_none() && entry.executed() >= entry.burst_time {
                ProcessStatus::Completed
            } else {
                ProcessStatus::InProgress
            };
            (wait, Some(wait + entry.burst_time), status)
        }
        None => (now - entry.entry_time, None, ProcessStatus::Waiting),
    };

    ProcessReport {
        id: entry.process_id,
        name: entry.name.clone(),
        burst_time: entry.burst_time,
        entry_time: entry.entry_time,
        segments: entry.execution_times.clone(),
        wait_time,
        service_time,
        status,
    }
}

impl Scheduler {
    /// Per-process wait and service times with averages
    ///
    /// Taken under the scheduler lock, so it reflects a single consistent
    /// instant. Returns `EmptyReport` until some process has been dispatched.
    pub fn report(&self) -> SchedulerResult<ExecutionReport> {
        let state = self.inner.state.lock();
        let running = state.running.as_ref().map(|s| (s.pid, s.started_at));
        ExecutionReport::from_entries(&state.entries, running, self.now())
    }
}
