/*!
 * Execution Entries
 * Per-process arrival time and run-segment history
 */

use crate::core::types::{ProcessId, ProcessName, SimTime};
use crate::process::Process;
use serde::{Deserialize, Serialize};

/// One contiguous interval during which a process held the processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: SimTime,
    pub end: SimTime,
}

impl Segment {
    pub fn new(start: SimTime, end: SimTime) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> SimTime {
        self.end - self.start
    }
}

/// Execution history of a single process
///
/// Segments are appended in time order and never rewritten. The entry keeps
/// its own copy of the process's identity so it outlives the ready set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionEntry {
    pub process_id: ProcessId,
    pub name: ProcessName,
    pub burst_time: SimTime,
    pub entry_time: SimTime,
    pub execution_times: Vec<Segment>,
}

impl ExecutionEntry {
    pub(crate) fn new(process: &Process, entry_time: SimTime) -> Self {
        Self {
            process_id: process.id(),
            name: process.name().into(),
            burst_time: process.burst_time(),
            entry_time,
            execution_times: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        let floor = self
            .execution_times
            .last()
            .map(|s| s.end)
            .unwrap_or(self.entry_time);
        debug_assert!(segment.start >= floor, "segment starts before previous end");
        debug_assert!(segment.end >= segment.start, "segment ends before it starts");
        self.execution_times.push(segment);
    }

    /// Total time actually executed
    pub fn executed(&self) -> SimTime {
        self.execution_times.iter().map(Segment::len).sum()
    }

    pub fn has_run(&self) -> bool {
        !self.execution_times.is_empty()
    }

    /// Time spent ready but not running, up to the end of the last segment
    ///
    /// The first gap is measured from arrival, each later gap from the end of
    /// the previous segment. `None` if the process never ran.
    pub fn wait_time(&self) -> Option<SimTime> {
        if self.execution_times.is_empty() {
            return None;
        }
        let (wait, _) = self
            .execution_times
            .iter()
            .fold((SimTime::ZERO, self.entry_time), |(total, prev_end), seg| {
                (total + (seg.start - prev_end), seg.end)
            });
        Some(wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(entry_time: u64, burst: u64, segments: &[(u64, u64)]) -> ExecutionEntry {
        let p = Process::new("P", SimTime::from_units(burst));
        let mut e = ExecutionEntry::new(&p, SimTime::from_units(entry_time));
        for &(s, end) in segments {
            e.push(Segment::new(SimTime::from_units(s), SimTime::from_units(end)));
        }
        e
    }

    #[test]
    fn test_wait_time_accumulates_gaps() {
        // arrival 0, runs 4-5 and 7-9: waits 4 then 2
        let e = entry(0, 3, &[(4, 5), (7, 9)]);
        assert_eq!(e.wait_time(), Some(SimTime::from_units(6)));
        assert_eq!(e.executed(), SimTime::from_units(3));
    }

    #[test]
    fn test_wait_time_without_gaps() {
        let e = entry(2, 4, &[(2, 6)]);
        assert_eq!(e.wait_time(), Some(SimTime::ZERO));
    }

    #[test]
    fn test_never_run() {
        let e = entry(1, 4, &[]);
        assert!(!e.has_run());
        assert_eq!(e.wait_time(), None);
        assert_eq!(e.executed(), SimTime::ZERO);
    }
}
