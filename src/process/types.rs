/*!
 * Process Types
 * Simulated processes and their read-only views
 */

use crate::core::types::{ProcessId, ProcessName, SimTime};
use serde::{Deserialize, Serialize};

/// A simulated process competing for the virtual processor
///
/// `remaining_time` starts at `burst_time` and only shrinks when a run
/// segment closes, so while a process is running it is stale by the length
/// of the current segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    id: ProcessId,
    name: ProcessName,
    burst_time: SimTime,
    remaining_time: SimTime,
}

impl Process {
    /// Create a process with a freshly generated identity
    pub fn new(name: impl Into<ProcessName>, burst_time: SimTime) -> Self {
        Self::with_id(ProcessId::generate(), name, burst_time)
    }

    /// Create a process with an identity supplied by the caller
    pub fn with_id(id: ProcessId, name: impl Into<ProcessName>, burst_time: SimTime) -> Self {
        Self {
            id,
            name: name.into(),
            burst_time,
            remaining_time: burst_time,
        }
    }

    #[inline]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn burst_time(&self) -> SimTime {
        self.burst_time
    }

    #[inline]
    pub fn remaining_time(&self) -> SimTime {
        self.remaining_time
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.remaining_time.is_zero()
    }

    /// Charge executed time against the remaining work, returning what was
    /// actually charged (never more than what was left)
    pub(crate) fn consume(&mut self, executed: SimTime) -> SimTime {
        let charged = executed.min(self.remaining_time);
        self.remaining_time = self.remaining_time - charged;
        charged
    }

    pub(crate) fn snapshot(&self, running: bool, live_remaining: SimTime) -> ProcessSnapshot {
        ProcessSnapshot {
            id: self.id,
            name: self.name.clone(),
            burst_time: self.burst_time,
            remaining_time: live_remaining,
            running,
        }
    }
}

/// Point-in-time view of a ready process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub id: ProcessId,
    pub name: ProcessName,
    pub burst_time: SimTime,
    /// Live value: for the running process the current segment is already deducted
    pub remaining_time: SimTime,
    pub running: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_process_has_full_remaining() {
        let p = Process::new("P1", SimTime::from_units(4));
        assert_eq!(p.name(), "P1");
        assert_eq!(p.burst_time(), SimTime::from_units(4));
        assert_eq!(p.remaining_time(), p.burst_time());
        assert!(!p.is_complete());
    }

    #[test]
    fn test_consume_never_underflows() {
        let mut p = Process::new("P1", SimTime::from_units(3));

        assert_eq!(p.consume(SimTime::from_units(1)), SimTime::from_units(1));
        assert_eq!(p.remaining_time(), SimTime::from_units(2));

        assert_eq!(p.consume(SimTime::from_units(5)), SimTime::from_units(2));
        assert_eq!(p.remaining_time(), SimTime::ZERO);
        assert!(p.is_complete());
    }

    #[test]
    fn test_zero_burst_is_complete() {
        let p = Process::new("noop", SimTime::ZERO);
        assert!(p.is_complete());
    }
}
