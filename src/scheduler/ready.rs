/*!
 * Ready Set
 * Incomplete processes in arrival order, with shortest-remaining selection
 */

use crate::core::types::ProcessId;
use crate::process::Process;

/// Processes waiting for (or holding) the processor
///
/// Kept in insertion order: selection scans linearly and only a strictly
/// smaller remaining time displaces the running minimum, so among equals the
/// earliest arrival wins.
#[derive(Debug, Default, Clone)]
pub struct ReadySet {
    processes: Vec<Process>,
}

impl ReadySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, process: Process) {
        self.processes.push(process);
    }

    /// Process with the least remaining time, earliest arrival on ties
    pub fn select_next(&self) -> Option<&Process> {
        let mut min: Option<&Process> = None;
        for process in &self.processes {
            match min {
                Some(m) if process.remaining_time() >= m.remaining_time() => {}
                _ => min = Some(process),
            }
        }
        min
    }

    pub fn get(&self, id: ProcessId) -> Option<&Process> {
        self.processes.iter().find(|p| p.id() == id)
    }

    pub fn get_mut(&mut self, id: ProcessId) -> Option<&mut Process> {
        self.processes.iter_mut().find(|p| p.id() == id)
    }

    pub fn remove(&mut self, id: ProcessId) -> Option<Process> {
        let pos = self.processes.iter().position(|p| p.id() == id)?;
        Some(self.processes.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.iter()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SimTime;
    use proptest::prelude::*;

    fn set(bursts: &[u64]) -> ReadySet {
        let mut ready = ReadySet::new();
        for (i, &b) in bursts.iter().enumerate() {
            ready.push(Process::new(format!("P{}", i + 1).as_str(), SimTime::from_units(b)));
        }
        ready
    }

    #[test]
    fn test_empty_selects_none() {
        assert!(ReadySet::new().select_next().is_none());
    }

    #[test]
    fn test_selects_shortest() {
        let ready = set(&[4, 3, 5]);
        assert_eq!(ready.select_next().map(|p| p.name()), Some("P2"));
    }

    #[test]
    fn test_tie_goes_to_earliest() {
        let ready = set(&[3, 1, 1, 2]);
        assert_eq!(ready.select_next().map(|p| p.name()), Some("P2"));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut ready = set(&[2, 2, 2]);
        let first = ready.select_next().unwrap().id();
        assert!(ready.remove(first).is_some());
        assert_eq!(ready.select_next().map(|p| p.name()), Some("P2"));
        assert!(ready.remove(first).is_none());
        assert_eq!(ready.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_selection_is_first_minimum(bursts in prop::collection::vec(0u64..20, 1..32)) {
            let ready = set(&bursts);
            let min = *bursts.iter().min().unwrap();
            let first = bursts.iter().position(|&b| b == min).unwrap();
            let chosen = ready.select_next().unwrap();
            let expected = format!("P{}", first + 1);
            prop_assert_eq!(chosen.name(), expected.as_str());
        }
    }
}
