/*!
 * Scheduler Events
 * Lifecycle notifications streamed to observers
 */

use crate::core::types::{ProcessId, ProcessName, SimTime};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Buffered events per subscriber before it starts lagging
pub const EVENT_CAPACITY: usize = 256;

/// Something the scheduler did, stamped with the simulated time it happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SchedulerEvent {
    Added {
        id: ProcessId,
        name: ProcessName,
        burst_time: SimTime,
        at: SimTime,
    },
    Dispatched {
        id: ProcessId,
        name: ProcessName,
        remaining_time: SimTime,
        at: SimTime,
    },
    Preempted {
        id: ProcessId,
        name: ProcessName,
        by: ProcessId,
        remaining_time: SimTime,
        at: SimTime,
    },
    Completed {
        id: ProcessId,
        name: ProcessName,
        at: SimTime,
    },
    /// Selected with nothing left to run and dropped without executing
    Discarded {
        id: ProcessId,
        name: ProcessName,
        at: SimTime,
    },
    Idle {
        at: SimTime,
    },
    Woken {
        at: SimTime,
    },
    Closed {
        at: SimTime,
    },
}

impl SchedulerEvent {
    pub fn at(&self) -> SimTime {
        match self {
            Self::Added { at, .. }
            | Self::Dispatched { at, .. }
            | Self::Preempted { at, .. }
            | Self::Completed { at, .. }
            | Self::Discarded { at, .. }
            | Self::Idle { at }
            | Self::Woken { at }
            | Self::Closed { at } => *at,
        }
    }

    pub fn process_id(&self) -> Option<ProcessId> {
        match self {
            Self::Added { id, .. }
            | Self::Dispatched { id, .. }
            | Self::Preempted { id, .. }
            | Self::Completed { id, .. }
            | Self::Discarded { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Fan-out of scheduler events; publishing with no subscribers is a no-op
#[derive(Debug, Clone)]
pub(crate) struct EventBus {
    tx: broadcast::Sender<SchedulerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    #[inline]
    pub fn publish(&self, event: SchedulerEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.tx.subscribe()
    }

    pub fn stream(&self) -> BroadcastStream<SchedulerEvent> {
        BroadcastStream::new(self.tx.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(SchedulerEvent::Idle { at: SimTime::ZERO });
    }

    #[tokio::test]
    async fn test_subscriber_receives() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(SchedulerEvent::Woken {
            at: SimTime::from_units(1),
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.at(), SimTime::from_units(1));
        assert_eq!(event.process_id(), None);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&SchedulerEvent::Idle {
            at: SimTime::from_millis(1_500),
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"idle","at":1500}"#);
    }
}
