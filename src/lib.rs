/*!
 * SRTF Scheduler Simulator
 * Preemptive Shortest-Remaining-Time-First scheduling on a virtual processor
 */

pub mod console;
pub mod core;
pub mod monitoring;
pub mod process;
pub mod scheduler;

// Re-exports
pub use crate::core::errors::{SchedulerError, SchedulerResult};
pub use crate::core::types::{ProcessId, ProcessName, SimTime};
pub use monitoring::init_tracing;
pub use process::{Process, ProcessSnapshot};
pub use scheduler::{
    ExecutionEntry, ExecutionReport, ProcessReport, ProcessStatus, Scheduler, SchedulerConfig,
    SchedulerCounters, SchedulerEvent, SchedulerTask, Segment,
};
