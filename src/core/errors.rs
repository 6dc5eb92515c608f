/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::ProcessName;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheduler operation result
///
/// # Must Use
/// Scheduler operations can be refused and the caller decides whether to retry
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-related errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Scheduler is closed")]
    #[diagnostic(
        code(scheduler::closed),
        help("The scheduler was shut down. Create a new scheduler to run more processes.")
    )]
    Closed,

    #[error("Process {0} is still executing")]
    #[diagnostic(
        code(scheduler::still_running),
        help("The scheduler can only be closed while idle. Wait for running work to finish.")
    )]
    StillRunning(ProcessName),

    #[error("No process has been executed yet")]
    #[diagnostic(
        code(scheduler::empty_report),
        help("Statistics need at least one recorded run segment. Add a process and start the scheduler.")
    )]
    EmptyReport,

    #[error("Scheduler run loop already started")]
    #[diagnostic(
        code(scheduler::already_started),
        help("A scheduler has a single run loop. Reuse the task handle returned by the first start().")
    )]
    AlreadyStarted,

    #[error("Invalid scheduler configuration: {0}")]
    #[diagnostic(
        code(scheduler::invalid_config),
        help("Clock unit and resolution must be non-zero, and the resolution at most one unit.")
    )]
    InvalidConfig(String),
}
