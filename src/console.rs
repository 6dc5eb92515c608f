/*!
 * Operator Console
 * Text commands for driving a scheduler interactively, and their rendering
 */

use crate::core::types::{ProcessName, SimTime};
use crate::process::ProcessSnapshot;
use crate::scheduler::{ExecutionReport, ProcessStatus};
use std::fmt::{self, Write as _};
use thiserror::Error;

/// A parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Add { name: ProcessName, burst: SimTime },
    Stat,
    Processes,
    Clear,
    Close,
    Help,
}

/// Console input errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Empty command")]
    Empty,

    #[error("Invalid command: {0}")]
    Unknown(String),

    #[error("Usage: add <name> <burst>")]
    AddUsage,

    #[error("Invalid burst time: {0}")]
    InvalidBurst(String),
}

impl Command {
    /// Parse one line of operator input
    pub fn parse(line: &str) -> Result<Self, ConsoleError> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Err(ConsoleError::Empty);
        };

        match head.to_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stat" | "stats" => Ok(Self::Stat),
            "processes" | "ps" => Ok(Self::Processes),
            "clear" => Ok(Self::Clear),
            "close" | "exit" | "quit" => Ok(Self::Close),
            "help" | "?" => Ok(Self::Help),
            "add" => {
                let (Some(name), Some(burst), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(ConsoleError::AddUsage);
                };
                let burst = burst
                    .parse::<f64>()
                    .ok()
                    .and_then(SimTime::from_units_f64)
                    .ok_or_else(|| ConsoleError::InvalidBurst(burst.to_string()))?;
                Ok(Self::Add {
                    name: name.into(),
                    burst,
                })
            }
            other => Err(ConsoleError::Unknown(other.to_string())),
        }
    }
}

pub const HELP: &str = "\
Commands:
  start               start the scheduler
  add <name> <burst>  add a process with the given burst time
  processes           list processes that still have work left
  stat                print wait and service times
  clear               clear the screen
  close               shut down once idle
  help                show this message

Scheduling decisions are logged at info; set SRTF_VERBOSE=0 to hide them.";

/// Text rendering of an execution report
pub struct ReportView<'a>(pub &'a ExecutionReport);

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f)?;
        writeln!(f, "===================== Processes Stat =======================")?;
        for p in &report.processes {
            writeln!(f, "-> Process {}", p.name)?;
            writeln!(f, "Burst Time: {}", p.burst_time)?;
            writeln!(f, "Start Time: {}", p.entry_time)?;

            let mut segments = String::new();
            for (i, seg) in p.segments.iter().enumerate() {
                if i > 0 {
                    segments.push_str(", ");
                }
                let _ = write!(segments, "{}-{}", seg.start, seg.end);
            }
            writeln!(f, "Execution Times: {}", segments)?;

            match p.status {
                ProcessStatus::Waiting => {
                    writeln!(f, "Wait Time: {}s (not yet started)", p.wait_time)?;
                    writeln!(f, "Service Time: -")?;
                }
                ProcessStatus::InProgress => {
                    writeln!(f, "Wait Time: {}s (in progress)", p.wait_time)?;
                    if let Some(service) = p.service_time {
                        writeln!(f, "Service Time: {}s", service)?;
                    }
                }
                ProcessStatus::Completed => {
                    writeln!(f, "Wait Time: {}s", p.wait_time)?;
                    if let Some(service) = p.service_time {
                        writeln!(f, "Service Time: {}s", service)?;
                    }
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "===")?;
        writeln!(f, "Average Waiting Time: {}s", report.average_wait_time)?;
        writeln!(f, "Average Service Time: {}s", report.average_service_time)?;
        write!(f, "===")
    }
}

/// Text rendering of the ready set
pub struct SnapshotView<'a>(pub &'a [ProcessSnapshot]);

impl fmt::Display for SnapshotView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "No processes waiting");
        }
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "Process {} remains {}s", p.name, p.remaining_time)?;
            if p.running {
                write!(f, " (running)")?;
            }
        }
        Ok(())
    }
}
