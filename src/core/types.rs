/*!
 * Core Types
 * Common types used across the simulator
 */

/// Display label for a process (inline for short names)
pub type ProcessName = smartstring::alias::String;

pub use super::id::ProcessId;
pub use super::time::SimTime;
