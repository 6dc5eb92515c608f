/*!
 * Process Module
 * Simulated process data model
 */

pub mod types;

// Re-export for convenience
pub use types::{Process, ProcessSnapshot};
