/*!
 * Core Module
 * Fundamental simulator types and error handling
 */

pub mod errors;
pub mod id;
pub mod time;
pub mod types;

// Re-export for convenience
pub use errors::*;
pub use types::*;
