/*!
 * Monitoring
 * Structured logging setup for the simulator
 */

mod tracer;

pub use tracer::{filter_for_verbosity, init_tracing};
