//! Scheduling infrastructure for background task execution
//!
//! One cron-based scheduler lives here: the expiry sweep that retires stale
//! invitations and prunes abandoned groups.
//!
//! Runtime rules every scheduler follows:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout wrapping on all async operations

pub mod error;
pub mod sweep;

pub use error::{SchedulerError, SchedulerResult};
pub use sweep::{SweepScheduler, SweepSchedulerConfig};
