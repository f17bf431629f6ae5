pub mod daemon;
pub mod due;
pub mod error;

pub use daemon::{TICK_INTERVAL, run_until_shutdown, shutdown_signal};
pub use due::{is_due, parse_schedule};
pub use error::SchedulerError;
