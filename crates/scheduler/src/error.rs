use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid cron schedule {schedule:?}: {reason}")]
    InvalidSchedule { schedule: String, reason: String },
}
