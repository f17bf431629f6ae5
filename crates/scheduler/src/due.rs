use chrono::{DateTime, Utc};
use croner::Cron;

use crate::error::SchedulerError;

/// Whether a source on `schedule` is due to be checked at `now`, given the
/// timestamp of its last collected snapshot.
///
/// With no prior snapshot the source is always due. Otherwise the next
/// occurrence of `schedule` is computed anchored at `last_collected_at`
/// (not at `now`), so a source that was checked late still follows its
/// original cadence rather than resetting the clock.
pub fn is_due(schedule: &str, last_collected_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<bool, SchedulerError> {
    let Some(last) = last_collected_at else {
        return Ok(true);
    };

    let cron = parse_schedule(schedule)?;
    let Ok(next) = cron.find_next_occurrence(&last, false) else {
        return Ok(true);
    };

    Ok(now >= next)
}

pub fn parse_schedule(schedule: &str) -> Result<Cron, SchedulerError> {
    Cron::new(schedule).parse().map_err(|e| SchedulerError::InvalidSchedule {
        schedule: schedule.to_owned(),
        reason: e.to_string(),
    })
}
