use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rolling statistics computed from the recent snapshot window for one
/// source. Produced by `driftwatch-detect`'s baseline computer; carried
/// through `Decision` into the webhook payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineSummary {
    pub snapshot_count: usize,
    pub row_count_median: Option<f64>,
    pub row_count_min: Option<f64>,
    pub row_count_max: Option<f64>,
    pub row_count_stddev: Option<f64>,
    pub expected_interval_seconds: Option<f64>,

    /// Not part of the wire form; kept for `history`/`explain` CLI output.
    pub oldest_snapshot_at: Option<DateTime<Utc>>,
    pub newest_snapshot_at: Option<DateTime<Utc>>,
}

impl BaselineSummary {
    /// The six numeric fields that appear on the wire, flattened into a
    /// plain object (or `{}` when the window is empty). Matches the
    /// upstream `BaselineSummary.to_dict()` shape exactly.
    #[must_use]
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "snapshot_count": self.snapshot_count,
            "row_count_median": self.row_count_median,
            "row_count_min": self.row_count_min,
            "row_count_max": self.row_count_max,
            "row_count_stddev": self.row_count_stddev,
            "expected_interval_seconds": self.expected_interval_seconds,
        })
    }
}
