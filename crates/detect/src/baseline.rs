use driftwatch_core::{BaselineSummary, Snapshot};

/// Compute rolling statistics from a window of historical snapshots.
///
/// `history` need not be sorted; this function sorts a local copy of the
/// timestamps it needs. Returns an all-`None` summary with
/// `snapshot_count: 0` when `history` is empty.
#[must_use]
pub fn calculate_baseline(history: &[Snapshot]) -> BaselineSummary {
    if history.is_empty() {
        return BaselineSummary::default();
    }

    let row_counts: Vec<f64> = history
        .iter()
        .filter_map(|s| s.metrics.row_count)
        .map(|v| v as f64)
        .collect();

    let row_count_median = median(&row_counts);
    let row_count_min = row_counts
        .iter()
        .copied()
        .min_by(|a, b| a.partial_cmp(b).expect("row counts are finite"));
    let row_count_max = row_counts
        .iter()
        .copied()
        .max_by(|a, b| a.partial_cmp(b).expect("row counts are finite"));
    let row_count_stddev = if row_counts.len() > 1 {
        Some(stdev(&row_counts))
    } else if row_counts.len() == 1 {
        Some(0.0)
    } else {
        None
    };

    let mut by_time: Vec<_> = history.iter().collect();
    by_time.sort_by_key(|s| s.collected_at);
    let intervals: Vec<f64> = by_time
        .windows(2)
        .map(|pair| (pair[1].collected_at - pair[0].collected_at).num_milliseconds() as f64 / 1000.0)
        .collect();
    let expected_interval_seconds = median(&intervals);

    let oldest_snapshot_at = by_time.first().map(|s| s.collected_at);
    let newest_snapshot_at = by_time.last().map(|s| s.collected_at);

    BaselineSummary {
        snapshot_count: history.len(),
        row_count_median,
        row_count_min,
        row_count_max,
        row_count_stddev,
        expected_interval_seconds,
        oldest_snapshot_at,
        newest_snapshot_at,
    }
}

/// `None` for an empty slice, matching `statistics.median([])` raising in
/// the original but used here only where the caller has already checked
/// for emptiness via the `Option` return.
fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("row counts and intervals are finite"));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (Bessel's correction), matching
/// `statistics.stdev`. Callers only invoke this with at least two values.
fn stdev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use driftwatch_core::{Metrics, SnapshotMetadata};

    fn snapshot_at(offset_secs: i64, row_count: i64) -> Snapshot {
        Snapshot::success(
            "orders_daily",
            Utc::now() + Duration::seconds(offset_secs),
            Metrics {
                row_count: Some(row_count),
                ..Default::default()
            },
            SnapshotMetadata {
                connector_type: "sql".into(),
                dialect: "postgres".into(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn empty_history_yields_default_summary() {
        let baseline = calculate_baseline(&[]);
        assert_eq!(baseline.snapshot_count, 0);
        assert!(baseline.row_count_median.is_none());
    }

    #[test]
    fn single_snapshot_has_zero_stddev() {
        let history = vec![snapshot_at(0, 100)];
        let baseline = calculate_baseline(&history);
        assert_eq!(baseline.snapshot_count, 1);
        assert_eq!(baseline.row_count_median, Some(100.0));
        assert_eq!(baseline.row_count_stddev, Some(0.0));
        assert!(baseline.expected_interval_seconds.is_none());
    }

    #[test]
    fn expected_interval_is_median_of_gaps() {
        let history = vec![snapshot_at(0, 100), snapshot_at(900, 100), snapshot_at(1800, 100)];
        let baseline = calculate_baseline(&history);
        assert_eq!(baseline.expected_interval_seconds, Some(900.0));
    }

    #[test]
    fn median_min_max_over_several_snapshots() {
        let history = vec![snapshot_at(0, 80), snapshot_at(900, 100), snapshot_at(1800, 120)];
        let baseline = calculate_baseline(&history);
        assert_eq!(baseline.row_count_median, Some(100.0));
        assert_eq!(baseline.row_count_min, Some(80.0));
        assert_eq!(baseline.row_count_max, Some(120.0));
    }
}
