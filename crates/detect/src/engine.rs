use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use driftwatch_core::{
    BaselineSummary, CollectStatus, Decision, DecisionStatus, Reason, ReasonCode, SourceConfig,
    Snapshot,
};

use crate::baseline::calculate_baseline;

/// Pure anomaly detector: compares one snapshot against a rolling window
/// of history and produces a `Decision`.
///
/// Holds no state of its own; `BaselineConfig`'s window/age bounds are
/// applied by the caller when selecting `history` before calling
/// [`DetectionEngine::analyze`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DetectionEngine;

impl DetectionEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Analyze `current` against `history` (already windowed by the
    /// caller) under `source_config`'s thresholds, at wall-clock `now`.
    #[must_use]
    pub fn analyze(
        &self,
        current: &Snapshot,
        history: &[Snapshot],
        source_config: &SourceConfig,
        now: DateTime<Utc>,
    ) -> Decision {
        if current.collect_status == CollectStatus::CollectFailed {
            let message = current
                .metadata
                .error_message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_owned());
            return Decision {
                status: DecisionStatus::Anomaly,
                reasons: vec![Reason::new(
                    ReasonCode::CollectFailed,
                    format!("Failed to collect data: {message}"),
                )],
                metrics: current.metrics.clone(),
                baseline_summary: None,
                confidence: 1.0,
            };
        }

        let baseline = calculate_baseline(history);

        let mut reasons = Vec::new();
        reasons.extend(check_freshness(current, history, source_config, &baseline, now));
        reasons.extend(check_volume(current, source_config, &baseline));
        reasons.extend(check_schema_drift(current, history, source_config));

        let status = determine_status(&reasons);
        let confidence = calculate_confidence(&baseline);

        Decision {
            status,
            reasons,
            metrics: current.metrics.clone(),
            baseline_summary: Some(baseline),
            confidence,
        }
    }
}

fn check_freshness(
    current: &Snapshot,
    history: &[Snapshot],
    config: &SourceConfig,
    baseline: &BaselineSummary,
    now: DateTime<Utc>,
) -> Vec<Reason> {
    let mut reasons = Vec::new();

    if let Some(max_age_hours) = config.freshness.max_age_hours {
        if let Some(latest_ts) = current.metrics.latest_timestamp {
            let age_hours = (now - latest_ts).num_milliseconds() as f64 / 1000.0 / 3600.0;
            if age_hours > max_age_hours {
                reasons.push(Reason::new(
                    ReasonCode::StaleData,
                    format!("Data is {age_hours:.1}h old, exceeds max age of {max_age_hours}h"),
                ));
            }
        }
    }

    if let Some(expected_interval) = baseline.expected_interval_seconds {
        if let Some(last_snapshot) = history.iter().max_by_key(|s| s.collected_at) {
            let gap = (current.collected_at - last_snapshot.collected_at).num_milliseconds() as f64
                / 1000.0;
            let expected = expected_interval * config.freshness.factor;
            if gap > expected {
                let gap_hours = gap / 3600.0;
                let expected_hours = expected / 3600.0;
                reasons.push(Reason::new(
                    ReasonCode::CollectionGap,
                    format!(
                        "Gap since last collection: {gap_hours:.1}h, expected max: {expected_hours:.1}h"
                    ),
                ));
            }
        }
    }

    if let Some(current_latest) = current.metrics.latest_timestamp {
        if !history.is_empty() {
            let last_data_ts = history.iter().filter_map(|s| s.metrics.latest_timestamp).max();
            if let Some(last_data_ts) = last_data_ts {
                if current_latest <= last_data_ts {
                    reasons.push(Reason::new(
                        ReasonCode::NoNewData,
                        format!("No new data since {}", last_data_ts.to_rfc3339()),
                    ));
                }
            }
        }
    }

    reasons
}

fn check_volume(current: &Snapshot, config: &SourceConfig, baseline: &BaselineSummary) -> Vec<Reason> {
    let mut reasons = Vec::new();

    let Some(row_count) = current.metrics.row_count else {
        return reasons;
    };

    if let Some(min_row_count) = config.volume.min_row_count {
        if row_count < min_row_count {
            reasons.push(Reason::new(
                ReasonCode::BelowMinVolume,
                format!("Row count {row_count} is below minimum threshold of {min_row_count}"),
            ));
        }
    }

    if let Some(median) = baseline.row_count_median {
        if baseline.snapshot_count >= 3 {
            match baseline.row_count_stddev {
                Some(stddev) if stddev > 0.0 => {
                    let z_score = (row_count as f64 - median).abs() / stddev;
                    if z_score > config.volume.deviation_factor {
                        if (row_count as f64) < median {
                            let pct_change = (median - row_count as f64) / median * 100.0;
                            reasons.push(Reason::new(
                                ReasonCode::VolumeLow,
                                format!(
                                    "Row count {row_count} is {pct_change:.1}% below baseline median ({median:.0})"
                                ),
                            ));
                        } else {
                            let pct_change = (row_count as f64 - median) / median * 100.0;
                            reasons.push(Reason::new(
                                ReasonCode::VolumeHigh,
                                format!(
                                    "Row count {row_count} is {pct_change:.1}% above baseline median ({median:.0})"
                                ),
                            ));
                        }
                    }
                }
                _ => {
                    if row_count == 0 && median > 0.0 {
                        reasons.push(Reason::new(
                            ReasonCode::ZeroVolume,
                            format!("Row count is 0, baseline median is {median:.0}"),
                        ));
                    }
                }
            }
        }
    }

    reasons
}

fn check_schema_drift(current: &Snapshot, history: &[Snapshot], config: &SourceConfig) -> Vec<Reason> {
    if !config.schema_drift {
        return Vec::new();
    }

    let Some(current_schema) = &current.metadata.schema else {
        return Vec::new();
    };

    let last_schema = history
        .iter()
        .rev()
        .find(|s| s.collect_status == CollectStatus::Success && s.metadata.schema.is_some())
        .and_then(|s| s.metadata.schema.as_ref());

    let Some(last_schema) = last_schema else {
        return Vec::new();
    };

    if current_schema == last_schema {
        return Vec::new();
    }

    let current_cols: BTreeMap<&str, &str> = current_schema
        .iter()
        .map(|c| (c.name.as_str(), c.type_name.as_str()))
        .collect();
    let last_cols: BTreeMap<&str, &str> = last_schema
        .iter()
        .map(|c| (c.name.as_str(), c.type_name.as_str()))
        .collect();

    let current_names: BTreeSet<&str> = current_cols.keys().copied().collect();
    let last_names: BTreeSet<&str> = last_cols.keys().copied().collect();

    let added: Vec<&str> = current_names.difference(&last_names).copied().collect();
    let removed: Vec<&str> = last_names.difference(&current_names).copied().collect();
    let changed: Vec<&str> = current_names
        .intersection(&last_names)
        .copied()
        .filter(|name| current_cols[name] != last_cols[name])
        .collect();

    let mut parts = Vec::new();
    if !added.is_empty() {
        parts.push(format!("added: {}", added.join(", ")));
    }
    if !removed.is_empty() {
        parts.push(format!("removed: {}", removed.join(", ")));
    }
    if !changed.is_empty() {
        let mut changed = changed;
        changed.sort_unstable();
        parts.push(format!("changed: {}", changed.join(", ")));
    }

    vec![Reason::new(
        ReasonCode::SchemaDrift,
        format!("Schema changed ({})", parts.join("; ")),
    )]
}

fn determine_status(reasons: &[Reason]) -> DecisionStatus {
    if reasons.is_empty() {
        return DecisionStatus::Ok;
    }

    if reasons.iter().any(|r| is_critical_code(&r.code)) {
        return DecisionStatus::Anomaly;
    }

    let warning_codes = [
        ReasonCode::VolumeLow.as_str(),
        ReasonCode::VolumeHigh.as_str(),
        ReasonCode::CollectionGap.as_str(),
        ReasonCode::NoNewData.as_str(),
    ];
    if reasons.iter().any(|r| warning_codes.contains(&r.code.as_str())) {
        return DecisionStatus::Warning;
    }

    DecisionStatus::Ok
}

fn is_critical_code(code: &str) -> bool {
    const CRITICAL: [&str; 5] = [
        "COLLECT_FAILED",
        "ZERO_VOLUME",
        "BELOW_MIN_VOLUME",
        "STALE_DATA",
        "SCHEMA_DRIFT",
    ];
    CRITICAL.contains(&code)
}

fn calculate_confidence(baseline: &BaselineSummary) -> f64 {
    match baseline.snapshot_count {
        0 => 0.0,
        n if n < 3 => 0.3,
        n if n < 10 => 0.6,
        n if n < 20 => 0.8,
        _ => 0.95,
    }
}
