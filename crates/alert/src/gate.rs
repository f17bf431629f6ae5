use chrono::{DateTime, Utc};
use driftwatch_core::{AlertState, Decision, DecisionStatus};

/// Decide whether `decision` warrants sending a new notification given the
/// last-known `state` for this (source, target) pair.
///
/// An alert is suppressed when the target is still inside its cooldown
/// window, or when the decision is identical (same status and reason set)
/// to the last one notified. A state that has never been notified
/// (`notified_status == Unknown`) always alerts, since there is nothing to
/// compare against.
#[must_use]
pub fn should_alert(decision: &Decision, state: &AlertState, now: DateTime<Utc>) -> bool {
    if let Some(cooldown_until) = state.cooldown_until {
        if now < cooldown_until {
            return false;
        }
    }

    if state.notified_status == DecisionStatus::Unknown {
        return true;
    }

    decision.status != state.notified_status || decision.reason_hash() != state.notified_reason_hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftwatch_core::{Metrics, Reason, ReasonCode};

    fn decision(status: DecisionStatus) -> Decision {
        Decision {
            status,
            reasons: vec![Reason::new(ReasonCode::StaleData, "stale")],
            metrics: Metrics::default(),
            baseline_summary: None,
            confidence: 0.9,
        }
    }

    fn state_after(decision: &Decision, now: DateTime<Utc>, cooldown_until: Option<DateTime<Utc>>) -> AlertState {
        AlertState {
            source_name: "orders_daily".into(),
            target_name: "slack".into(),
            notified_status: decision.status,
            notified_reason_hash: decision.reason_hash(),
            last_change_at: now,
            last_sent_at: Some(now),
            cooldown_until,
        }
    }

    #[test]
    fn never_notified_always_alerts() {
        let now = Utc::now();
        let state = AlertState::unknown("orders_daily", "slack", now);
        assert!(should_alert(&decision(DecisionStatus::Anomaly), &state, now));
    }

    #[test]
    fn identical_decision_inside_cooldown_is_suppressed() {
        let now = Utc::now();
        let d = decision(DecisionStatus::Anomaly);
        let state = state_after(&d, now, Some(now + chrono::Duration::minutes(30)));
        assert!(!should_alert(&d, &state, now + chrono::Duration::minutes(5)));
    }

    #[test]
    fn identical_decision_after_cooldown_still_suppressed_until_change() {
        let now = Utc::now();
        let d = decision(DecisionStatus::Anomaly);
        let state = state_after(&d, now, Some(now + chrono::Duration::minutes(30)));
        assert!(!should_alert(&d, &state, now + chrono::Duration::hours(1)));
    }

    #[test]
    fn status_change_after_cooldown_alerts() {
        let now = Utc::now();
        let prior = decision(DecisionStatus::Anomaly);
        let state = state_after(&prior, now, Some(now + chrono::Duration::minutes(30)));
        let recovered = decision(DecisionStatus::Ok);
        assert!(should_alert(&recovered, &state, now + chrono::Duration::hours(1)));
    }
}
