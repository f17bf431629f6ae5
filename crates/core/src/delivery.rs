use chrono::{DateTime, Utc};

use crate::alert_state::EventType;
use crate::ids::{SourceName, TargetName};

/// Outcome of one webhook delivery attempt (after exhausting retries).
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryResult {
    pub success: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub latency_ms: u64,
    pub attempts: u32,
}

impl DeliveryResult {
    #[must_use]
    pub fn ok(status_code: u16, latency_ms: u64, attempts: u32) -> Self {
        Self {
            success: true,
            status_code: Some(status_code),
            error: None,
            latency_ms,
            attempts,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>, latency_ms: u64, attempts: u32) -> Self {
        Self {
            success: false,
            status_code: None,
            error: Some(error.into()),
            latency_ms,
            attempts,
        }
    }

    /// A delivery that never touched the network: dry-run mode.
    #[must_use]
    pub fn dry_run() -> Self {
        Self {
            success: true,
            status_code: Some(200),
            error: None,
            latency_ms: 0,
            attempts: 0,
        }
    }
}

/// One row of the durable delivery log: a `DeliveryResult` plus the
/// context needed to attribute and audit it later (`driftwatch history`,
/// `driftwatch explain`).
#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    pub source_name: SourceName,
    pub target_name: TargetName,
    pub event_type: EventType,
    pub payload_hash: String,
    pub sent_at: DateTime<Utc>,
    pub result: DeliveryResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_never_touches_network() {
        let result = DeliveryResult::dry_run();
        assert!(result.success);
        assert_eq!(result.attempts, 0);
        assert_eq!(result.latency_ms, 0);
    }

    #[test]
    fn delivery_record_carries_attribution() {
        let record = DeliveryRecord {
            source_name: "orders_daily".into(),
            target_name: "slack".into(),
            event_type: EventType::Anomaly,
            payload_hash: "abcd1234abcd1234".into(),
            sent_at: Utc::now(),
            result: DeliveryResult::ok(200, 42, 1),
        };
        assert!(record.result.success);
        assert_eq!(record.target_name.as_str(), "slack");
    }
}
