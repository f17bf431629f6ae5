use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::alert_state::EventType;
use crate::decision::Decision;
use crate::ids::SourceName;

/// The body of a webhook notification, before signing.
///
/// `canonical_value`/`to_canonical_string` are the single source of truth
/// for the webhook notification wire shape; both the HMAC signature and
/// the `payload_hash` recorded in the delivery log are computed over this
/// output.
#[derive(Debug, Clone)]
pub struct WebhookPayload {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub source_name: SourceName,
    pub source_type: String,
    pub decision: Decision,
    pub agent_id: String,
}

impl WebhookPayload {
    #[must_use]
    pub fn new(
        event_type: EventType,
        timestamp: DateTime<Utc>,
        source_name: SourceName,
        source_type: impl Into<String>,
        decision: Decision,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            timestamp,
            source_name,
            source_type: source_type.into(),
            decision,
            agent_id: agent_id.into(),
        }
    }

    /// Build the wire-format JSON value. Keys sort automatically because
    /// `serde_json`'s default `Map` is `BTreeMap`-backed.
    #[must_use]
    pub fn canonical_value(&self) -> serde_json::Value {
        let baseline = self
            .decision
            .baseline_summary
            .as_ref()
            .map_or_else(|| serde_json::json!({}), crate::baseline::BaselineSummary::to_wire);

        serde_json::json!({
            "version": "1",
            "event_id": self.event_id.to_string(),
            "event_type": self.event_type.as_str(),
            "timestamp": self.timestamp.to_rfc3339(),
            "source": {
                "name": self.source_name.as_str(),
                "type": self.source_type,
            },
            "decision": {
                "status": self.decision.status.as_str(),
                "reasons": self.decision.reasons,
                "confidence": self.decision.confidence,
            },
            "metrics": self.decision.metrics,
            "baseline": baseline,
            "context": {
                "agent_id": self.agent_id,
            },
        })
    }

    /// Compact, key-sorted JSON encoding of the payload body: the exact
    /// byte sequence that gets HMAC-signed and hashed for the delivery log.
    #[must_use]
    pub fn to_canonical_string(&self) -> String {
        serde_json::to_string(&self.canonical_value()).expect("json::Value always serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DecisionStatus;
    use crate::reason::{Reason, ReasonCode};
    use crate::snapshot::Metrics;

    fn sample_decision() -> Decision {
        Decision {
            status: DecisionStatus::Anomaly,
            reasons: vec![Reason::new(ReasonCode::StaleData, "no data in 6h")],
            metrics: Metrics {
                row_count: Some(10),
                ..Default::default()
            },
            baseline_summary: None,
            confidence: 0.8,
        }
    }

    #[test]
    fn wire_shape_has_expected_top_level_keys() {
        let payload = WebhookPayload::new(
            EventType::Anomaly,
            Utc::now(),
            "orders_daily".into(),
            "sql",
            sample_decision(),
            "driftwatch-agent",
        );
        let value = payload.canonical_value();
        for key in [
            "version",
            "event_id",
            "event_type",
            "timestamp",
            "source",
            "decision",
            "metrics",
            "baseline",
            "context",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(value["source"]["name"], "orders_daily");
        assert_eq!(value["context"]["agent_id"], "driftwatch-agent");
    }

    #[test]
    fn canonical_string_is_compact_and_key_sorted() {
        let payload = WebhookPayload::new(
            EventType::Recovery,
            Utc::now(),
            "orders_daily".into(),
            "sql",
            Decision {
                status: DecisionStatus::Ok,
                reasons: vec![],
                metrics: Metrics::default(),
                baseline_summary: None,
                confidence: 0.95,
            },
            "driftwatch-agent",
        );
        let body = payload.to_canonical_string();
        assert!(!body.contains(' '));
        // "agent_id" (inside context) sorts before "baseline" only if keys
        // are actually ordered; spot-check two keys whose natural
        // insertion order would otherwise differ from alphabetical.
        let baseline_pos = body.find("\"baseline\"").unwrap();
        let version_pos = body.find("\"version\"").unwrap();
        assert!(baseline_pos < version_pos);
    }

    #[test]
    fn missing_baseline_serializes_as_empty_object() {
        let payload = WebhookPayload::new(
            EventType::Info,
            Utc::now(),
            "orders_daily".into(),
            "sql",
            sample_decision(),
            "driftwatch-agent",
        );
        assert_eq!(payload.canonical_value()["baseline"], serde_json::json!({}));
    }
}
