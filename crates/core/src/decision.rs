use sha2::{Digest, Sha256};

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineSummary;
use crate::reason::Reason;
use crate::snapshot::Metrics;

/// The classification a `Decision` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionStatus {
    Ok,
    Warning,
    Anomaly,
    Unknown,
}

impl DecisionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Anomaly => "ANOMALY",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The output of one run of the detection engine against one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub status: DecisionStatus,
    pub reasons: Vec<Reason>,
    pub metrics: Metrics,
    pub baseline_summary: Option<BaselineSummary>,
    pub confidence: f64,
}

impl Decision {
    /// Stable hash of `{status, sorted reason codes}`, used to decide
    /// whether a new observation is the *same* alert as the last one sent
    /// (and therefore subject to cooldown) or a distinct one that should
    /// bypass it. Message text is deliberately excluded so cosmetic
    /// wording changes don't churn alert state.
    ///
    /// First 16 hex characters of the SHA-256 digest of the canonical
    /// (key-sorted, whitespace-free) JSON encoding of that pair.
    #[must_use]
    pub fn reason_hash(&self) -> String {
        let mut codes: Vec<&str> = self.reasons.iter().map(|r| r.code.as_str()).collect();
        codes.sort_unstable();
        let payload = serde_json::json!({
            "status": self.status.as_str(),
            "reason_codes": codes,
        });
        let canonical = serde_json::to_string(&payload).expect("json::Value always serializes");
        let digest = Sha256::digest(canonical.as_bytes());
        hex::encode(digest)[..16].to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reason::ReasonCode;

    #[test]
    fn reason_hash_is_order_independent() {
        let a = Decision {
            status: DecisionStatus::Anomaly,
            reasons: vec![
                Reason::new(ReasonCode::StaleData, "m1"),
                Reason::new(ReasonCode::SchemaDrift, "m2"),
            ],
            metrics: Metrics::default(),
            baseline_summary: None,
            confidence: 0.8,
        };
        let b = Decision {
            reasons: vec![
                Reason::new(ReasonCode::SchemaDrift, "different message"),
                Reason::new(ReasonCode::StaleData, "also different"),
            ],
            ..a.clone()
        };
        assert_eq!(a.reason_hash(), b.reason_hash());
    }

    #[test]
    fn reason_hash_changes_with_status() {
        let base = Decision {
            status: DecisionStatus::Warning,
            reasons: vec![Reason::new(ReasonCode::VolumeLow, "m")],
            metrics: Metrics::default(),
            baseline_summary: None,
            confidence: 0.6,
        };
        let escalated = Decision {
            status: DecisionStatus::Anomaly,
            ..base.clone()
        };
        assert_ne!(base.reason_hash(), escalated.reason_hash());
    }

    #[test]
    fn reason_hash_is_sixteen_hex_chars() {
        let decision = Decision {
            status: DecisionStatus::Ok,
            reasons: vec![],
            metrics: Metrics::default(),
            baseline_summary: None,
            confidence: 0.95,
        };
        let hash = decision.reason_hash();
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn decision_status_wire_values() {
        assert_eq!(
            serde_json::to_value(DecisionStatus::Anomaly).unwrap(),
            "ANOMALY"
        );
        assert_eq!(
            serde_json::to_value(DecisionStatus::Unknown).unwrap(),
            "UNKNOWN"
        );
    }
}
