use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::DecisionStatus;
use crate::ids::{SourceName, TargetName};

/// The kind of webhook event a decision maps to. Used to filter which
/// webhooks receive a given notification via `WebhookConfig::events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Anomaly,
    Warning,
    Recovery,
    Info,
}

impl EventType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anomaly => "anomaly",
            Self::Warning => "warning",
            Self::Recovery => "recovery",
            Self::Info => "info",
        }
    }

    /// Map a decision's status to the event type an alerting pipeline
    /// dispatches. `OK` is a recovery signal, not silence, so consumers can
    /// observe a source returning to health.
    #[must_use]
    pub fn from_status(status: DecisionStatus) -> Self {
        match status {
            DecisionStatus::Anomaly => Self::Anomaly,
            DecisionStatus::Warning => Self::Warning,
            DecisionStatus::Ok => Self::Recovery,
            DecisionStatus::Unknown => Self::Info,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The last-known notification state for one (source, webhook target)
/// pair. Persisted so the alerting pipeline can suppress repeat
/// notifications for an unchanged decision within the cooldown window.
///
/// This type holds data only; the dispatch-gate logic (`should_alert`)
/// lives in the alerting pipeline so it can be exercised against the
/// current wall clock without threading time through this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertState {
    pub source_name: SourceName,
    pub target_name: TargetName,
    pub notified_status: DecisionStatus,
    pub notified_reason_hash: String,
    pub last_change_at: DateTime<Utc>,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub cooldown_until: Option<DateTime<Utc>>,
}

impl AlertState {
    /// The state recorded for a (source, target) pair that has never been
    /// notified before.
    #[must_use]
    pub fn unknown(
        source_name: impl Into<SourceName>,
        target_name: impl Into<TargetName>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            target_name: target_name.into(),
            notified_status: DecisionStatus::Unknown,
            notified_reason_hash: String::new(),
            last_change_at: now,
            last_sent_at: None,
            cooldown_until: None,
        }
    }
}
