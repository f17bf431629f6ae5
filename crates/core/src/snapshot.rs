use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SourceName;

/// Outcome of a single collection attempt against a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectStatus {
    Success,
    CollectFailed,
}

impl CollectStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::CollectFailed => "COLLECT_FAILED",
        }
    }
}

impl std::fmt::Display for CollectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of a source's observed schema: a name and a driver-reported
/// type name (e.g. `"integer"`, `"timestamp"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl SchemaColumn {
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// The semi-structured metric bag carried by a snapshot.
///
/// `row_count` and `latest_timestamp` are the two recognized keys the
/// detection engine understands; anything else is stored and forwarded
/// verbatim in `extra` so unknown metrics survive the round trip into the
/// webhook payload untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_timestamp: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Metrics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count.is_none() && self.latest_timestamp.is_none() && self.extra.is_empty()
    }
}

/// Connector-reported metadata attached to every snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    pub connector_type: String,

    pub dialect: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<SchemaColumn>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// A normalized observation of one source at one instant.
///
/// Created by a connector, appended exactly once by the state store, and
/// never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Store-assigned monotonic id. `None` until appended.
    pub id: Option<i64>,
    pub source_name: SourceName,
    pub collected_at: DateTime<Utc>,
    pub collect_status: CollectStatus,
    pub metrics: Metrics,
    pub metadata: SnapshotMetadata,
}

impl Snapshot {
    /// Build a successful snapshot.
    #[must_use]
    pub fn success(
        source_name: impl Into<SourceName>,
        collected_at: DateTime<Utc>,
        metrics: Metrics,
        metadata: SnapshotMetadata,
    ) -> Self {
        Self {
            id: None,
            source_name: source_name.into(),
            collected_at,
            collect_status: CollectStatus::Success,
            metrics,
            metadata,
        }
    }

    /// Build a failed snapshot. A `COLLECT_FAILED` snapshot always carries
    /// empty metrics.
    #[must_use]
    pub fn collect_failed(
        source_name: impl Into<SourceName>,
        collected_at: DateTime<Utc>,
        connector_type: impl Into<String>,
        dialect: impl Into<String>,
        error_code: impl Into<String>,
        error_message: impl Into<String>,
        duration_ms: Option<u64>,
    ) -> Self {
        Self {
            id: None,
            source_name: source_name.into(),
            collected_at,
            collect_status: CollectStatus::CollectFailed,
            metrics: Metrics::default(),
            metadata: SnapshotMetadata {
                duration_ms,
                connector_type: connector_type.into(),
                dialect: dialect.into(),
                schema: None,
                error_code: Some(error_code.into()),
                error_message: Some(error_message.into()),
            },
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.collect_status == CollectStatus::Success
    }
}
