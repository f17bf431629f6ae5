use serde::{Deserialize, Serialize};

/// The closed set of codes the detection engine can attach to a `Reason`.
///
/// `as_str` mirrors the
/// `KeyKind`-style enum-to-string idiom used elsewhere in this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReasonCode {
    CollectFailed,
    StaleData,
    CollectionGap,
    NoNewData,
    BelowMinVolume,
    VolumeLow,
    VolumeHigh,
    ZeroVolume,
    SchemaDrift,
}

impl ReasonCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CollectFailed => "COLLECT_FAILED",
            Self::StaleData => "STALE_DATA",
            Self::CollectionGap => "COLLECTION_GAP",
            Self::NoNewData => "NO_NEW_DATA",
            Self::BelowMinVolume => "BELOW_MIN_VOLUME",
            Self::VolumeLow => "VOLUME_LOW",
            Self::VolumeHigh => "VOLUME_HIGH",
            Self::ZeroVolume => "ZERO_VOLUME",
            Self::SchemaDrift => "SCHEMA_DRIFT",
        }
    }

    /// Whether this code alone is severe enough to force an `ANOMALY`
    /// classification.
    #[must_use]
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            Self::CollectFailed
                | Self::ZeroVolume
                | Self::BelowMinVolume
                | Self::StaleData
                | Self::SchemaDrift
        )
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detection finding: a stable code plus a human-readable message.
///
/// Only `code` participates in alert dedup (`Decision::reason_hash`);
/// `message` is free text that may vary run to run (e.g. embedded counts)
/// without triggering a re-alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub code: String,
    pub message: String,
}

impl Reason {
    #[must_use]
    pub fn new(code: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_str().to_owned(),
            message: message.into(),
        }
    }
}
