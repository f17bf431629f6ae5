//! Shared data model for the driftwatch agent.
//!
//! Types in this crate are pure data: snapshots collected from a source,
//! the detection engine's decisions, alert dispatch state, and the
//! webhook payload shape. Behavior (detection, state storage, alert
//! dispatch, delivery) lives in the crates built on top of this one.

pub mod alert_state;
pub mod baseline;
pub mod config;
pub mod decision;
pub mod delivery;
pub mod env_interp;
pub mod error;
pub mod ids;
pub mod reason;
pub mod snapshot;
pub mod webhook_payload;

pub use alert_state::{AlertState, EventType};
pub use baseline::BaselineSummary;
pub use config::{
    AgentConfig, AlertingConfig, BaselineConfig, DriftwatchConfig, FreshnessConfig,
    RetentionConfig, SourceConfig, StorageConfig, VolumeConfig, WebhookConfig,
};
pub use decision::{Decision, DecisionStatus};
pub use delivery::{DeliveryRecord, DeliveryResult};
pub use env_interp::{mask_secrets, reject_inline_credentials, resolve_env_vars};
pub use error::CoreError;
pub use ids::{SourceName, TargetName};
pub use reason::{Reason, ReasonCode};
pub use snapshot::{CollectStatus, Metrics, SchemaColumn, Snapshot, SnapshotMetadata};
pub use webhook_payload::WebhookPayload;
