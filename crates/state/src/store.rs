use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use driftwatch_core::{
    AlertState, CollectStatus, DecisionStatus, DeliveryRecord, DeliveryResult, EventType,
    Metrics, Snapshot, SnapshotMetadata, SourceName, TargetName,
};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::error::StateError;
use crate::migrations;

/// Persistence boundary for the agent: append-only snapshots, per-target
/// alert state, and the delivery log.
///
/// Implementations must be `Send + Sync`. The agent holds a single
/// instance for its lifetime; the trait does not assume a particular
/// backend, though [`SqliteStateStore`] is the only implementation
/// shipped here.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Run schema migrations. Safe to call on every startup.
    async fn migrate(&self) -> Result<(), StateError>;

    /// Cheap liveness check for the `status` CLI command.
    async fn healthcheck(&self) -> Result<(), StateError>;

    async fn schema_version(&self) -> Result<i64, StateError>;

    /// Append a snapshot and return its assigned id.
    async fn append_snapshot(&self, snapshot: &Snapshot) -> Result<i64, StateError>;

    async fn get_last_snapshot(&self, source_name: &SourceName) -> Result<Option<Snapshot>, StateError>;

    /// List the most recent snapshots for a source, newest first.
    async fn list_snapshots(
        &self,
        source_name: &SourceName,
        limit: i64,
        max_age_days: i64,
        success_only: bool,
    ) -> Result<Vec<Snapshot>, StateError>;

    async fn get_alert_state(
        &self,
        source_name: &SourceName,
        target_name: &TargetName,
    ) -> Result<Option<AlertState>, StateError>;

    async fn set_alert_state(&self, state: &AlertState) -> Result<(), StateError>;

    async fn log_delivery(&self, record: &DeliveryRecord) -> Result<(), StateError>;

    /// Delete snapshots older than `days` per source, always keeping at
    /// least `min_keep` of the most recent ones regardless of age. Also
    /// deletes delivery log rows older than `days`. Returns the total
    /// number of rows deleted.
    async fn purge_retention(&self, days: i64, min_keep: i64) -> Result<u64, StateError>;
}

/// SQLite-backed [`StateStore`].
///
/// Runs in WAL mode with foreign keys enabled; timestamps are stored as
/// RFC 3339 text, metrics and metadata as JSON text columns.
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Open (creating if absent) the SQLite database at `path` and run
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Connection`] if the pool cannot be created,
    /// or [`StateError::Migration`] if migrations fail.
    pub async fn open(path: &str) -> Result<Self, StateError> {
        let url = format!("sqlite://{path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA foreign_keys=ON").execute(&pool).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an already-open pool (useful for tests and in-memory stores).
    /// Runs migrations immediately.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Migration`] if migrations fail.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StateError> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    fn row_to_snapshot(row: &SqliteRow) -> Result<Snapshot, StateError> {
        let id: i64 = row.try_get("id")?;
        let source_name: String = row.try_get("source_name")?;
        let collected_at: String = row.try_get("collected_at")?;
        let collect_status: String = row.try_get("collect_status")?;
        let metrics_json: String = row.try_get("metrics_json")?;
        let metadata_json: String = row.try_get("metadata_json")?;

        let collected_at = DateTime::parse_from_rfc3339(&collected_at)
            .map_err(|e| StateError::Serialization(e.to_string()))?
            .with_timezone(&Utc);
        let collect_status = parse_collect_status(&collect_status)?;
        let metrics: Metrics = serde_json::from_str(&metrics_json)?;
        let metadata: SnapshotMetadata = serde_json::from_str(&metadata_json)?;

        Ok(Snapshot {
            id: Some(id),
            source_name: source_name.into(),
            collected_at,
            collect_status,
            metrics,
            metadata,
        })
    }

    fn row_to_alert_state(row: &SqliteRow) -> Result<AlertState, StateError> {
        let source_name: String = row.try_get("source_name")?;
        let target_name: String = row.try_get("target_name")?;
        let notified_status: String = row.try_get("notified_status")?;
        let notified_reason_hash: String = row.try_get("notified_reason_hash")?;
        let last_change_at: String = row.try_get("last_change_at")?;
        let last_sent_at: Option<String> = row.try_get("last_sent_at")?;
        let cooldown_until: Option<String> = row.try_get("cooldown_until")?;

        Ok(AlertState {
            source_name: source_name.into(),
            target_name: target_name.into(),
            notified_status: parse_decision_status(&notified_status)?,
            notified_reason_hash,
            last_change_at: parse_rfc3339(&last_change_at)?,
            last_sent_at: last_sent_at.map(|s| parse_rfc3339(&s)).transpose()?,
            cooldown_until: cooldown_until.map(|s| parse_rfc3339(&s)).transpose()?,
        })
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, StateError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StateError::Serialization(e.to_string()))
}

fn parse_collect_status(value: &str) -> Result<CollectStatus, StateError> {
    match value {
        "SUCCESS" => Ok(CollectStatus::Success),
        "COLLECT_FAILED" => Ok(CollectStatus::CollectFailed),
        other => Err(StateError::Serialization(format!("unknown collect_status: {other}"))),
    }
}

fn parse_decision_status(value: &str) -> Result<DecisionStatus, StateError> {
    match value {
        "OK" => Ok(DecisionStatus::Ok),
        "WARNING" => Ok(DecisionStatus::Warning),
        "ANOMALY" => Ok(DecisionStatus::Anomaly),
        "UNKNOWN" => Ok(DecisionStatus::Unknown),
        other => Err(StateError::Serialization(format!("unknown decision status: {other}"))),
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    #[tracing::instrument(skip(self))]
    async fn migrate(&self) -> Result<(), StateError> {
        migrations::run_migrations(&self.pool).await
    }

    async fn healthcheck(&self) -> Result<(), StateError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn schema_version(&self) -> Result<i64, StateError> {
        migrations::current_version(&self.pool).await
    }

    #[tracing::instrument(skip(self, snapshot), fields(source_name = %snapshot.source_name))]
    async fn append_snapshot(&self, snapshot: &Snapshot) -> Result<i64, StateError> {
        let metrics_json = serde_json::to_string(&snapshot.metrics)?;
        let metadata_json = serde_json::to_string(&snapshot.metadata)?;

        let result = sqlx::query(
            "INSERT INTO snapshots (
                source_name, collected_at, collect_status, row_count,
                latest_timestamp, metrics_json, metadata_json, duration_ms,
                error_code, error_message
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(snapshot.source_name.as_str())
        .bind(snapshot.collected_at.to_rfc3339())
        .bind(snapshot.collect_status.as_str())
        .bind(snapshot.metrics.row_count)
        .bind(snapshot.metrics.latest_timestamp.map(|t| t.to_rfc3339()))
        .bind(metrics_json)
        .bind(metadata_json)
        .bind(snapshot.metadata.duration_ms.map(|v| v as i64))
        .bind(snapshot.metadata.error_code.as_deref())
        .bind(snapshot.metadata.error_message.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get_last_snapshot(&self, source_name: &SourceName) -> Result<Option<Snapshot>, StateError> {
        let row = sqlx::query(
            "SELECT * FROM snapshots WHERE source_name = ? ORDER BY collected_at DESC LIMIT 1",
        )
        .bind(source_name.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_snapshot).transpose()
    }

    async fn list_snapshots(
        &self,
        source_name: &SourceName,
        limit: i64,
        max_age_days: i64,
        success_only: bool,
    ) -> Result<Vec<Snapshot>, StateError> {
        let cutoff = (Utc::now() - Duration::days(max_age_days)).to_rfc3339();

        let query = if success_only {
            "SELECT * FROM snapshots
             WHERE source_name = ? AND collect_status = 'SUCCESS' AND collected_at >= ?
             ORDER BY collected_at DESC LIMIT ?"
        } else {
            "SELECT * FROM snapshots
             WHERE source_name = ? AND collected_at >= ?
             ORDER BY collected_at DESC LIMIT ?"
        };

        let rows = sqlx::query(query)
            .bind(source_name.as_str())
            .bind(cutoff)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_snapshot).collect()
    }

    async fn get_alert_state(
        &self,
        source_name: &SourceName,
        target_name: &TargetName,
    ) -> Result<Option<AlertState>, StateError> {
        let row = sqlx::query("SELECT * FROM alert_state WHERE source_name = ? AND target_name = ?")
            .bind(source_name.as_str())
            .bind(target_name.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_alert_state).transpose()
    }

    async fn set_alert_state(&self, state: &AlertState) -> Result<(), StateError> {
        sqlx::query(
            "INSERT OR REPLACE INTO alert_state (
                source_name, target_name, notified_status, notified_reason_hash,
                last_change_at, last_sent_at, cooldown_until
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(state.source_name.as_str())
        .bind(state.target_name.as_str())
        .bind(state.notified_status.as_str())
        .bind(&state.notified_reason_hash)
        .bind(state.last_change_at.to_rfc3339())
        .bind(state.last_sent_at.map(|t| t.to_rfc3339()))
        .bind(state.cooldown_until.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn log_delivery(&self, record: &DeliveryRecord) -> Result<(), StateError> {
        sqlx::query(
            "INSERT INTO deliveries (
                source_name, target_name, event_type, payload_hash,
                sent_at, success, status_code, latency_ms, error_message, attempts
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.source_name.as_str())
        .bind(record.target_name.as_str())
        .bind(record.event_type.as_str())
        .bind(&record.payload_hash)
        .bind(record.sent_at.to_rfc3339())
        .bind(i64::from(record.result.success))
        .bind(record.result.status_code.map(i64::from))
        .bind(record.result.latency_ms as i64)
        .bind(record.result.error.as_deref())
        .bind(i64::from(record.result.attempts))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(days, min_keep))]
    async fn purge_retention(&self, days: i64, min_keep: i64) -> Result<u64, StateError> {
        let cutoff = (Utc::now() - Duration::days(days)).to_rfc3339();
        let mut total_deleted: u64 = 0;

        let sources: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT source_name FROM snapshots")
                .fetch_all(&self.pool)
                .await?;

        for source in sources {
            let ids: Vec<i64> = sqlx::query_scalar(
                "SELECT id FROM snapshots WHERE source_name = ? ORDER BY collected_at DESC",
            )
            .bind(&source)
            .fetch_all(&self.pool)
            .await?;

            if ids.len() as i64 <= min_keep {
                continue;
            }

            let keep_ids: HashSet<i64> = ids.into_iter().take(min_keep.max(0) as usize).collect();

            let candidate_ids: Vec<i64> = sqlx::query_scalar(
                "SELECT id FROM snapshots WHERE source_name = ? AND collected_at < ?",
            )
            .bind(&source)
            .bind(&cutoff)
            .fetch_all(&self.pool)
            .await?;

            let to_delete: Vec<i64> = candidate_ids
                .into_iter()
                .filter(|id| !keep_ids.contains(id))
                .collect();

            if to_delete.is_empty() {
                continue;
            }

            let placeholders = to_delete.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let sql = format!("DELETE FROM snapshots WHERE id IN ({placeholders})");
            let mut query = sqlx::query(&sql);
            for id in &to_delete {
                query = query.bind(id);
            }
            query.execute(&self.pool).await?;
            total_deleted += to_delete.len() as u64;
        }

        let deleted_deliveries = sqlx::query("DELETE FROM deliveries WHERE sent_at < ?")
            .bind(&cutoff)
            .execute(&self.pool)
            .await?;
        total_deleted += deleted_deliveries.rows_affected();

        tracing::debug!(total_deleted, "retention purge complete");
        Ok(total_deleted)
    }
}
