use sqlx::SqlitePool;

use crate::error::StateError;

pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_meta (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_name TEXT NOT NULL,
    collected_at TEXT NOT NULL,
    collect_status TEXT NOT NULL,
    row_count INTEGER,
    latest_timestamp TEXT,
    metrics_json TEXT NOT NULL,
    metadata_json TEXT NOT NULL,
    duration_ms INTEGER,
    error_code TEXT,
    error_message TEXT
);

CREATE INDEX IF NOT EXISTS idx_snapshots_source_time
    ON snapshots(source_name, collected_at DESC);
CREATE INDEX IF NOT EXISTS idx_snapshots_source_status_time
    ON snapshots(source_name, collect_status, collected_at DESC);

CREATE TABLE IF NOT EXISTS alert_state (
    source_name TEXT NOT NULL,
    target_name TEXT NOT NULL,
    notified_status TEXT NOT NULL,
    notified_reason_hash TEXT NOT NULL,
    last_change_at TEXT NOT NULL,
    last_sent_at TEXT,
    cooldown_until TEXT,
    PRIMARY KEY (source_name, target_name)
);

CREATE TABLE IF NOT EXISTS deliveries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_name TEXT NOT NULL,
    target_name TEXT NOT NULL,
    event_type TEXT NOT NULL,
    payload_hash TEXT NOT NULL,
    sent_at TEXT NOT NULL,
    success INTEGER NOT NULL,
    status_code INTEGER,
    latency_ms INTEGER,
    error_message TEXT,
    attempts INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_deliveries_source_time
    ON deliveries(source_name, sent_at DESC);
";

/// Apply the schema if `schema_meta` is empty or absent. Idempotent: a
/// store that has already migrated is a no-op.
///
/// # Errors
///
/// Returns [`StateError::Migration`] if any statement fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StateError> {
    let current = current_version(pool).await?;
    if current > 0 {
        return Ok(());
    }

    for statement in SCHEMA_SQL.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StateError::Migration(e.to_string()))?;
    }

    sqlx::query("INSERT OR REPLACE INTO schema_meta (version, applied_at) VALUES (?, ?)")
        .bind(SCHEMA_VERSION)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .map_err(|e| StateError::Migration(e.to_string()))?;

    Ok(())
}

/// The highest applied schema version, or 0 if `schema_meta` doesn't
/// exist yet or is empty.
///
/// # Errors
///
/// Returns [`StateError::Backend`] on an unexpected query failure (table
/// absence is treated as version 0, not an error).
pub async fn current_version(pool: &SqlitePool) -> Result<i64, StateError> {
    let table_exists: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'schema_meta'")
            .fetch_optional(pool)
            .await?;

    if table_exists.is_none() {
        return Ok(0);
    }

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_meta")
        .fetch_one(pool)
        .await?;

    Ok(version.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn migrating_twice_is_a_no_op() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();
        assert_eq!(current_version(&pool).await.unwrap(), SCHEMA_VERSION);
        run_migrations(&pool).await.unwrap();
        assert_eq!(current_version(&pool).await.unwrap(), SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn fresh_database_has_version_zero() {
        let pool = memory_pool().await;
        assert_eq!(current_version(&pool).await.unwrap(), 0);
    }
}
