use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use driftwatch_core::{Metrics, SchemaColumn, SnapshotMetadata, SourceConfig, Snapshot};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Column, Row, TypeInfo};
use tracing::instrument;

/// Executes a source's configured query against its data store and turns
/// the result row into a [`Snapshot`].
#[async_trait]
pub trait Connector: Send + Sync {
    /// Collect from `config`, degrading to a `COLLECT_FAILED` snapshot on
    /// any failure rather than propagating an error: a collection failure
    /// is itself a signal the detection engine reasons about.
    async fn collect_with_error_handling(&self, config: &SourceConfig) -> Snapshot;
}

/// Only the `sqlite` dialect is implemented here: connecting to Postgres,
/// MySQL, or ClickHouse requires a driver and network access this
/// workspace does not carry, and is the concrete-dialect-driver piece
/// left to an external collaborator.
#[derive(Debug, Default)]
pub struct SqlConnector;

impl SqlConnector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn collect(&self, config: &SourceConfig) -> Result<Snapshot, ConnectorError> {
        if config.dialect.to_lowercase() != "sqlite" {
            return Err(ConnectorError::UnsupportedDialect(config.dialect.clone()));
        }

        let start = std::time::Instant::now();

        let pool = SqlitePoolOptions::new()
            .connect(&config.connection)
            .await
            .map_err(|e| ConnectorError::Connection(e.to_string()))?;

        let row = sqlx::query(&config.query)
            .fetch_optional(&pool)
            .await
            .map_err(|e| ConnectorError::Query(e.to_string()))?
            .ok_or(ConnectorError::NoRows)?;

        let (metrics, schema) = extract_metrics(&row)?;
        let duration_ms = elapsed_ms(start);

        Ok(Snapshot::success(
            config.name.clone(),
            Utc::now(),
            metrics,
            SnapshotMetadata {
                duration_ms: Some(duration_ms),
                connector_type: "sql".to_owned(),
                dialect: config.dialect.clone(),
                schema: Some(schema),
                error_code: None,
                error_message: None,
            },
        ))
    }
}

#[async_trait]
impl Connector for SqlConnector {
    #[instrument(skip(self, config), fields(source = %config.name, dialect = %config.dialect))]
    async fn collect_with_error_handling(&self, config: &SourceConfig) -> Snapshot {
        let collected_at = Utc::now();
        let start = std::time::Instant::now();

        match self.collect(config).await {
            Ok(snapshot) => snapshot,
            Err(err) => Snapshot::collect_failed(
                config.name.clone(),
                collected_at,
                "sql",
                config.dialect.clone(),
                err.code(),
                err.to_string(),
                Some(elapsed_ms(start)),
            ),
        }
    }
}

fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn extract_metrics(row: &sqlx::sqlite::SqliteRow) -> Result<(Metrics, Vec<SchemaColumn>), ConnectorError> {
    let mut by_name: BTreeMap<String, serde_json::Value> = BTreeMap::new();
    let mut schema = Vec::new();

    for column in row.columns() {
        let name = column.name().to_owned();
        let type_name = column.type_info().name().to_owned();
        let value = column_to_json(row, column.ordinal());
        schema.push(SchemaColumn::new(name.clone(), type_name));
        by_name.insert(name, value);
    }

    let row_count = pick_int(&by_name, &["row_count", "count"]).ok_or(ConnectorError::MissingRowCount)?;
    let latest_timestamp = pick_timestamp(&by_name, &["latest_timestamp", "max_timestamp"]);

    let mut extra = BTreeMap::new();
    for (key, value) in &by_name {
        if key == "row_count" || key == "count" || key == "latest_timestamp" || key == "max_timestamp" {
            continue;
        }
        if value.is_number() {
            extra.insert(key.clone(), value.clone());
        }
    }

    Ok((
        Metrics {
            row_count: Some(row_count),
            latest_timestamp,
            extra,
        },
        schema,
    ))
}

fn pick_int(row: &BTreeMap<String, serde_json::Value>, keys: &[&str]) -> Option<i64> {
    for key in keys {
        if let Some(value) = row.get(*key) {
            return value.as_i64().or_else(|| value.as_f64().map(|f| f as i64));
        }
    }
    None
}

fn pick_timestamp(row: &BTreeMap<String, serde_json::Value>, keys: &[&str]) -> Option<DateTime<Utc>> {
    for key in keys {
        if let Some(serde_json::Value::String(s)) = row.get(*key) {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
        }
    }
    None
}

fn column_to_json(row: &sqlx::sqlite::SqliteRow, index: usize) -> serde_json::Value {
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return serde_json::json!(v);
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return serde_json::json!(v);
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return serde_json::json!(v);
    }
    serde_json::Value::Null
}

#[derive(Debug, thiserror::Error)]
enum ConnectorError {
    #[error("unsupported dialect: {0}")]
    UnsupportedDialect(String),
    #[error("database connection failed: {0}")]
    Connection(String),
    #[error("query execution failed: {0}")]
    Query(String),
    #[error("query returned no rows")]
    NoRows,
    #[error("query must return a row_count or count column")]
    MissingRowCount,
}

impl ConnectorError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedDialect(_) => "unsupported_dialect",
            Self::Connection(_) => "connection_error",
            Self::Query(_) => "query_error",
            Self::NoRows => "no_rows",
            Self::MissingRowCount => "validation_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config(query: &str) -> SourceConfig {
        SourceConfig {
            name: "orders_daily".into(),
            source_type: "sql".into(),
            dialect: "sqlite".into(),
            connection: "sqlite::memory:".into(),
            query: query.to_owned(),
            schedule: "*/15 * * * *".into(),
            freshness: Default::default(),
            volume: Default::default(),
            schema_drift: true,
            enabled: true,
        }
    }

    #[tokio::test]
    async fn successful_query_produces_success_snapshot() {
        let connector = SqlConnector::new();
        let config = sample_config("select 42 as row_count");
        let snapshot = connector.collect_with_error_handling(&config).await;
        assert!(snapshot.is_success());
        assert_eq!(snapshot.metrics.row_count, Some(42));
    }

    #[tokio::test]
    async fn missing_row_count_column_is_collect_failed() {
        let connector = SqlConnector::new();
        let config = sample_config("select 1 as not_count");
        let snapshot = connector.collect_with_error_handling(&config).await;
        assert!(!snapshot.is_success());
        assert_eq!(snapshot.metadata.error_code.as_deref(), Some("validation_error"));
    }

    #[tokio::test]
    async fn unsupported_dialect_is_collect_failed() {
        let connector = SqlConnector::new();
        let mut config = sample_config("select 1 as row_count");
        config.dialect = "postgres".into();
        let snapshot = connector.collect_with_error_handling(&config).await;
        assert!(!snapshot.is_success());
        assert_eq!(snapshot.metadata.error_code.as_deref(), Some("unsupported_dialect"));
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ConnectorError::NoRows.code(), "no_rows");
        assert_eq!(ConnectorError::MissingRowCount.code(), "validation_error");
    }
}
