/// A commented example configuration, written by `driftwatch init`.
pub const EXAMPLE_CONFIG: &str = r#"# driftwatch configuration
version: "1"

agent:
  id: driftwatch-agent
  log_level: info
  log_format: text

storage:
  backend: sqlite
  path: ./driftwatch.db

sources:
  - name: orders_daily
    type: sql
    dialect: postgres
    # Use ${VAR} placeholders for credentials; never embed them directly.
    connection: "postgres://${DB_USER}:${DB_PASSWORD}@${DB_HOST}/orders"
    query: "select count(*) as row_count, max(created_at) as latest_timestamp from orders"
    schedule: "*/15 * * * *"
    freshness:
      max_age_hours: 6
      factor: 2.0
    volume:
      min_row_count: 1
      deviation_factor: 3.0
    schema_drift: true
    enabled: true

alerting:
  cooldown_minutes: 60
  webhooks:
    - name: slack
      url: "${SLACK_WEBHOOK_URL}"
      secret: "${SLACK_WEBHOOK_SECRET}"
      events: [anomaly, recovery]
      timeout_seconds: 10

retention:
  days: 30
  min_snapshots: 10

baseline:
  window_size: 20
  max_age_days: 30
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_config_parses_as_valid_config() {
        let config: driftwatch_core::DriftwatchConfig = serde_yaml_ng::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.alerting.webhooks.len(), 1);
    }
}
