use std::collections::BTreeMap;

use chrono::Utc;
use driftwatch_core::{
    AlertState, AlertingConfig, Decision, DeliveryRecord, EventType, SourceConfig, TargetName, WebhookConfig,
    WebhookPayload, resolve_env_vars,
};
use driftwatch_state::StateStore;
use driftwatch_webhook::WebhookDelivery;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use crate::error::AlertError;
use crate::gate::should_alert;

/// Routes decisions to configured webhook targets, applying the dispatch
/// gate (cooldown + dedup) and recording every attempt in the durable
/// delivery log.
pub struct AlertingPipeline<'a> {
    config: &'a AlertingConfig,
    store: &'a dyn StateStore,
    agent_id: String,
    delivery: WebhookDelivery,
    dry_run: bool,
}

impl<'a> AlertingPipeline<'a> {
    #[must_use]
    pub fn new(config: &'a AlertingConfig, store: &'a dyn StateStore, agent_id: impl Into<String>, dry_run: bool) -> Self {
        Self {
            config,
            store,
            agent_id: agent_id.into(),
            delivery: WebhookDelivery::new(dry_run),
            dry_run,
        }
    }

    /// Process one source's decision against every configured webhook,
    /// returning whether each target's dispatch (if attempted) succeeded.
    ///
    /// A webhook not subscribed to this event type, or skipped because the
    /// dispatch gate suppressed it, is reported as `true`: nothing needed
    /// to be sent and nothing failed.
    #[instrument(skip(self, decision), fields(source = %source_config.name))]
    pub async fn process(
        &self,
        source_config: &SourceConfig,
        decision: &Decision,
    ) -> Result<BTreeMap<TargetName, bool>, AlertError> {
        let mut results = BTreeMap::new();
        let event_type = EventType::from_status(decision.status);

        for webhook in &self.config.webhooks {
            if !webhook.events.iter().any(|e| e == event_type.as_str()) {
                continue;
            }

            let now = Utc::now();
            let state = match self.store.get_alert_state(&source_config.name, &webhook.name).await? {
                Some(state) => state,
                None => AlertState::unknown(source_config.name.clone(), webhook.name.clone(), now),
            };

            if !should_alert(decision, &state, now) {
                debug!(target = %webhook.name, "alert suppressed: no state change or in cooldown");
                results.insert(webhook.name.clone(), true);
                continue;
            }

            let success = self.send_alert(source_config, decision, event_type, webhook, now).await?;
            results.insert(webhook.name.clone(), success);
        }

        Ok(results)
    }

    async fn send_alert(
        &self,
        source_config: &SourceConfig,
        decision: &Decision,
        event_type: EventType,
        webhook: &WebhookConfig,
        now: chrono::DateTime<Utc>,
    ) -> Result<bool, AlertError> {
        let payload = WebhookPayload::new(
            event_type,
            now,
            source_config.name.clone(),
            source_config.source_type.clone(),
            decision.clone(),
            self.agent_id.clone(),
        );

        if self.dry_run {
            info!(target = %webhook.name, event = %event_type, "dry run: would send alert");
            return Ok(true);
        }

        let resolved = WebhookConfig {
            name: webhook.name.clone(),
            url: resolve_env_vars(&webhook.url)?,
            secret: webhook.secret.as_deref().map(resolve_env_vars).transpose()?,
            events: webhook.events.clone(),
            timeout_seconds: webhook.timeout_seconds,
        };

        let result = self.delivery.deliver(&payload, &resolved).await;
        let payload_hash = hash_payload(&payload.to_canonical_string());

        self.store
            .log_delivery(&DeliveryRecord {
                source_name: source_config.name.clone(),
                target_name: webhook.name.clone(),
                event_type,
                payload_hash,
                sent_at: now,
                result: result.clone(),
            })
            .await?;

        if result.success {
            let new_state = AlertState {
                source_name: source_config.name.clone(),
                target_name: webhook.name.clone(),
                notified_status: decision.status,
                notified_reason_hash: decision.reason_hash(),
                last_change_at: now,
                last_sent_at: Some(now),
                cooldown_until: Some(now + chrono::Duration::minutes(self.config.cooldown_minutes)),
            };
            self.store.set_alert_state(&new_state).await?;
            info!(
                target = %webhook.name,
                status_code = ?result.status_code,
                latency_ms = result.latency_ms,
                "sent alert"
            );
        } else {
            warn!(
                target = %webhook.name,
                error = ?result.error,
                attempts = result.attempts,
                "failed to send alert"
            );
        }

        Ok(result.success)
    }
}

fn hash_payload(canonical: &str) -> String {
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)[..16].to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftwatch_core::{Metrics, Reason, ReasonCode, WebhookConfig};
    use driftwatch_state::SqliteStateStore;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn open_memory_store() -> SqliteStateStore {
        let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.unwrap();
        SqliteStateStore::from_pool(pool).await.unwrap()
    }

    fn alerting_config(url: String) -> AlertingConfig {
        AlertingConfig {
            cooldown_minutes: 60,
            webhooks: vec![WebhookConfig {
                name: "slack".into(),
                url,
                secret: None,
                events: vec!["anomaly".into(), "recovery".into()],
                timeout_seconds: 5,
            }],
        }
    }

    fn source_config() -> SourceConfig {
        SourceConfig {
            name: "orders_daily".into(),
            source_type: "sql".into(),
            dialect: "postgres".into(),
            connection: "postgres://${DB_URL}".into(),
            query: "select 1".into(),
            schedule: "*/15 * * * *".into(),
            freshness: Default::default(),
            volume: Default::default(),
            schema_drift: true,
            enabled: true,
        }
    }

    fn anomaly_decision() -> Decision {
        Decision {
            status: driftwatch_core::DecisionStatus::Anomaly,
            reasons: vec![Reason::new(ReasonCode::StaleData, "no data in 6h")],
            metrics: Metrics::default(),
            baseline_summary: None,
            confidence: 0.9,
        }
    }

    #[tokio::test]
    async fn first_alert_dispatches_and_records_state() {
        let store = open_memory_store().await;
        let config = alerting_config("http://127.0.0.1:0/unreachable".into());
        let pipeline = AlertingPipeline::new(&config, &store, "driftwatch-agent", true);

        let results = pipeline.process(&source_config(), &anomaly_decision()).await.unwrap();
        assert_eq!(results.get(&TargetName::from("slack")), Some(&true));
    }

    #[tokio::test]
    async fn unsubscribed_event_type_is_skipped() {
        let store = open_memory_store().await;
        let mut config = alerting_config("http://127.0.0.1:0/unreachable".into());
        config.webhooks[0].events = vec!["recovery".into()];
        let pipeline = AlertingPipeline::new(&config, &store, "driftwatch-agent", true);

        let results = pipeline.process(&source_config(), &anomaly_decision()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn repeated_identical_decision_is_suppressed_after_first_send() {
        let store = open_memory_store().await;
        let config = alerting_config("http://127.0.0.1:0/unreachable".into());

        let now = Utc::now();
        store
            .set_alert_state(&AlertState {
                source_name: "orders_daily".into(),
                target_name: "slack".into(),
                notified_status: driftwatch_core::DecisionStatus::Anomaly,
                notified_reason_hash: anomaly_decision().reason_hash(),
                last_change_at: now,
                last_sent_at: Some(now),
                cooldown_until: Some(now + chrono::Duration::minutes(60)),
            })
            .await
            .unwrap();

        let pipeline = AlertingPipeline::new(&config, &store, "driftwatch-agent", true);
        let results = pipeline.process(&source_config(), &anomaly_decision()).await.unwrap();
        assert_eq!(results.get(&TargetName::from("slack")), Some(&true));
    }
}
