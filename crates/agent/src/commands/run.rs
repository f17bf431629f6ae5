use std::path::Path;

use chrono::Utc;
use driftwatch_alert::AlertingPipeline;
use driftwatch_core::DecisionStatus;
use driftwatch_detect::DetectionEngine;
use driftwatch_scheduler::{is_due, run_until_shutdown, TICK_INTERVAL};
use driftwatch_state::StateStore;
use tracing::{error, info};

use crate::cli::RunArgs;
use crate::config_loader::{load_config, resolve_config_env_vars};
use crate::connector::{Connector, SqlConnector};
use crate::storage::open_store;

/// Run as a daemon: every tick, check each enabled source whose schedule
/// has elapsed since its last snapshot, in turn. Runs until SIGINT/SIGTERM.
pub async fn run(config_path: &Path, args: &RunArgs) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;
    let config = resolve_config_env_vars(config)?;
    let store = open_store(&config).await?;

    let connector = SqlConnector::new();
    let engine = DetectionEngine::new();
    let pipeline = AlertingPipeline::new(&config.alerting, &store, config.agent.id.clone(), args.dry_run);

    info!(sources = config.sources.len(), "driftwatch daemon starting");

    run_until_shutdown(TICK_INTERVAL, || async {
        let now = Utc::now();
        for source in config.sources.iter().filter(|s| s.enabled) {
            let last = match store.get_last_snapshot(&source.name).await {
                Ok(last) => last,
                Err(err) => {
                    error!(source = %source.name, error = %err, "failed to read last snapshot");
                    continue;
                }
            };

            match is_due(&source.schedule, last.map(|s| s.collected_at), now) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(err) => {
                    error!(source = %source.name, error = %err, "invalid schedule");
                    continue;
                }
            }

            let snapshot = connector.collect_with_error_handling(source).await;
            if let Err(err) = store.append_snapshot(&snapshot).await {
                error!(source = %source.name, error = %err, "failed to persist snapshot");
                continue;
            }

            let history = match store
                .list_snapshots(&source.name, config.baseline.window_size as i64, config.baseline.max_age_days as i64, true)
                .await
            {
                Ok(history) => history,
                Err(err) => {
                    error!(source = %source.name, error = %err, "failed to read snapshot history");
                    continue;
                }
            };

            let decision = engine.analyze(&snapshot, &history, source, now);
            if decision.status != DecisionStatus::Ok {
                info!(source = %source.name, status = %decision.status, "anomaly detected");
            }

            if let Err(err) = pipeline.process(source, &decision).await {
                error!(source = %source.name, error = %err, "alert dispatch failed");
            }
        }
    })
    .await;

    info!("driftwatch daemon stopped");
    Ok(0)
}
