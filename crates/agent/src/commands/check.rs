use chrono::Utc;
use driftwatch_alert::AlertingPipeline;
use driftwatch_core::DecisionStatus;
use driftwatch_detect::DetectionEngine;
use driftwatch_scheduler::is_due;
use driftwatch_state::StateStore;
use tracing::{info, warn};

use crate::cli::CheckArgs;
use crate::config_loader::{load_config, resolve_config_env_vars};
use crate::connector::{Connector, SqlConnector};
use crate::error::AgentError;
use crate::storage::open_store;

/// Exit code convention: 0 = every checked source is OK, 1 = an
/// operational error prevented the run, 2 = at least one source is in
/// WARNING or ANOMALY.
pub async fn run(cli_config_path: &std::path::Path, args: &CheckArgs) -> anyhow::Result<i32> {
    let config = load_config(cli_config_path)?;
    let config = resolve_config_env_vars(config)?;
    let store = open_store(&config).await?;

    let connector = SqlConnector::new();
    let engine = DetectionEngine::new();
    let pipeline = AlertingPipeline::new(&config.alerting, &store, config.agent.id.clone(), args.dry_run);

    let mut sources: Vec<_> = config.sources.iter().filter(|s| s.enabled).collect();
    if let Some(name) = &args.source {
        sources.retain(|s| s.name.as_str() == name);
        if sources.is_empty() {
            return Err(AgentError::SourceNotFound(name.clone()).into());
        }
    }

    let now = Utc::now();
    let mut has_anomaly = false;
    let mut results = Vec::new();

    for source in sources {
        if !args.force {
            let last = store.get_last_snapshot(&source.name).await?;
            if !is_due(&source.schedule, last.map(|s| s.collected_at), now)? {
                continue;
            }
        }

        let snapshot = connector.collect_with_error_handling(source).await;
        store.append_snapshot(&snapshot).await?;

        let history = store
            .list_snapshots(&source.name, config.baseline.window_size as i64, config.baseline.max_age_days as i64, true)
            .await?;

        let decision = engine.analyze(&snapshot, &history, source, now);
        let alert_results = pipeline.process(source, &decision).await?;

        if matches!(decision.status, DecisionStatus::Anomaly | DecisionStatus::Warning) {
            has_anomaly = true;
        }

        info!(source = %source.name, status = %decision.status, "checked");
        results.push((source.name.clone(), decision, alert_results));
    }

    if args.json {
        print_json(&results);
    } else {
        print_human(&results, args.dry_run);
    }

    if has_anomaly {
        Ok(2)
    } else {
        Ok(0)
    }
}

type CheckResult = (
    driftwatch_core::SourceName,
    driftwatch_core::Decision,
    std::collections::BTreeMap<driftwatch_core::TargetName, bool>,
);

fn print_json(results: &[CheckResult]) {
    let value: Vec<_> = results
        .iter()
        .map(|(name, decision, alerts)| {
            serde_json::json!({
                "source": name.as_str(),
                "status": decision.status.as_str(),
                "reasons": decision.reasons,
                "confidence": decision.confidence,
                "alerts": alerts,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "results": value })).unwrap());
}

fn print_human(results: &[CheckResult], dry_run: bool) {
    if results.is_empty() {
        println!("No sources checked");
        return;
    }

    println!("\nChecked {} source(s)\n", results.len());

    for (name, decision, alerts) in results {
        println!("{}  {}", name, decision.status);
        for reason in &decision.reasons {
            println!("  -> {}", reason.message);
        }
        if !alerts.is_empty() {
            if dry_run {
                let targets: Vec<&str> = alerts.keys().map(driftwatch_core::TargetName::as_str).collect();
                println!("  would alert: {}", targets.join(", "));
            } else {
                for (target, success) in alerts {
                    if *success {
                        println!("  sent to {target}");
                    } else {
                        warn!(target = %target, "delivery failed");
                        println!("  failed: {target}");
                    }
                }
            }
        }
        println!();
    }

    let ok = results.iter().filter(|(_, d, _)| d.status == DecisionStatus::Ok).count();
    let warning = results.iter().filter(|(_, d, _)| d.status == DecisionStatus::Warning).count();
    let anomaly = results.iter().filter(|(_, d, _)| d.status == DecisionStatus::Anomaly).count();
    println!("Summary: {ok} OK, {warning} WARNING, {anomaly} ANOMALY");
}
