use std::path::Path;

use chrono::Utc;
use driftwatch_detect::DetectionEngine;
use driftwatch_state::StateStore;

use crate::cli::ExplainArgs;
use crate::config_loader::{load_config, resolve_config_env_vars};
use crate::error::AgentError;
use crate::storage::open_store;

/// Recompute and print the decision the detection engine would make from
/// the last recorded snapshot, without collecting a new one.
pub async fn run(config_path: &Path, args: &ExplainArgs) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;
    let config = resolve_config_env_vars(config)?;
    let store = open_store(&config).await?;

    let source = config
        .sources
        .iter()
        .find(|s| s.name.as_str() == args.source)
        .ok_or_else(|| AgentError::SourceNotFound(args.source.clone()))?;

    let last = store
        .get_last_snapshot(&source.name)
        .await?
        .ok_or_else(|| AgentError::SourceNotFound(format!("{} has no recorded snapshots", args.source)))?;

    let history = store
        .list_snapshots(&source.name, config.baseline.window_size as i64, config.baseline.max_age_days, true)
        .await?;

    let decision = DetectionEngine::new().analyze(&last, &history, source, Utc::now());

    println!("{}  {}", source.name, decision.status);
    println!("confidence: {:.2}", decision.confidence);
    if decision.reasons.is_empty() {
        println!("no reasons recorded");
    } else {
        for reason in &decision.reasons {
            println!("- [{}] {}", reason.code.as_str(), reason.message);
        }
    }
    if let Some(summary) = &decision.baseline_summary {
        println!("baseline: {summary:?}");
    }

    Ok(0)
}
