use std::path::Path;

use driftwatch_state::StateStore;

use crate::cli::HistoryArgs;
use crate::config_loader::{load_config, resolve_config_env_vars};
use crate::storage::open_store;

/// Show the most recent snapshots recorded for one source.
pub async fn run(config_path: &Path, args: &HistoryArgs) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;
    let config = resolve_config_env_vars(config)?;
    let store = open_store(&config).await?;

    let source_name = args.source.as_str().into();
    let snapshots = store
        .list_snapshots(&source_name, args.limit, config.baseline.max_age_days, false)
        .await?;

    if snapshots.is_empty() {
        println!("No snapshots recorded for {}", args.source);
        return Ok(0);
    }

    println!("{:<28} {:<16} {:<10} {}", "COLLECTED AT", "STATUS", "ROW COUNT", "LATEST TIMESTAMP");
    for snapshot in &snapshots {
        println!(
            "{:<28} {:<16} {:<10} {}",
            snapshot.collected_at.to_rfc3339(),
            snapshot.collect_status,
            snapshot.metrics.row_count.map(|n| n.to_string()).unwrap_or_else(|| "-".to_owned()),
            snapshot.metrics.latest_timestamp.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_owned()),
        );
    }

    Ok(0)
}
