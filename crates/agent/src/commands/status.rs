use std::path::Path;

use driftwatch_state::StateStore;

use crate::cli::StatusArgs;
use crate::config_loader::{load_config, resolve_config_env_vars};
use crate::storage::open_store;

/// Show the last-known snapshot status of every configured source.
pub async fn run(config_path: &Path, args: &StatusArgs) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;
    let config = resolve_config_env_vars(config)?;
    let store = open_store(&config).await?;

    store.healthcheck().await?;

    let mut rows = Vec::new();
    for source in &config.sources {
        let last = store.get_last_snapshot(&source.name).await?;
        rows.push((source.name.clone(), source.enabled, last));
    }

    if args.json {
        let value: Vec<_> = rows
            .iter()
            .map(|(name, enabled, last)| {
                serde_json::json!({
                    "source": name.as_str(),
                    "enabled": enabled,
                    "last_collected_at": last.as_ref().map(|s| s.collected_at),
                    "collect_status": last.as_ref().map(|s| s.collect_status),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "sources": value })).unwrap());
        return Ok(0);
    }

    if rows.is_empty() {
        println!("No sources configured");
        return Ok(0);
    }

    println!("{:<24} {:<10} {:<28} {}", "SOURCE", "ENABLED", "LAST COLLECTED", "STATUS");
    for (name, enabled, last) in &rows {
        let (collected_at, status) = match last {
            Some(snapshot) => (snapshot.collected_at.to_rfc3339(), format!("{:?}", snapshot.collect_status)),
            None => ("never".to_owned(), "-".to_owned()),
        };
        println!("{:<24} {:<10} {:<28} {}", name, enabled, collected_at, status);
    }

    Ok(0)
}
