use std::path::Path;

use driftwatch_state::StateStore;

use crate::cli::PurgeArgs;
use crate::config_loader::{load_config, resolve_config_env_vars};
use crate::storage::open_store;

/// Apply the configured retention policy, deleting snapshots and delivery
/// log rows past their window.
pub async fn run(config_path: &Path, args: &PurgeArgs) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;
    let config = resolve_config_env_vars(config)?;
    let store = open_store(&config).await?;

    if args.dry_run {
        println!(
            "dry run: would purge snapshots older than {} days, keeping at least {} per source",
            config.retention.days, config.retention.min_snapshots
        );
        return Ok(0);
    }

    let deleted = store.purge_retention(config.retention.days, config.retention.min_snapshots).await?;
    println!("purged {deleted} row(s)");

    Ok(0)
}
