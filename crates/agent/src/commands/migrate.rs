use std::path::Path;

use driftwatch_state::StateStore;

use crate::config_loader::{load_config, resolve_config_env_vars};
use crate::storage::open_store;

/// Run the state store's schema migration. Idempotent: safe to run on an
/// already-migrated database.
pub async fn run(config_path: &Path) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;
    let config = resolve_config_env_vars(config)?;
    let store = open_store(&config).await?;

    let version = store.schema_version().await?;
    println!("schema at version {version}");

    Ok(0)
}
