use driftwatch_core::DriftwatchConfig;
use driftwatch_state::{SqliteStateStore, StateStore};

use crate::error::AgentError;

/// Open the state store described by `config.storage`, running its
/// migration. Only the `sqlite` backend is supported.
pub async fn open_store(config: &DriftwatchConfig) -> Result<SqliteStateStore, AgentError> {
    if config.storage.backend != "sqlite" {
        return Err(AgentError::UnsupportedStorageBackend(config.storage.backend.clone()));
    }

    let store = SqliteStateStore::open(&config.storage.path).await?;
    store.migrate().await?;
    Ok(store)
}
