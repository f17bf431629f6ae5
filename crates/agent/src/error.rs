use thiserror::Error;

use driftwatch_core::CoreError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("failed to parse YAML config {path}: {source}")]
    Yaml { path: String, source: serde_yaml_ng::Error },

    #[error("failed to parse TOML config {path}: {source}")]
    Toml { path: String, source: toml::de::Error },

    #[error("unsupported config file extension: {0}")]
    UnsupportedExtension(String),

    #[error("unsupported storage backend: {0}")]
    UnsupportedStorageBackend(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    State(#[from] driftwatch_state::StateError),

    #[error("source not found: {0}")]
    SourceNotFound(String),
}
