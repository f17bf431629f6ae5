use thiserror::Error;

use driftwatch_core::CoreError;
use driftwatch_state::StateError;

/// Errors raised while routing a decision through the alerting pipeline.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("state store error: {0}")]
    Store(#[from] StateError),

    #[error("config error: {0}")]
    Config(#[from] CoreError),
}
