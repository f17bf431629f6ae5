//! Durable storage for the driftwatch agent.
//!
//! [`StateStore`] is the trait the rest of the agent programs against;
//! [`SqliteStateStore`] is the embedded-file-backed implementation used
//! in production.

pub mod error;
pub mod migrations;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::StateError;
pub use store::{SqliteStateStore, StateStore};
