//! Baseline computation and the anomaly detection engine.
//!
//! Everything here is a pure function of its inputs: no I/O, no clock
//! access beyond an explicit `now` parameter. Callers in
//! `driftwatch-agent` are responsible for fetching history from the
//! state store and windowing it per `BaselineConfig` before calling in.

pub mod baseline;
pub mod engine;

pub use baseline::calculate_baseline;
pub use engine::DetectionEngine;
