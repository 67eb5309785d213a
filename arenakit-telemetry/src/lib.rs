//! # arenakit Telemetry
//!
//! Log subscriber setup and Prometheus export of arena metrics.

pub mod logging;
pub mod metrics;

pub use logging::ArenaLogger;
pub use metrics::MetricsRecorder;
