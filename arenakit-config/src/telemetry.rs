//! Observability configuration.
//!
//! Parameters for:
//! - Log filtering
//! - Prometheus export

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default `tracing` level when `RUST_LOG` is unset.
    #[validate(custom(function = validation::validate_log_level))]
    pub log_level: String,

    /// Print Prometheus text after a run.
    pub prometheus: bool,

    /// Prefix of exported metric names.
    #[validate(custom(function = validation::validate_metric_namespace))]
    pub metrics_namespace: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            prometheus: false,
            metrics_namespace: "arenakit".into(),
        }
    }
}
