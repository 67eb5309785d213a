//! ## arenakit-telemetry::logging
//! **`tracing` subscriber setup**
//!
//! ### Expectations:
//! - `RUST_LOG` wins over the configured default level
//! - Core crates only emit events; installing a subscriber happens here
//!
//! ### Events emitted by the core:
//! - `debug`: region growth, arena binding
//! - `trace`: arena clears, span reallocation
//! - `warn`: pooled regions dropped
//! - `error`: foreign pointers

use arenakit_core::Metrics;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct ArenaLogger;

impl ArenaLogger {
    /// Installs the global fmt subscriber.
    ///
    /// Fails when a global subscriber is already set.
    pub fn init(default_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
            )
            .with_thread_names(true)
            .try_init()
    }

    /// Logs a metrics snapshot under `scope`.
    #[inline]
    pub fn log_metrics(scope: &str, metrics: &Metrics) {
        tracing::info!(
            scope,
            used = metrics.used_bytes,
            allocated = metrics.allocated_bytes,
            data = metrics.data_bytes,
            padding = metrics.padding_overhead(),
            allocations = metrics.allocation_count,
            heap_allocations = metrics.on_heap_allocation_count,
            "arena metrics"
        );
    }
}
