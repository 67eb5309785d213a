//! ## arenakit-telemetry::metrics
//! **Prometheus exporter for arena and pool metrics**
//!
//! Gauges mirror the last recorded [`Metrics`] snapshot, the histogram
//! collects used bytes per recorded arena and the counter tracks clears.

use arenakit_core::alloc::stats::PoolStatsSnapshot;
use arenakit_core::Metrics;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub used_bytes: IntGauge,
    pub allocated_bytes: IntGauge,
    pub data_bytes: IntGauge,
    pub padding_bytes: IntGauge,
    pub allocations: IntGauge,
    pub heap_allocations: IntGauge,
    pub arena_used_bytes: Histogram,
    pub clears: IntCounter,
    pub pool_acquisitions: IntGauge,
    pub pool_releases: IntGauge,
    pub pool_discards: IntGauge,
    pub pool_fresh_regions: IntGauge,
}

fn gauge(
    registry: &Registry,
    namespace: &str,
    name: &str,
    help: &str,
) -> prometheus::Result<IntGauge> {
    let gauge = IntGauge::with_opts(Opts::new(name, help).namespace(namespace))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn as_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl MetricsRecorder {
    /// Creates a recorder whose metric names start with `namespace_`.
    pub fn new(namespace: &str) -> prometheus::Result<Self> {
        let registry = Registry::new();

        let arena_used_bytes = Histogram::with_opts(
            HistogramOpts::new("arena_used_bytes", "Bytes used per recorded arena")
                .namespace(namespace)
                .buckets(prometheus::exponential_buckets(256.0, 4.0, 8)?),
        )?;
        registry.register(Box::new(arena_used_bytes.clone()))?;

        let clears = IntCounter::with_opts(
            Opts::new("arena_clears_total", "Arena clears").namespace(namespace),
        )?;
        registry.register(Box::new(clears.clone()))?;

        let int_gauge = |name: &str, help: &str| gauge(&registry, namespace, name, help);
        Ok(Self {
            used_bytes: int_gauge("arena_used_bytes_current", "Bytes used, padding included")?,
            allocated_bytes: int_gauge("arena_allocated_bytes", "Bytes of backing buckets")?,
            data_bytes: int_gauge("arena_data_bytes", "Bytes requested by callers")?,
            padding_bytes: int_gauge("arena_padding_bytes", "Bytes lost to alignment")?,
            allocations: int_gauge("arena_allocations", "Successful allocations")?,
            heap_allocations: int_gauge("arena_heap_allocations", "Buckets allocated on the heap")?,
            pool_acquisitions: int_gauge("pool_acquisitions", "Arenas handed out by the pool")?,
            pool_releases: int_gauge("pool_releases", "Regions returned to the pool")?,
            pool_discards: int_gauge("pool_discards", "Regions dropped by the pool")?,
            pool_fresh_regions: int_gauge("pool_fresh_regions", "Regions created by the pool")?,
            registry,
            arena_used_bytes,
            clears,
        })
    }

    /// Publishes one arena snapshot.
    pub fn record(&self, metrics: &Metrics) {
        self.used_bytes.set(as_i64(metrics.used_bytes));
        self.allocated_bytes.set(as_i64(metrics.allocated_bytes));
        self.data_bytes.set(as_i64(metrics.data_bytes));
        self.padding_bytes.set(as_i64(metrics.padding_overhead()));
        self.allocations.set(as_i64(metrics.allocation_count));
        self.heap_allocations.set(as_i64(metrics.on_heap_allocation_count));
        self.arena_used_bytes.observe(metrics.used_bytes as f64);
    }

    pub fn record_pool(&self, stats: &PoolStatsSnapshot) {
        self.pool_acquisitions.set(as_i64(stats.acquisitions));
        self.pool_releases.set(as_i64(stats.releases));
        self.pool_discards.set(as_i64(stats.discards));
        self.pool_fresh_regions.set(as_i64(stats.fresh_regions));
    }

    pub fn inc_clears(&self) {
        self.clears.inc();
    }

    /// Text exposition of every registered metric.
    pub fn gather_metrics(&self) -> prometheus::Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}
