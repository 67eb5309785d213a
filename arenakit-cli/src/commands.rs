use std::path::{Path, PathBuf};

use arenakit_bytes::{embed_str, Buffer};
use arenakit_config::ArenaKitConfig;
use arenakit_core::alloc::stats::PoolStatsSnapshot;
use arenakit_core::{Allocator, AllocatorExt, ArenaError, Exclusive, Metrics, RegionPool};
use arenakit_telemetry::{ArenaLogger, MetricsRecorder};
use clap::{Args, Parser, Subcommand};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "arenakit", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drive a request-scoped workload through pooled arenas
    Run(RunArgs),
    /// Print the effective configuration as YAML
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Number of requests to simulate
    #[arg(long, default_value_t = 1000)]
    pub requests: usize,
    /// Payload bytes written per request
    #[arg(long, default_value_t = 512)]
    pub payload_size: usize,
    /// Per-arena byte budget, overriding the configuration
    #[arg(long)]
    pub limit: Option<usize>,
    /// Seed for payloads and identity tags
    #[arg(long)]
    pub seed: Option<u64>,
    /// Configuration file; without it `config/` is layered with the environment
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Print Prometheus metrics after the run
    #[arg(long)]
    pub prometheus: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration file; without it `config/` is layered with the environment
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Folds command-line overrides into `config`.
    pub fn apply(&self, config: &mut ArenaKitConfig) -> Result<(), CliError> {
        if let Some(limit) = self.limit {
            config.arena.allocation_limit = Some(limit);
        }
        if let Some(seed) = self.seed {
            config.arena.seed = Some(seed);
        }
        config.telemetry.prometheus |= self.prometheus;
        config.validate_all()?;
        Ok(())
    }
}

/// Outcome of [`run_workload`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadSummary {
    pub requests: usize,
    pub rejected: usize,
    pub data_bytes: usize,
    pub peak_used_bytes: usize,
    pub heap_allocations: usize,
    pub pool: PoolStatsSnapshot,
}

pub fn load_config(path: Option<&Path>) -> Result<ArenaKitConfig, CliError> {
    let config = match path {
        Some(path) => ArenaKitConfig::load_from_path(path)?,
        None => ArenaKitConfig::load()?,
    };
    Ok(config)
}

pub fn execute(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Run(args) => {
            let mut config = load_config(args.config.as_deref())?;
            args.apply(&mut config)?;
            init_logging(&config);

            let recorder = MetricsRecorder::new(&config.telemetry.metrics_namespace)?;
            let summary = run_workload(args.requests, args.payload_size, &config, &recorder)?;
            println!(
                "requests={} rejected={} data_bytes={} peak_used_bytes={} heap_allocations={}",
                summary.requests,
                summary.rejected,
                summary.data_bytes,
                summary.peak_used_bytes,
                summary.heap_allocations,
            );
            println!(
                "fresh_regions={} discards={}",
                summary.pool.fresh_regions, summary.pool.discards,
            );
            if config.telemetry.prometheus {
                print!("{}", recorder.gather_metrics()?);
            }
        }
        Commands::Config(args) => {
            let config = load_config(args.config.as_deref())?;
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }
    Ok(())
}

fn init_logging(config: &ArenaKitConfig) {
    if let Err(err) = ArenaLogger::init(&config.telemetry.log_level) {
        eprintln!("logging disabled: {err}");
    }
}

/// Runs `requests` requests, each in its own pooled arena.
///
/// Requests that hit the arena budget are counted as rejected; any other
/// arena error aborts the run.
pub fn run_workload(
    requests: usize,
    payload_size: usize,
    config: &ArenaKitConfig,
    recorder: &MetricsRecorder,
) -> Result<WorkloadSummary, CliError> {
    let pool = RegionPool::new(
        config.arena.options(),
        config.pool.max_pooled,
        config.pool.max_retained_bytes,
    )?;
    let mut rng = match config.arena.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_rng(&mut rand::rng()),
    };

    let mut summary = WorkloadSummary {
        requests,
        ..WorkloadSummary::default()
    };
    let mut payload = vec![0u8; payload_size];
    let mut last = Metrics::default();

    for request in 0..requests {
        rng.fill(&mut payload[..]);
        let mut arena = pool.acquire()?;
        match handle_request(&mut *arena, request, &payload) {
            Ok(_) => {}
            Err(err) if err.is_limit() => {
                tracing::warn!(request, %err, "request rejected");
                summary.rejected += 1;
            }
            Err(err) => return Err(err.into()),
        }

        last = arena.metrics();
        recorder.record(&last);
        summary.data_bytes += last.data_bytes;
        summary.peak_used_bytes = summary.peak_used_bytes.max(last.used_bytes);
        summary.heap_allocations += last.on_heap_allocation_count;

        drop(arena);
        recorder.inc_clears();
    }

    summary.pool = pool.stats().snapshot();
    recorder.record_pool(&summary.pool);
    ArenaLogger::log_metrics("last request", &last);
    tracing::info!(
        requests = summary.requests,
        rejected = summary.rejected,
        pooled = pool.len(),
        retained = pool.retained_bytes(),
        "workload finished"
    );
    Ok(summary)
}

/// One request: a key, a fixed header and a body built through a buffer.
///
/// Returns the body length.
pub fn handle_request<A: Exclusive>(
    arena: &mut A,
    request: usize,
    payload: &[u8],
) -> Result<usize, ArenaError> {
    let key = embed_str(arena, &format!("req-{request:06}"))?;
    let header = arena.put((request as u64, payload.len() as u64))?;

    let mut body = Buffer::new(&mut *arena);
    body.write_str("payload:")?;
    body.write(payload)?;
    let (_, body) = body.into_parts();

    // SAFETY: `header` was written with the same tuple type above.
    let (id, len) = unsafe { arena.read_value::<(u64, u64)>(header)? };
    let echoed = body.as_slice(&*arena)?;
    if id != request as u64 || len as usize + 8 != echoed.len() || &echoed[8..] != payload {
        tracing::error!(request, key = key.as_str(&*arena)?, "request body corrupted");
    }
    Ok(echoed.len())
}
