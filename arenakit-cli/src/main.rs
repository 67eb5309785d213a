//! ## arenakit-cli
//! **Workload driver for arena allocators**
//!
//! `arenakit run` pushes a request-scoped workload through pooled arenas and
//! stream buffers, then prints a summary and optionally Prometheus text.
//! `arenakit config` prints the effective layered configuration.

use clap::Parser;

mod commands;
mod error;

use commands::Cli;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    commands::execute(cli)?;
    Ok(())
}
