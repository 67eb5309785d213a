use arenakit_config::ConfigError;
use arenakit_core::ArenaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Arena error: {0}")]
    Arena(#[from] ArenaError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Could not render configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
