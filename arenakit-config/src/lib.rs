//! # arenakit Configuration System
//!
//! Layered configuration for arena workloads.
//!
//! ## Features
//! - **Layering**: defaults, base YAML, environment YAML, `ARENAKIT_*` variables
//! - **Validation**: per-field ranges plus cross-section consistency checks
//! - **Core mapping**: converts into `arenakit_core::ArenaOptions`

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod arena;
mod error;
mod pool;
mod telemetry;
pub mod validation;

pub use arena::ArenaConfig;
pub use error::ConfigError;
pub use pool::PoolConfig;
pub use telemetry::TelemetryConfig;

/// Directory searched by [`ArenaKitConfig::load`].
pub const CONFIG_DIR: &str = "config";

const ENV_PREFIX: &str = "ARENAKIT_";

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq)]
#[serde(default)]
pub struct ArenaKitConfig {
    /// Per-arena construction settings.
    #[validate(nested)]
    pub arena: ArenaConfig,

    /// Region pool sizing.
    #[validate(nested)]
    pub pool: PoolConfig,

    /// Logging and metrics export.
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl ArenaKitConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/arenakit.yaml` - base settings, skipped when missing
    /// 3. `config/<ARENAKIT_ENV>.yaml` - environment overrides (default `development`)
    /// 4. `ARENAKIT_*` environment variables, nested with `__`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_dir(CONFIG_DIR)
    }

    /// Same as [`ArenaKitConfig::load`] with the YAML files taken from `dir`.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let base = dir.join("arenakit.yaml");
        if base.exists() {
            figment = figment.merge(Yaml::file(&base));
        } else {
            tracing::info!(path = %base.display(), "base config not found, using defaults");
        }

        let env = std::env::var("ARENAKIT_ENV").unwrap_or_else(|_| "development".into());
        let env_file = dir.join(format!("{env}.yaml"));
        if env_file.exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::finish(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load configuration from one file, then environment variables.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Self::finish(
            Figment::from(Serialized::defaults(Self::default()))
                .merge(Yaml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    /// Parse a YAML document over the defaults; the environment is ignored.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::finish(Figment::from(Serialized::defaults(Self::default())).merge(Yaml::string(yaml)))
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate_all()?;
        Ok(config)
    }

    /// Field validation followed by the consistency checks.
    pub fn validate_all(&self) -> Result<(), ConfigError> {
        self.validate()?;
        validation::check_consistency(self)
    }
}
