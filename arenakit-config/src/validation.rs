//! Custom validation functions for configuration.
//!
//! Field-level checks plugged into `#[validate(custom(...))]`, and the
//! cross-section consistency check run after extraction.

use validator::ValidationError;

use crate::{ArenaKitConfig, ConfigError};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a `tracing` level name.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    if LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

/// Validate a Prometheus metric namespace (`[a-zA-Z_][a-zA-Z0-9_]*`).
pub fn validate_metric_namespace(namespace: &str) -> Result<(), ValidationError> {
    let mut chars = namespace.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_metric_namespace"))
    }
}

/// Checks constraints spanning several fields or sections.
pub fn check_consistency(config: &ArenaKitConfig) -> Result<(), ConfigError> {
    let arena = &config.arena;
    if let Some(limit) = arena.allocation_limit {
        if arena.initial_capacity > limit {
            return Err(ConfigError::Inconsistent(format!(
                "arena.initial_capacity ({}) exceeds arena.allocation_limit ({})",
                arena.initial_capacity, limit
            )));
        }
    }
    if arena.initial_capacity > config.pool.max_retained_bytes {
        return Err(ConfigError::Inconsistent(format!(
            "pool.max_retained_bytes ({}) cannot hold one region of arena.initial_capacity ({})",
            config.pool.max_retained_bytes, arena.initial_capacity
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_levels() {
        assert!(validate_log_level("info").is_ok());
        assert!(validate_log_level("WARN").is_ok());
        assert!(validate_log_level("verbose").is_err());
    }

    #[test]
    fn metric_namespaces() {
        assert!(validate_metric_namespace("arenakit").is_ok());
        assert!(validate_metric_namespace("_arena_2").is_ok());
        assert!(validate_metric_namespace("2arena").is_err());
        assert!(validate_metric_namespace("arena-kit").is_err());
        assert!(validate_metric_namespace("").is_err());
    }

    #[test]
    fn initial_capacity_within_limit() {
        let mut config = ArenaKitConfig::default();
        config.arena.initial_capacity = 4096;
        config.arena.allocation_limit = Some(1024);
        assert!(matches!(
            check_consistency(&config),
            Err(ConfigError::Inconsistent(_))
        ));

        config.arena.allocation_limit = Some(4096);
        assert!(check_consistency(&config).is_ok());
    }

    #[test]
    fn pool_holds_one_region() {
        let mut config = ArenaKitConfig::default();
        config.arena.initial_capacity = 1 << 20;
        config.pool.max_retained_bytes = 1 << 10;
        assert!(check_consistency(&config).is_err());
    }
}
