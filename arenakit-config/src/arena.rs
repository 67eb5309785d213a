//! Arena construction parameters.

use arenakit_core::ArenaOptions;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Largest bucket a region may hold.
const MAX_BUCKET_BYTES: usize = u32::MAX as usize;

/// Settings applied to every arena the workload creates.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[serde(default)]
pub struct ArenaConfig {
    /// Bytes preallocated as the first bucket (0 = lazy).
    #[validate(range(max = 4294967295usize))]
    pub initial_capacity: usize,

    /// Per-arena byte budget, padding included.
    #[validate(range(min = 1))]
    pub allocation_limit: Option<usize>,

    /// Minimum size of every growth bucket.
    #[validate(range(min = 64, max = 4294967295usize))]
    pub first_bucket_size: usize,

    /// Keep the largest bucket across clears.
    pub retain_capacity: bool,

    /// Fixed seed for identity tags, for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            allocation_limit: None,
            first_bucket_size: 64 * 1024,
            retain_capacity: false,
            seed: None,
        }
    }
}

impl ArenaConfig {
    /// Core options for this configuration.
    pub fn options(&self) -> ArenaOptions {
        let mut options = ArenaOptions::new()
            .initial_capacity(self.initial_capacity.min(MAX_BUCKET_BYTES))
            .first_bucket_size(self.first_bucket_size)
            .retain_capacity(self.retain_capacity);
        if let Some(limit) = self.allocation_limit {
            options = options.allocation_limit(limit);
        }
        if let Some(seed) = self.seed {
            options = options.seed(seed);
        }
        options
    }
}
