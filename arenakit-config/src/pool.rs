//! Region pool sizing.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// Idle regions kept for reuse.
    #[validate(range(min = 1, max = 4096))]
    pub max_pooled: usize,

    /// Total capacity idle regions may hold (bytes).
    #[validate(range(min = 1))]
    pub max_retained_bytes: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pooled: 16,
            max_retained_bytes: 64 * 1024 * 1024,
        }
    }
}
