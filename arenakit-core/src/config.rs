//! Arena construction options.
//!
//! Loading these from files or the environment is the job of
//! `arenakit-config`; this module only holds the validated values.

use crate::alloc::region::DEFAULT_FIRST_BUCKET_SIZE;
use crate::error::ArenaError;
use crate::ptr::MAX_BUCKET_SIZE;

/// How an [`crate::Arena`] is set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaOptions {
    /// Bytes to preallocate as the first bucket of the arena's own region.
    pub initial_capacity: usize,

    /// Budget on the bytes the arena may consume, padding included.
    pub allocation_limit: Option<usize>,

    /// Minimum size of every bucket of the arena's own region.
    pub first_bucket_size: usize,

    /// Keep the largest bucket of the own region across clears.
    pub retain_capacity: bool,

    /// Seed for identity tags; random when absent.
    pub seed: Option<u64>,
}

impl Default for ArenaOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            allocation_limit: None,
            first_bucket_size: DEFAULT_FIRST_BUCKET_SIZE,
            retain_capacity: false,
            seed: None,
        }
    }
}

impl ArenaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }

    pub fn allocation_limit(mut self, bytes: usize) -> Self {
        self.allocation_limit = Some(bytes);
        self
    }

    pub fn first_bucket_size(mut self, bytes: usize) -> Self {
        self.first_bucket_size = bytes;
        self
    }

    pub fn retain_capacity(mut self, retain: bool) -> Self {
        self.retain_capacity = retain;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates option values against each other and the address space.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.first_bucket_size == 0 || self.first_bucket_size > MAX_BUCKET_SIZE {
            return Err(ArenaError::InvalidArgument(format!(
                "first bucket size {} outside 1..={}",
                self.first_bucket_size, MAX_BUCKET_SIZE
            )));
        }
        if self.initial_capacity > MAX_BUCKET_SIZE {
            return Err(ArenaError::InvalidArgument(format!(
                "initial capacity {} exceeds the bucket limit {}",
                self.initial_capacity, MAX_BUCKET_SIZE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ArenaOptions::default()
            .validate()
            .expect("defaults should validate");
    }

    #[test]
    fn builder_sets_fields() {
        let options = ArenaOptions::new()
            .initial_capacity(4096)
            .allocation_limit(1 << 20)
            .first_bucket_size(1024)
            .retain_capacity(true)
            .seed(9);
        assert_eq!(options.initial_capacity, 4096);
        assert_eq!(options.allocation_limit, Some(1 << 20));
        assert_eq!(options.first_bucket_size, 1024);
        assert!(options.retain_capacity);
        assert_eq!(options.seed, Some(9));
    }

    #[test]
    fn rejects_zero_bucket_size() {
        assert!(matches!(
            ArenaOptions::new().first_bucket_size(0).validate(),
            Err(ArenaError::InvalidArgument(_))
        ));
    }
}
