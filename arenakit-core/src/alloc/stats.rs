//! ## arenakit-core::alloc::stats
//! **Region pool statistics**
//!
//! Counters for [`super::pool::RegionPool`]. The pool is shared between
//! threads, so the counters are atomics.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Running counters of a region pool.
#[derive(Debug, Default)]
pub struct PoolStats {
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
    discards: AtomicUsize,
    fresh_regions: AtomicUsize,
}

/// Plain copy of [`PoolStats`] at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStatsSnapshot {
    pub acquisitions: usize,
    pub releases: usize,
    pub discards: usize,
    pub fresh_regions: usize,
}

impl PoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_acquisitions(&self) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_releases(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// A region was dropped instead of being returned to the pool.
    #[inline]
    pub fn increment_discards(&self) {
        self.discards.fetch_add(1, Ordering::Relaxed);
    }

    /// The pool was empty and a new region had to be created.
    #[inline]
    pub fn increment_fresh_regions(&self) {
        self.fresh_regions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::Relaxed)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::Relaxed)
    }

    pub fn discards(&self) -> usize {
        self.discards.load(Ordering::Relaxed)
    }

    pub fn fresh_regions(&self) -> usize {
        self.fresh_regions.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            acquisitions: self.acquisitions(),
            releases: self.releases(),
            discards: self.discards(),
            fresh_regions: self.fresh_regions(),
        }
    }
}
