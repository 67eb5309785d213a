//! ## arenakit-core::alloc::pool
//! **Reusable backing regions**
//!
//! Creating a region means allocating its first bucket. A [`RegionPool`]
//! keeps cleared regions around so that per-request arenas can start from
//! memory that is already there. Regions stay in the pool with their largest
//! bucket; the pool tracks how much capacity it holds and drops regions once
//! it holds too many or too much.

use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::config::ArenaOptions;
use crate::error::ArenaError;
use crate::ptr::Ptr;

use super::arena::Arena;
use super::identity::IdentitySource;
use super::region::Region;
use super::stats::PoolStats;
use super::{Allocator, Exclusive, Metrics};

/// Thread-safe store of retained-capacity regions.
pub struct RegionPool {
    regions: Mutex<Vec<Region>>,
    options: ArenaOptions,
    max_pooled: usize,
    max_retained_bytes: usize,
    retained_bytes: AtomicUsize,
    stats: PoolStats,
}

impl RegionPool {
    /// Creates an empty pool.
    ///
    /// # Arguments
    ///
    /// * `options` - Applied to every arena handed out; regions always retain
    ///   capacity on clear.
    /// * `max_pooled` - Upper bound on idle regions kept.
    /// * `max_retained_bytes` - Upper bound on the capacity of idle regions.
    pub fn new(
        options: ArenaOptions,
        max_pooled: usize,
        max_retained_bytes: usize,
    ) -> Result<Self, ArenaError> {
        options.validate()?;
        if max_pooled == 0 {
            return Err(ArenaError::InvalidArgument(
                "pool must keep at least one region".into(),
            ));
        }
        Ok(Self {
            regions: Mutex::new(Vec::with_capacity(max_pooled)),
            options: options.retain_capacity(true),
            max_pooled,
            max_retained_bytes,
            retained_bytes: AtomicUsize::new(0),
            stats: PoolStats::new(),
        })
    }

    /// Hands out an arena over a pooled region, or a fresh one if the pool
    /// is empty.
    pub fn acquire(&self) -> Result<PooledArena<'_>, ArenaError> {
        self.stats.increment_acquisitions();
        let pooled = self.regions.lock().pop();
        let region = match pooled {
            Some(region) => {
                self.retained_bytes
                    .fetch_sub(region.capacity(), Ordering::Relaxed);
                region
            }
            None => {
                self.stats.increment_fresh_regions();
                Region::configured(IdentitySource::from_entropy(), &self.options)
            }
        };
        let arena = Arena::with_region(region, self.options.clone())?;
        Ok(PooledArena { pool: self, arena })
    }

    fn release(&self, arena: Arena) {
        let Some(mut region) = arena.into_region() else {
            self.stats.increment_discards();
            return;
        };
        region.clear();
        let capacity = region.capacity();

        let mut regions = self.regions.lock();
        let retained = self.retained_bytes.load(Ordering::Relaxed);
        if regions.len() >= self.max_pooled
            || retained.saturating_add(capacity) > self.max_retained_bytes
        {
            tracing::warn!(capacity, retained, "pool full, dropping region");
            self.stats.increment_discards();
            return;
        }
        self.retained_bytes.fetch_add(capacity, Ordering::Relaxed);
        regions.push(region);
        self.stats.increment_releases();
    }

    /// Number of idle regions.
    pub fn len(&self) -> usize {
        self.regions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity held by idle regions.
    pub fn retained_bytes(&self) -> usize {
        self.retained_bytes.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    pub fn max_pooled(&self) -> usize {
        self.max_pooled
    }
}

/// Arena borrowed from a [`RegionPool`]; its region goes back on drop.
pub struct PooledArena<'pool> {
    pool: &'pool RegionPool,
    arena: Arena,
}

impl Deref for PooledArena<'_> {
    type Target = Arena;

    fn deref(&self) -> &Arena {
        &self.arena
    }
}

impl DerefMut for PooledArena<'_> {
    fn deref_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }
}

impl Allocator for PooledArena<'_> {
    fn alloc(&mut self, size: usize, align: usize) -> Result<Ptr, ArenaError> {
        self.arena.alloc(size, align)
    }

    fn current_offset(&mut self) -> Ptr {
        self.arena.current_offset()
    }

    fn contiguous_bytes(&self) -> usize {
        self.arena.contiguous_bytes()
    }

    fn resolve(&self, ptr: Ptr, len: usize) -> Result<NonNull<u8>, ArenaError> {
        self.arena.resolve(ptr, len)
    }

    fn metrics(&self) -> Metrics {
        self.arena.metrics()
    }

    fn identity(&self) -> u16 {
        self.arena.identity()
    }

    fn clear(&mut self) {
        self.arena.clear()
    }
}

// SAFETY: forwards to the arena it owns.
unsafe impl Exclusive for PooledArena<'_> {
    fn owns_memory(&self) -> bool {
        self.arena.owns_memory()
    }
}

impl Drop for PooledArena<'_> {
    fn drop(&mut self) {
        let arena = mem::take(&mut self.arena);
        self.pool.release(arena);
    }
}
