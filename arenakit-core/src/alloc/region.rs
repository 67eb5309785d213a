//! ## arenakit-core::alloc::region
//! **Growable chain of doubling buckets**
//!
//! ```text
//!   history (retired)                          active
//!   ┌────────┐ ┌────────────────┐ ┌────────────────────────────────┐
//!   │ 64 KiB │ │    128 KiB     │ │ 256 KiB     ▲ offset           │
//!   └────────┘ └────────────────┘ └─────────────┴──────────────────┘
//!    bucket 0      bucket 1          bucket 2
//! ```
//!
//! When a request does not fit the active bucket, the bucket is retired and a
//! new one of `max(2 × previous, 2 × request, first bucket size)` bytes takes
//! its place. The unused tail of the retired bucket is never handed out.

use std::ptr::NonNull;

use crate::config::ArenaOptions;
use crate::error::ArenaError;
use crate::ptr::{Ptr, MAX_BUCKETS, MAX_BUCKET_SIZE};

use super::bucket::Bucket;
use super::identity::IdentitySource;
use super::{check_align, Allocator, Exclusive, Metrics};

/// Size of the first bucket unless configured otherwise.
pub const DEFAULT_FIRST_BUCKET_SIZE: usize = 64 * 1024;

pub struct Region {
    history: Vec<Bucket>,
    active: Option<Bucket>,
    first_bucket_size: usize,
    retain_capacity: bool,
    id: u16,
    ids: IdentitySource,
    allocated_bytes: usize,
    data_bytes: usize,
    allocation_count: usize,
}

impl Region {
    /// Creates an empty region; the first bucket appears on first use.
    pub fn new() -> Self {
        Self::from_source(IdentitySource::from_entropy())
    }

    /// Same as [`Region::new`] with a deterministic identity sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_source(IdentitySource::seeded(seed))
    }

    pub(crate) fn from_source(mut ids: IdentitySource) -> Self {
        let id = ids.root(0);
        Self {
            history: Vec::new(),
            active: None,
            first_bucket_size: DEFAULT_FIRST_BUCKET_SIZE,
            retain_capacity: false,
            id,
            ids,
            allocated_bytes: 0,
            data_bytes: 0,
            allocation_count: 0,
        }
    }

    /// Region set up from already validated arena options.
    pub(crate) fn configured(ids: IdentitySource, options: &ArenaOptions) -> Self {
        let mut region = Self::from_source(ids);
        region.first_bucket_size = options.first_bucket_size;
        region.retain_capacity = options.retain_capacity;
        if options.initial_capacity > 0 {
            region.install(Bucket::new(options.initial_capacity));
        }
        region
    }

    /// Creates a region whose first bucket of exactly `capacity` bytes is
    /// allocated right away.
    pub fn with_capacity(capacity: usize) -> Result<Self, ArenaError> {
        Self::new().preallocated(capacity)
    }

    /// Sets the minimum bucket size used for growth.
    pub fn first_bucket_size(mut self, size: usize) -> Result<Self, ArenaError> {
        if size == 0 {
            return Err(ArenaError::InvalidArgument(
                "first bucket size must be positive".into(),
            ));
        }
        Bucket::check_capacity(size)?;
        self.first_bucket_size = size;
        Ok(self)
    }

    /// Whether [`Allocator::clear`] keeps the largest bucket for reuse.
    pub fn retain_capacity(mut self, retain: bool) -> Self {
        self.retain_capacity = retain;
        self
    }

    /// Materializes the first bucket with exactly `capacity` bytes.
    ///
    /// Does nothing once a bucket exists.
    pub fn preallocated(mut self, capacity: usize) -> Result<Self, ArenaError> {
        Bucket::check_capacity(capacity)?;
        if self.active.is_none() && self.history.is_empty() && capacity > 0 {
            self.install(Bucket::new(capacity));
        }
        Ok(self)
    }

    /// Number of buckets currently held.
    pub fn bucket_count(&self) -> usize {
        self.history.len() + usize::from(self.active.is_some())
    }

    /// Capacity held by the region right now.
    pub fn capacity(&self) -> usize {
        self.allocated_bytes
    }

    fn active_index(&self) -> u8 {
        // Growth refuses to create more than MAX_BUCKETS buckets.
        self.history.len() as u8
    }

    fn install(&mut self, bucket: Bucket) {
        if let Some(retired) = self.active.take() {
            self.history.push(retired);
        }
        self.allocated_bytes += bucket.capacity();
        tracing::debug!(
            region = self.id,
            bucket = self.history.len(),
            size = bucket.capacity(),
            "region grew"
        );
        self.active = Some(bucket);
    }

    /// Size of the bucket that has to be created to hold `needed` bytes.
    fn next_bucket_size(&self, needed: usize) -> Result<usize, ArenaError> {
        if needed > MAX_BUCKET_SIZE || self.bucket_count() >= MAX_BUCKETS {
            return Err(ArenaError::AddressSpaceExhausted { requested: needed });
        }
        let previous = self.active.as_ref().map_or(0, Bucket::capacity);
        let size = previous
            .saturating_mul(2)
            .max(needed.saturating_mul(2))
            .max(self.first_bucket_size);
        Ok(size.min(MAX_BUCKET_SIZE))
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator for Region {
    fn alloc(&mut self, size: usize, align: usize) -> Result<Ptr, ArenaError> {
        check_align(align)?;
        let index = self.active_index();
        let needed = match self.active.as_mut() {
            Some(active) => {
                if let Some(start) = active.try_bump(size, align) {
                    self.data_bytes += size;
                    self.allocation_count += 1;
                    return Ok(Ptr::new(start as u32, index, self.id));
                }
                active.footprint(size, align).unwrap_or(usize::MAX)
            }
            None => size,
        };

        let bucket_size = self.next_bucket_size(needed)?;
        self.install(Bucket::new(bucket_size));

        let index = self.active_index();
        let start = match self.active.as_mut().and_then(|b| b.try_bump(size, align)) {
            Some(start) => start,
            None => return Err(ArenaError::AddressSpaceExhausted { requested: needed }),
        };
        self.data_bytes += size;
        self.allocation_count += 1;
        Ok(Ptr::new(start as u32, index, self.id))
    }

    fn current_offset(&mut self) -> Ptr {
        let offset = self.active.as_ref().map_or(0, Bucket::offset);
        Ptr::new(offset as u32, self.active_index(), self.id)
    }

    fn contiguous_bytes(&self) -> usize {
        self.active.as_ref().map_or(0, Bucket::remaining)
    }

    fn resolve(&self, ptr: Ptr, len: usize) -> Result<NonNull<u8>, ArenaError> {
        if ptr.arena() != self.id {
            tracing::error!(expected = self.id, found = ptr.arena(), "foreign pointer");
            return Err(ArenaError::ForeignPointer {
                expected: self.id,
                found: ptr.arena(),
            });
        }
        let index = ptr.bucket() as usize;
        let bucket = if index == self.history.len() {
            self.active.as_ref()
        } else {
            self.history.get(index)
        };
        bucket
            .and_then(|b| b.address(ptr.offset() as usize, len))
            .ok_or(ArenaError::OutOfBounds { ptr, len })
    }

    fn metrics(&self) -> Metrics {
        let remaining = self.active.as_ref().map_or(0, Bucket::remaining);
        let used = self.allocated_bytes - remaining;
        let spare_buckets = MAX_BUCKETS - self.bucket_count();
        let max_capacity = self
            .allocated_bytes
            .saturating_add(spare_buckets.saturating_mul(MAX_BUCKET_SIZE));
        Metrics {
            used_bytes: used,
            available_bytes: max_capacity - used,
            allocated_bytes: self.allocated_bytes,
            max_capacity,
            on_heap_allocation_count: self.bucket_count(),
            data_bytes: self.data_bytes,
            allocation_count: self.allocation_count,
        }
    }

    fn identity(&self) -> u16 {
        self.id
    }

    fn clear(&mut self) {
        self.history.clear();
        let retained = match self.active.as_mut() {
            Some(active) if self.retain_capacity => {
                active.reset();
                Some(active.capacity())
            }
            _ => None,
        };
        match retained {
            Some(capacity) => self.allocated_bytes = capacity,
            None => {
                self.active = None;
                self.allocated_bytes = 0;
            }
        }
        self.data_bytes = 0;
        self.allocation_count = 0;
        self.id = self.ids.root(self.id);
        tracing::trace!(region = self.id, retained = self.allocated_bytes, "region cleared");
    }
}

// SAFETY: buckets are only dropped by `clear` and `Drop`.
unsafe impl Exclusive for Region {}
