//! ## arenakit-core::alloc::fixed
//! **Single pre-sized bucket**
//!
//! A [`FixedBlock`] never grows. It is the leaf to use when a hard upper
//! bound on memory is wanted.

use std::ptr::NonNull;

use crate::error::ArenaError;
use crate::ptr::Ptr;

use super::bucket::Bucket;
use super::identity::IdentitySource;
use super::{check_align, Allocator, Exclusive, Metrics};

pub struct FixedBlock {
    bucket: Bucket,
    id: u16,
    ids: IdentitySource,
    data_bytes: usize,
    allocation_count: usize,
}

impl FixedBlock {
    /// Creates a block of exactly `capacity` bytes.
    pub fn new(capacity: usize) -> Result<Self, ArenaError> {
        Self::build(capacity, IdentitySource::from_entropy())
    }

    /// Same as [`FixedBlock::new`] with a deterministic identity sequence.
    pub fn with_seed(capacity: usize, seed: u64) -> Result<Self, ArenaError> {
        Self::build(capacity, IdentitySource::seeded(seed))
    }

    fn build(capacity: usize, mut ids: IdentitySource) -> Result<Self, ArenaError> {
        Bucket::check_capacity(capacity)?;
        let id = ids.root(0);
        Ok(Self {
            bucket: Bucket::new(capacity),
            id,
            ids,
            data_bytes: 0,
            allocation_count: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.bucket.capacity()
    }

    pub fn remaining(&self) -> usize {
        self.bucket.remaining()
    }
}

impl Allocator for FixedBlock {
    fn alloc(&mut self, size: usize, align: usize) -> Result<Ptr, ArenaError> {
        check_align(align)?;
        let Some(start) = self.bucket.try_bump(size, align) else {
            return Err(ArenaError::LimitExceeded {
                requested: self.bucket.footprint(size, align).unwrap_or(usize::MAX),
                available: self.bucket.remaining(),
            });
        };
        self.data_bytes += size;
        self.allocation_count += 1;
        // The bucket never exceeds the 32-bit offset space.
        Ok(Ptr::new(start as u32, 0, self.id))
    }

    fn current_offset(&mut self) -> Ptr {
        Ptr::new(self.bucket.offset() as u32, 0, self.id)
    }

    fn contiguous_bytes(&self) -> usize {
        self.bucket.remaining()
    }

    fn resolve(&self, ptr: Ptr, len: usize) -> Result<NonNull<u8>, ArenaError> {
        if ptr.arena() != self.id {
            tracing::error!(expected = self.id, found = ptr.arena(), "foreign pointer");
            return Err(ArenaError::ForeignPointer {
                expected: self.id,
                found: ptr.arena(),
            });
        }
        if ptr.bucket() != 0 {
            return Err(ArenaError::OutOfBounds { ptr, len });
        }
        self.bucket
            .address(ptr.offset() as usize, len)
            .ok_or(ArenaError::OutOfBounds { ptr, len })
    }

    fn metrics(&self) -> Metrics {
        let capacity = self.bucket.capacity();
        Metrics {
            used_bytes: self.bucket.offset(),
            available_bytes: self.bucket.remaining(),
            allocated_bytes: capacity,
            max_capacity: capacity,
            on_heap_allocation_count: usize::from(capacity > 0),
            data_bytes: self.data_bytes,
            allocation_count: self.allocation_count,
        }
    }

    fn identity(&self) -> u16 {
        self.id
    }

    fn clear(&mut self) {
        self.bucket.reset();
        self.data_bytes = 0;
        self.allocation_count = 0;
        self.id = self.ids.root(self.id);
        tracing::trace!(id = self.id, "fixed block cleared");
    }
}

// SAFETY: the bucket lives as long as the block.
unsafe impl Exclusive for FixedBlock {}
