//! Backing storage for fixed blocks and regions.
//!
//! A bucket is one heap allocation that never moves or changes size for its
//! whole life. The bump offset is the only mutable state.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::ArenaError;
use crate::ptr::{BUCKET_ALIGN, MAX_BUCKET_SIZE};

use super::padding;

pub(crate) struct Bucket {
    data: NonNull<u8>,
    capacity: usize,
    offset: usize,
}

impl Bucket {
    /// Callers bound `capacity` by [`MAX_BUCKET_SIZE`] first.
    pub(crate) fn new(capacity: usize) -> Self {
        if capacity == 0 {
            return Self {
                data: NonNull::dangling(),
                capacity,
                offset: 0,
            };
        }

        let layout = Self::layout(capacity);
        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let data = match NonNull::new(raw) {
            Some(data) => data,
            None => alloc::handle_alloc_error(layout),
        };

        Self {
            data,
            capacity,
            offset: 0,
        }
    }

    fn layout(capacity: usize) -> Layout {
        match Layout::from_size_align(capacity, BUCKET_ALIGN) {
            Ok(layout) => layout,
            Err(_) => panic!("bucket capacity overflow: {capacity} bytes"),
        }
    }

    /// Rejects capacities a bucket cannot have.
    pub(crate) fn check_capacity(capacity: usize) -> Result<(), ArenaError> {
        if capacity > MAX_BUCKET_SIZE {
            return Err(ArenaError::AddressSpaceExhausted {
                requested: capacity,
            });
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.capacity - self.offset
    }

    /// Bytes needed for `size` at `align` from the current offset, padding
    /// included.
    #[inline]
    pub(crate) fn footprint(&self, size: usize, align: usize) -> Option<usize> {
        size.checked_add(padding(self.offset, align))
    }

    /// Bumps the offset and returns where the allocation starts, or `None`
    /// without touching anything when it does not fit.
    pub(crate) fn try_bump(&mut self, size: usize, align: usize) -> Option<usize> {
        let needed = self.footprint(size, align)?;
        if needed > self.remaining() {
            return None;
        }
        let start = self.offset + padding(self.offset, align);
        self.offset += needed;
        Some(start)
    }

    /// Address of `offset`, provided `offset..offset + len` lies inside the
    /// bucket.
    #[inline]
    pub(crate) fn address(&self, offset: usize, len: usize) -> Option<NonNull<u8>> {
        let end = offset.checked_add(len)?;
        if end > self.capacity {
            return None;
        }
        // SAFETY: offset is within the allocation (or equals its end).
        Some(unsafe { NonNull::new_unchecked(self.data.as_ptr().add(offset)) })
    }

    pub(crate) fn reset(&mut self) {
        self.offset = 0;
    }
}

impl Drop for Bucket {
    fn drop(&mut self) {
        if self.capacity == 0 {
            return;
        }
        // SAFETY: allocated in `new` with the same layout.
        unsafe { alloc::dealloc(self.data.as_ptr(), Self::layout(self.capacity)) }
    }
}

// SAFETY: a bucket exclusively owns its allocation, like a `Box<[u8]>`.
unsafe impl Send for Bucket {}
