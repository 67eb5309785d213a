//! ## arenakit-core::alloc
//! **Bump allocators, regions and budgeted sub-arenas**
//!
//! ### Key Submodules:
//! - `fixed`: single pre-sized bucket, fails when exhausted
//! - `region`: chain of doubling buckets, grows on overflow
//! - `arena`: identity-tagged facade with byte budget and metrics
//! - `pool`: retained-capacity regions reused across arenas
//! - `metrics` / `stats`: usage snapshots and pool counters
//!
//! Every allocator speaks the [`Allocator`] contract, so arenas can be layered
//! over regions, fixed blocks or other arenas.

pub mod arena;
mod bucket;
pub mod fixed;
mod identity;
pub mod metrics;
pub mod pool;
pub mod region;
pub mod stats;

use std::cell::RefCell;
use std::mem;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::error::ArenaError;
use crate::ptr::Ptr;

pub use metrics::Metrics;

/// An allocator shared between several arenas.
pub type SharedAllocator = Rc<RefCell<dyn Allocator>>;

/// Wraps an allocator so that arenas can share it.
pub fn shared<A: Allocator + 'static>(allocator: A) -> SharedAllocator {
    Rc::new(RefCell::new(allocator))
}

/// Bytes to skip from `offset` so the next allocation is `align`-aligned.
#[inline]
pub fn padding(offset: usize, align: usize) -> usize {
    (align - offset % align) % align
}

#[inline]
pub(crate) fn check_align(align: usize) -> Result<(), ArenaError> {
    if align == 0 {
        return Err(ArenaError::InvalidArgument(
            "alignment must be at least 1".into(),
        ));
    }
    Ok(())
}

/// The allocation contract shared by every layer.
///
/// Implementations are single-threaded. Failed allocations leave the
/// allocator exactly as it was.
pub trait Allocator {
    /// Reserves `size` bytes aligned to `align` and returns their handle.
    fn alloc(&mut self, size: usize, align: usize) -> Result<Ptr, ArenaError>;

    /// Where the next unpadded allocation would start.
    fn current_offset(&mut self) -> Ptr;

    /// Bytes an `alloc(n, 1)` can take right at the cursor, without opening
    /// a new bucket and within every budget on the way down.
    fn contiguous_bytes(&self) -> usize;

    /// Materializes the address of `ptr`, checking that `len` bytes from it
    /// belong to this allocator.
    ///
    /// Fails with a fatal error when `ptr` was issued by another allocator
    /// or before the last [`Allocator::clear`].
    fn resolve(&self, ptr: Ptr, len: usize) -> Result<NonNull<u8>, ArenaError>;

    /// Address of `ptr`.
    fn to_ref(&self, ptr: Ptr) -> Result<NonNull<u8>, ArenaError> {
        self.resolve(ptr, 0)
    }

    fn metrics(&self) -> Metrics;

    /// Identity tag stamped into the pointers this allocator issues.
    fn identity(&self) -> u16;

    /// Forgets every allocation and rolls a new identity.
    fn clear(&mut self);
}

impl<A: Allocator + ?Sized> Allocator for &mut A {
    fn alloc(&mut self, size: usize, align: usize) -> Result<Ptr, ArenaError> {
        (**self).alloc(size, align)
    }

    fn current_offset(&mut self) -> Ptr {
        (**self).current_offset()
    }

    fn contiguous_bytes(&self) -> usize {
        (**self).contiguous_bytes()
    }

    fn resolve(&self, ptr: Ptr, len: usize) -> Result<NonNull<u8>, ArenaError> {
        (**self).resolve(ptr, len)
    }

    fn metrics(&self) -> Metrics {
        (**self).metrics()
    }

    fn identity(&self) -> u16 {
        (**self).identity()
    }

    fn clear(&mut self) {
        (**self).clear()
    }
}

impl<A: Allocator + ?Sized> Allocator for Box<A> {
    fn alloc(&mut self, size: usize, align: usize) -> Result<Ptr, ArenaError> {
        (**self).alloc(size, align)
    }

    fn current_offset(&mut self) -> Ptr {
        (**self).current_offset()
    }

    fn contiguous_bytes(&self) -> usize {
        (**self).contiguous_bytes()
    }

    fn resolve(&self, ptr: Ptr, len: usize) -> Result<NonNull<u8>, ArenaError> {
        (**self).resolve(ptr, len)
    }

    fn metrics(&self) -> Metrics {
        (**self).metrics()
    }

    fn identity(&self) -> u16 {
        (**self).identity()
    }

    fn clear(&mut self) {
        (**self).clear()
    }
}

impl<A: Allocator + ?Sized> Allocator for Rc<RefCell<A>> {
    fn alloc(&mut self, size: usize, align: usize) -> Result<Ptr, ArenaError> {
        self.borrow_mut().alloc(size, align)
    }

    fn current_offset(&mut self) -> Ptr {
        self.borrow_mut().current_offset()
    }

    fn contiguous_bytes(&self) -> usize {
        self.borrow().contiguous_bytes()
    }

    fn resolve(&self, ptr: Ptr, len: usize) -> Result<NonNull<u8>, ArenaError> {
        self.borrow().resolve(ptr, len)
    }

    fn metrics(&self) -> Metrics {
        self.borrow().metrics()
    }

    fn identity(&self) -> u16 {
        self.borrow().identity()
    }

    fn clear(&mut self) {
        self.borrow_mut().clear()
    }
}

/// Allocators whose memory can only be released through `&mut self`.
///
/// Zero-copy views hand out slices that live as long as a shared borrow of
/// the allocator, so they are limited to these. A shared handle such as
/// [`SharedAllocator`] never qualifies: any clone of it can `clear` the
/// allocator while the view is alive.
///
/// ```compile_fail
/// use arenakit_core::alloc::Exclusive;
/// use arenakit_core::{shared, Region};
///
/// fn view_source<A: Exclusive>(_: &A) {}
/// view_source(&shared(Region::new()));
/// ```
///
/// # Safety
///
/// While [`Exclusive::owns_memory`] returns `true`, every address returned
/// by [`Allocator::resolve`] must stay allocated for as long as the shared
/// borrow of `self` it was resolved through.
pub unsafe trait Exclusive: Allocator {
    /// Whether the memory behind `self` belongs to `self` alone. Arenas
    /// layered over a shared parent return `false`.
    fn owns_memory(&self) -> bool {
        true
    }
}

// SAFETY: the exclusive borrow keeps every other path to `A` out.
unsafe impl<A: Exclusive + ?Sized> Exclusive for &mut A {
    fn owns_memory(&self) -> bool {
        (**self).owns_memory()
    }
}

// SAFETY: the box owns `A`.
unsafe impl<A: Exclusive + ?Sized> Exclusive for Box<A> {
    fn owns_memory(&self) -> bool {
        (**self).owns_memory()
    }
}

/// Typed helpers on top of the byte-level contract.
pub trait AllocatorExt: Allocator {
    /// Reserves room for one `T`.
    fn alloc_value<T>(&mut self) -> Result<Ptr, ArenaError> {
        self.alloc(mem::size_of::<T>(), mem::align_of::<T>())
    }

    /// Reserves room for `n` consecutive `T`s.
    fn alloc_array<T>(&mut self, n: usize) -> Result<Ptr, ArenaError> {
        let size = mem::size_of::<T>().checked_mul(n).ok_or_else(|| {
            ArenaError::InvalidArgument(format!("array of {n} elements overflows usize"))
        })?;
        self.alloc(size, mem::align_of::<T>())
    }

    /// Allocates a `T` and moves `value` into it.
    fn put<T: Copy>(&mut self, value: T) -> Result<Ptr, ArenaError> {
        let ptr = self.alloc_value::<T>()?;
        self.write_value(ptr, value)?;
        Ok(ptr)
    }

    /// Stores `value` at `ptr`.
    fn write_value<T: Copy>(&mut self, ptr: Ptr, value: T) -> Result<(), ArenaError> {
        let dst = self.resolve(ptr, mem::size_of::<T>())?;
        // SAFETY: `resolve` checked that size_of::<T>() bytes are in bounds.
        unsafe { dst.as_ptr().cast::<T>().write_unaligned(value) };
        Ok(())
    }

    /// Loads the `T` stored at `ptr`.
    ///
    /// # Safety
    ///
    /// The bytes at `ptr` must form a valid `T`, e.g. because they were
    /// written by [`AllocatorExt::write_value`] with the same type.
    unsafe fn read_value<T: Copy>(&self, ptr: Ptr) -> Result<T, ArenaError> {
        let src = self.resolve(ptr, mem::size_of::<T>())?;
        // SAFETY: in bounds per `resolve`, validity is on the caller.
        Ok(unsafe { src.as_ptr().cast::<T>().read_unaligned() })
    }
}

impl<A: Allocator + ?Sized> AllocatorExt for A {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_formula() {
        assert_eq!(padding(0, 4), 0);
        assert_eq!(padding(5, 4), 3);
        assert_eq!(padding(8, 8), 0);
        assert_eq!(padding(9, 1), 0);
        assert_eq!(padding(7, 3), 2);
    }

    #[test]
    fn zero_alignment_is_rejected() {
        assert!(matches!(
            check_align(0),
            Err(ArenaError::InvalidArgument(_))
        ));
        assert!(check_align(1).is_ok());
    }
}
