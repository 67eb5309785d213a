//! ## arenakit-core::ptr
//! **Opaque arena pointers**
//!
//! A [`Ptr`] names a byte inside an arena without carrying an address. It is
//! only meaningful to the allocator whose identity tag it carries; resolving
//! it anywhere else fails with [`crate::ArenaError::ForeignPointer`].
//!
//! ```text
//!   ┌────────────────────┬──────────┬────────────────┐
//!   │ offset (u32)       │ bucket   │ arena tag      │
//!   │ byte within bucket │ (u8)     │ (u16, odd)     │
//!   └────────────────────┴──────────┴────────────────┘
//! ```

use std::fmt;

/// Maximum number of buckets a region can address.
pub const MAX_BUCKETS: usize = u8::MAX as usize + 1;

/// Base alignment of every bucket. Alignments up to this value hold in
/// absolute address terms, larger ones only relative to the bucket start.
pub const BUCKET_ALIGN: usize = 64;

/// Maximum size of a single bucket: the 32-bit offset space, or less where
/// `isize` cannot describe that much memory.
pub const MAX_BUCKET_SIZE: usize = if usize::BITS > 32 {
    u32::MAX as usize
} else {
    i32::MAX as usize - BUCKET_ALIGN
};

/// Handle to a location inside an arena.
///
/// The default value is [`Ptr::NIL`]. Identity tags handed out by allocators
/// are always odd, so `NIL` never resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ptr {
    offset: u32,
    bucket: u8,
    arena: u16,
}

impl Ptr {
    pub const NIL: Ptr = Ptr {
        offset: 0,
        bucket: 0,
        arena: 0,
    };

    #[inline]
    pub(crate) fn new(offset: u32, bucket: u8, arena: u16) -> Self {
        Self {
            offset,
            bucket,
            arena,
        }
    }

    /// Byte offset within the bucket.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Index of the bucket inside its region.
    #[inline]
    pub fn bucket(&self) -> u8 {
        self.bucket
    }

    /// Identity tag of the issuing allocator.
    #[inline]
    pub fn arena(&self) -> u16 {
        self.arena
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        *self == Ptr::NIL
    }

    /// Returns the pointer `n` bytes further into the same bucket.
    ///
    /// `None` when the result does not fit the 32-bit offset space.
    #[inline]
    pub fn byte_add(self, n: usize) -> Option<Ptr> {
        let n = u32::try_from(n).ok()?;
        let offset = self.offset.checked_add(n)?;
        Some(Ptr { offset, ..self })
    }

    #[inline]
    pub(crate) fn with_arena(self, arena: u16) -> Ptr {
        Ptr { arena, ..self }
    }
}

impl fmt::Display for Ptr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{}+{}", self.arena, self.bucket, self.offset)
    }
}
