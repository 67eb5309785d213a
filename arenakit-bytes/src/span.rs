//! ## arenakit-bytes::span
//! **Growable byte sequences inside an arena**
//!
//! A [`Bytes`] is a `{ptr, len, capacity}` triple. It owns no memory and
//! never touches buckets directly; every byte goes through the allocator
//! contract (`alloc`, `current_offset`, `resolve`, `metrics`).
//!
//! Appending past the capacity first tries to claim the bytes right behind
//! the span. That works as long as nothing else was allocated since the span
//! last grew and the active bucket still has room for the claim:
//!
//! ```text
//!   [ span ........ | claimed ]      cursor == ptr + capacity: extend in place
//!   [ span ........ | other ][ copy of span ............... ]   otherwise
//! ```

use std::ptr;

use arenakit_core::{Allocator, ArenaError, Exclusive, Ptr};

/// Byte sequence stored in an arena.
///
/// Views returned by [`Bytes::as_slice`] and friends borrow the arena, so the
/// arena cannot allocate, move the span or clear while they are alive. They
/// are only handed out by allocators that own their memory; a shared handle
/// does not compile and an arena over a shared parent returns
/// [`ArenaError::SharedMemory`]. [`Bytes::to_vec`] works with any allocator.
///
/// ```compile_fail
/// use arenakit_bytes::embed_str;
/// use arenakit_core::{shared, Arena};
///
/// let mut handle = shared(Arena::new());
/// let bytes = embed_str(&mut handle, "hi").unwrap();
/// let view = bytes.as_slice(&handle);
/// ```
#[derive(Debug, PartialEq, Eq, Default)]
pub struct Bytes {
    ptr: Ptr,
    len: usize,
    cap: usize,
}

impl Bytes {
    /// Span with no storage; the first append allocates.
    pub const fn empty() -> Self {
        Self {
            ptr: Ptr::NIL,
            len: 0,
            cap: 0,
        }
    }

    /// `len` zeroed bytes.
    pub fn new<A: Allocator + ?Sized>(arena: &mut A, len: usize) -> Result<Self, ArenaError> {
        Self::with_capacity(arena, len, len)
    }

    /// `len` zeroed bytes with room for `cap` in total.
    pub fn with_capacity<A: Allocator + ?Sized>(
        arena: &mut A,
        len: usize,
        cap: usize,
    ) -> Result<Self, ArenaError> {
        if cap < len {
            return Err(ArenaError::InvalidArgument(format!(
                "capacity {cap} is smaller than length {len}"
            )));
        }
        let ptr = arena.alloc(cap, 1)?;
        if len > 0 {
            let dst = arena.resolve(ptr, len)?;
            // SAFETY: `resolve` checked that `len` bytes from `dst` are ours.
            unsafe { ptr::write_bytes(dst.as_ptr(), 0, len) };
        }
        Ok(Self { ptr, len, cap })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Handle of the first byte; [`Ptr::NIL`] before any storage exists.
    pub fn ptr(&self) -> Ptr {
        self.ptr
    }

    /// Appends `data`, growing the span when needed.
    pub fn append<A: Allocator + ?Sized>(
        &mut self,
        arena: &mut A,
        data: &[u8],
    ) -> Result<(), ArenaError> {
        if data.is_empty() {
            return Ok(());
        }
        self.reserve(arena, data.len())?;
        let dst = arena.resolve(self.ptr, self.len + data.len())?;
        // SAFETY: the range was checked by `resolve` and `data` lives on the
        // Rust heap or stack, never inside the arena span being written.
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), dst.as_ptr().add(self.len), data.len())
        };
        self.len += data.len();
        Ok(())
    }

    pub fn append_str<A: Allocator + ?Sized>(
        &mut self,
        arena: &mut A,
        s: &str,
    ) -> Result<(), ArenaError> {
        self.append(arena, s.as_bytes())
    }

    pub fn append_byte<A: Allocator + ?Sized>(
        &mut self,
        arena: &mut A,
        byte: u8,
    ) -> Result<(), ArenaError> {
        self.append(arena, &[byte])
    }

    /// Makes room for `additional` more bytes.
    pub fn reserve<A: Allocator + ?Sized>(
        &mut self,
        arena: &mut A,
        additional: usize,
    ) -> Result<(), ArenaError> {
        let needed = self.len.checked_add(additional).ok_or_else(|| {
            ArenaError::InvalidArgument("span length overflows usize".into())
        })?;
        if needed <= self.cap {
            return Ok(());
        }

        if self.ptr.is_nil() {
            self.ptr = arena.alloc(needed, 1)?;
            self.cap = needed;
            return Ok(());
        }

        if self.extend_in_place(arena, needed - self.cap)? {
            return Ok(());
        }

        let cap = needed.saturating_mul(2).max(self.cap.saturating_mul(2));
        let moved = arena.alloc(cap, 1)?;
        if self.len > 0 {
            let src = arena.resolve(self.ptr, self.len)?;
            let dst = arena.resolve(moved, self.len)?;
            // SAFETY: both ranges were checked by `resolve`; `moved` is a
            // fresh allocation so it cannot overlap the old span.
            unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), self.len) };
        }
        tracing::trace!(from = %self.ptr, to = %moved, cap, "span reallocated");
        self.ptr = moved;
        self.cap = cap;
        Ok(())
    }

    /// Claims the `shortfall` bytes right behind the span if they are next
    /// in line. Returns whether the span grew; nothing is allocated when it
    /// did not.
    fn extend_in_place<A: Allocator + ?Sized>(
        &mut self,
        arena: &mut A,
        shortfall: usize,
    ) -> Result<bool, ArenaError> {
        let Some(tail) = self.ptr.byte_add(self.cap) else {
            return Ok(false);
        };
        if arena.current_offset() != tail || arena.contiguous_bytes() < shortfall {
            return Ok(false);
        }
        // Unpadded and within the active bucket, so the claim lands at `tail`.
        let claimed = arena.alloc(shortfall, 1)?;
        if claimed != tail {
            return Err(ArenaError::OutOfBounds {
                ptr: claimed,
                len: shortfall,
            });
        }
        self.cap += shortfall;
        Ok(true)
    }

    /// Zero-copy view of the content.
    pub fn as_slice<'a, A: Exclusive + ?Sized>(
        &'a self,
        arena: &'a A,
    ) -> Result<&'a [u8], ArenaError> {
        if self.len == 0 {
            return Ok(&[]);
        }
        if !arena.owns_memory() {
            return Err(ArenaError::SharedMemory);
        }
        let src = arena.resolve(self.ptr, self.len)?;
        // SAFETY: `resolve` checked the range. The arena owns the memory and
        // stays borrowed while the slice lives, so nothing can release it.
        Ok(unsafe { std::slice::from_raw_parts(src.as_ptr(), self.len) })
    }

    /// Mutable zero-copy view of the content.
    pub fn as_mut_slice<'a, A: Exclusive + ?Sized>(
        &'a mut self,
        arena: &'a mut A,
    ) -> Result<&'a mut [u8], ArenaError> {
        if self.len == 0 {
            return Ok(&mut []);
        }
        if !arena.owns_memory() {
            return Err(ArenaError::SharedMemory);
        }
        let dst = arena.resolve(self.ptr, self.len)?;
        // SAFETY: as in `as_slice`, and both borrows are exclusive.
        Ok(unsafe { std::slice::from_raw_parts_mut(dst.as_ptr(), self.len) })
    }

    /// Zero-copy view of the content as UTF-8.
    pub fn as_str<'a, A: Exclusive + ?Sized>(
        &'a self,
        arena: &'a A,
    ) -> Result<&'a str, ArenaError> {
        std::str::from_utf8(self.as_slice(arena)?).map_err(|_| ArenaError::InvalidUtf8)
    }

    /// Copies the content out to the heap.
    pub fn to_vec<A: Allocator + ?Sized>(&self, arena: &A) -> Result<Vec<u8>, ArenaError> {
        if self.len == 0 {
            return Ok(Vec::new());
        }
        let src = arena.resolve(self.ptr, self.len)?;
        let mut out = Vec::with_capacity(self.len);
        // SAFETY: `resolve` checked the range and no other code runs before
        // the copy completes.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), out.as_mut_ptr(), self.len);
            out.set_len(self.len);
        }
        Ok(out)
    }

    pub fn to_heap_string<A: Allocator + ?Sized>(&self, arena: &A) -> Result<String, ArenaError> {
        String::from_utf8(self.to_vec(arena)?).map_err(|_| ArenaError::InvalidUtf8)
    }

    /// Drops the content, keeping the capacity.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Shortens the span to `len` bytes; longer lengths are ignored.
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }
}

/// Copies `src` into `arena`, sized exactly.
pub fn embed_bytes<A: Allocator + ?Sized>(arena: &mut A, src: &[u8]) -> Result<Bytes, ArenaError> {
    let mut bytes = Bytes::empty();
    bytes.append(arena, src)?;
    Ok(bytes)
}

pub fn embed_str<A: Allocator + ?Sized>(arena: &mut A, src: &str) -> Result<Bytes, ArenaError> {
    embed_bytes(arena, src.as_bytes())
}
