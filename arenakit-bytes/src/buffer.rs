//! ## arenakit-bytes::buffer
//! **Write-oriented buffers over an arena span**
//!
//! [`Buffer`] reports allocation failures as errors. [`PanicBuffer`] panics
//! instead, for call sites written against an unbounded `Vec<u8>`.
//! Both allocate nothing until the first write, which sizes the span.

use std::{fmt, io};

use arenakit_core::{Allocator, ArenaError, Exclusive};

use crate::span::Bytes;

/// Stream buffer that returns allocation errors.
pub struct Buffer<A: Allocator> {
    arena: A,
    bytes: Bytes,
}

impl<A: Allocator> Buffer<A> {
    /// Buffer writing into `arena`, e.g. `&mut Arena` or a shared allocator.
    pub fn new(arena: A) -> Self {
        Self {
            arena,
            bytes: Bytes::empty(),
        }
    }

    pub fn write(&mut self, data: &[u8]) -> Result<usize, ArenaError> {
        self.bytes.append(&mut self.arena, data)?;
        Ok(data.len())
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), ArenaError> {
        self.bytes.append_byte(&mut self.arena, byte)
    }

    pub fn write_str(&mut self, s: &str) -> Result<usize, ArenaError> {
        self.bytes.append_str(&mut self.arena, s)?;
        Ok(s.len())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, ArenaError> {
        self.bytes.to_vec(&self.arena)
    }

    pub fn to_heap_string(&self) -> Result<String, ArenaError> {
        self.bytes.to_heap_string(&self.arena)
    }

    /// Empties the buffer; the span keeps its capacity.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    pub fn arena(&self) -> &A {
        &self.arena
    }

    /// Splits the buffer into its allocator and span.
    pub fn into_parts(self) -> (A, Bytes) {
        (self.arena, self.bytes)
    }
}

impl<A: Exclusive> Buffer<A> {
    /// Written bytes, aliasing the arena.
    pub fn as_bytes(&self) -> Result<&[u8], ArenaError> {
        self.bytes.as_slice(&self.arena)
    }

    /// Written bytes as UTF-8, aliasing the arena.
    pub fn as_str(&self) -> Result<&str, ArenaError> {
        self.bytes.as_str(&self.arena)
    }
}

impl<A: Allocator> io::Write for Buffer<A> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Buffer::write(self, buf).map_err(|err| io::Error::new(io::ErrorKind::OutOfMemory, err))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<A: Allocator> fmt::Write for Buffer<A> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Buffer::write_str(self, s).map(drop).map_err(|_| fmt::Error)
    }
}

/// Stream buffer that panics when the arena refuses to grow it.
pub struct PanicBuffer<A: Allocator> {
    inner: Buffer<A>,
}

#[track_caller]
fn overflow(err: ArenaError) -> ! {
    panic!("arena buffer overflow: {err}")
}

impl<A: Allocator> PanicBuffer<A> {
    pub fn new(arena: A) -> Self {
        Self {
            inner: Buffer::new(arena),
        }
    }

    /// # Panics
    ///
    /// When the arena cannot hold `data`.
    pub fn write(&mut self, data: &[u8]) -> usize {
        self.inner.write(data).unwrap_or_else(|err| overflow(err))
    }

    pub fn write_byte(&mut self, byte: u8) {
        if let Err(err) = self.inner.write_byte(byte) {
            overflow(err)
        }
    }

    pub fn write_str(&mut self, s: &str) -> usize {
        self.inner.write_str(s).unwrap_or_else(|err| overflow(err))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// # Panics
    ///
    /// When the arena was cleared underneath the buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        self.inner.to_vec().unwrap_or_else(|err| overflow(err))
    }

    pub fn to_heap_string(&self) -> Result<String, ArenaError> {
        self.inner.to_heap_string()
    }

    pub fn reset(&mut self) {
        self.inner.reset()
    }

    pub fn into_inner(self) -> Buffer<A> {
        self.inner
    }
}

impl<A: Exclusive> PanicBuffer<A> {
    /// Written bytes, aliasing the arena.
    ///
    /// # Panics
    ///
    /// When the arena was cleared underneath the buffer or does not own
    /// its memory.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes().unwrap_or_else(|err| overflow(err))
    }

    pub fn as_str(&self) -> Result<&str, ArenaError> {
        self.inner.as_str()
    }
}

impl<A: Allocator> io::Write for PanicBuffer<A> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(PanicBuffer::write(self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<A: Allocator> fmt::Write for PanicBuffer<A> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        PanicBuffer::write_str(self, s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arenakit_core::{shared, Arena, ArenaOptions, FixedBlock};
    use std::fmt::Write as _;

    #[test]
    fn unwritten_buffer_is_empty() {
        let buffer = Buffer::new(Arena::new());
        assert_eq!(buffer.as_bytes().unwrap(), b"");
        assert_eq!(buffer.as_str().unwrap(), "");
        assert_eq!(buffer.arena().metrics().allocation_count, 0);
    }

    #[test]
    fn first_write_sizes_the_span() {
        let mut buffer = Buffer::new(Arena::new());
        buffer.write(b"twelve bytes").unwrap();
        assert_eq!(buffer.capacity(), 12);
        buffer.write_byte(b'!').unwrap();
        buffer.write_str(" more").unwrap();
        assert_eq!(buffer.as_str().unwrap(), "twelve bytes! more");
        assert_eq!(buffer.to_heap_string().unwrap(), "twelve bytes! more");
    }

    #[test]
    fn borrows_an_arena() {
        let mut arena = Arena::new();
        {
            let mut buffer = Buffer::new(&mut arena);
            buffer.write_str("scoped").unwrap();
        }
        assert_eq!(arena.metrics().data_bytes, 6);
    }

    #[test]
    fn errors_surface_from_the_arena() {
        let mut buffer = Buffer::new(FixedBlock::new(4).unwrap());
        buffer.write(b"abcd").unwrap();
        assert!(buffer.write_byte(b'e').unwrap_err().is_limit());
        assert_eq!(buffer.as_bytes().unwrap(), b"abcd");
    }

    #[test]
    fn std_write_traits() {
        let mut buffer = Buffer::new(shared(Arena::new()));
        write!(buffer, "{}-{}", 1, 2).unwrap();
        std::io::Write::write_all(&mut buffer, b"-3").unwrap();
        assert_eq!(buffer.to_heap_string().unwrap(), "1-2-3");

        let mut full = Buffer::new(FixedBlock::new(2).unwrap());
        let err = std::io::Write::write_all(&mut full, b"abc").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::OutOfMemory);
    }

    #[test]
    fn views_refuse_arenas_over_shared_parents() {
        let parent = shared(Arena::new());
        let child = Arena::over(parent, ArenaOptions::new()).unwrap();
        let mut buffer = Buffer::new(child);
        buffer.write_str("copied").unwrap();

        assert_eq!(buffer.as_bytes(), Err(ArenaError::SharedMemory));
        assert_eq!(buffer.to_vec().unwrap(), b"copied".to_vec());
    }

    #[test]
    fn reset_reuses_capacity() {
        let mut buffer = Buffer::new(Arena::new());
        buffer.write_str("first").unwrap();
        buffer.reset();
        buffer.write_str("2nd").unwrap();
        assert_eq!(buffer.as_str().unwrap(), "2nd");
        assert_eq!(buffer.arena().metrics().allocation_count, 1);
    }

    #[test]
    fn panic_buffer_writes() {
        let mut buffer = PanicBuffer::new(Arena::new());
        buffer.write_str("a");
        buffer.write_byte(b'b');
        writeln!(buffer, "c").unwrap();
        assert_eq!(buffer.as_bytes(), b"abc\n");
        assert_eq!(buffer.to_vec(), b"abc\n".to_vec());
    }

    #[test]
    #[should_panic(expected = "arena buffer overflow")]
    fn panic_buffer_panics_on_overflow() {
        let mut buffer = PanicBuffer::new(Arena::with_limit(8));
        buffer.write(b"0123456789");
    }
}
