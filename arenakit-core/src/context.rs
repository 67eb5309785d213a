//! Request-scoped allocator carrier.
//!
//! Code that handles one unit of work (a request, a parse, a batch) passes an
//! [`ArenaContext`] down instead of an allocator parameter. Callees pick the
//! bound allocator, or their own fallback when none was bound.

use std::fmt;
use std::rc::Rc;

use crate::alloc::SharedAllocator;

#[derive(Clone, Default)]
pub struct ArenaContext {
    allocator: Option<SharedAllocator>,
}

impl ArenaContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a context carrying `allocator`.
    pub fn with_allocator(mut self, allocator: SharedAllocator) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// The bound allocator, if any.
    pub fn allocator(&self) -> Option<SharedAllocator> {
        self.allocator.clone()
    }

    /// The bound allocator, or `fallback` when nothing is bound.
    pub fn allocator_or(&self, fallback: &SharedAllocator) -> SharedAllocator {
        match &self.allocator {
            Some(allocator) => Rc::clone(allocator),
            None => Rc::clone(fallback),
        }
    }

    /// Unbinds and returns the allocator.
    pub fn detach(&mut self) -> Option<SharedAllocator> {
        self.allocator.take()
    }
}

impl fmt::Debug for ArenaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaContext")
            .field("bound", &self.allocator.is_some())
            .finish()
    }
}
