//! # arenakit-core
//!
//! Region-based allocation engine: bump allocators over large pre-reserved
//! buffers, released in bulk instead of one object at a time.
//!
//! ### Expectations:
//! - Allocation is an offset bump plus, on growth, one buffer allocation
//! - Pointers are opaque handles that only resolve against their arena
//! - Arenas nest, each with its own budget and identity
//!
//! ### Key Submodules:
//! - `alloc`: fixed blocks, growable regions, arenas and the region pool
//! - `ptr`: the `{offset, bucket, tag}` handle
//! - `context`: request-scoped allocator carrier
//!
//! Allocators are single-threaded. Share a [`RegionPool`] between threads
//! and give each thread or request its own arena.

pub mod alloc;
pub mod config;
pub mod context;
pub mod error;
pub mod ptr;

pub mod prelude {
    pub use crate::alloc::*;
    pub use crate::config::*;
    pub use crate::context::*;
    pub use crate::error::*;
    pub use crate::ptr::*;
}

pub use alloc::arena::Arena;
pub use alloc::fixed::FixedBlock;
pub use alloc::metrics::Metrics;
pub use alloc::pool::{PooledArena, RegionPool};
pub use alloc::region::Region;
pub use alloc::{shared, Allocator, AllocatorExt, Exclusive, SharedAllocator};
pub use config::ArenaOptions;
pub use context::ArenaContext;
pub use error::ArenaError;
pub use ptr::Ptr;
