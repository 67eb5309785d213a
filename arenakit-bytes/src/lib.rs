//! # arenakit-bytes
//!
//! Byte sequences and stream buffers stored in arenas.
//!
//! ### Key Submodules:
//! - `span`: [`Bytes`], a growable `{ptr, len, capacity}` view with
//!   in-place tail extension, and the `embed_*` copy helpers
//! - `buffer`: [`Buffer`] and [`PanicBuffer`], write-oriented wrappers
//!   implementing `std::io::Write` and `std::fmt::Write`
//!
//! Nothing in this crate owns memory; it only speaks the
//! [`arenakit_core::Allocator`] contract.

pub mod buffer;
pub mod span;

pub use buffer::{Buffer, PanicBuffer};
pub use span::{embed_bytes, embed_str, Bytes};
