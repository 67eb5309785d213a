use thiserror::Error;

use crate::ptr::Ptr;

/// Allocation and resolution error conditions.
///
/// Every variant except [`ArenaError::ForeignPointer`] and
/// [`ArenaError::OutOfBounds`] is recoverable: the failed call left the
/// allocator untouched and the caller may evict, grow or give up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    #[error("Allocation limit exceeded: requested {requested} bytes, {available} available")]
    LimitExceeded { requested: usize, available: usize },

    #[error("Arena budget exceeded: requested {requested} bytes with {used} of {limit} used")]
    BudgetExceeded {
        requested: usize,
        used: usize,
        limit: usize,
    },

    #[error("Region address space exhausted: cannot place {requested} bytes")]
    AddressSpaceExhausted { requested: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A pointer was resolved against an arena that did not issue it.
    ///
    /// This is a programming error. The pointer escaped the scope of its
    /// owning arena or outlived a `clear`.
    #[error("Pointer {found:#06x} does not belong to arena {expected:#06x}")]
    ForeignPointer { expected: u16, found: u16 },

    #[error("Pointer {ptr} with length {len} is outside the arena")]
    OutOfBounds { ptr: Ptr, len: usize },

    #[error("Arena bytes are not valid UTF-8")]
    InvalidUtf8,

    /// A zero-copy view was requested from an arena layered over a shared
    /// parent, which another handle may clear at any time.
    #[error("Zero-copy views need an allocator that owns its memory")]
    SharedMemory,
}

impl ArenaError {
    /// Whether the error signals misuse that must not be recovered from.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ArenaError::ForeignPointer { .. } | ArenaError::OutOfBounds { .. }
        )
    }

    /// Whether the error is one of the "no room" conditions.
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            ArenaError::LimitExceeded { .. }
                | ArenaError::BudgetExceeded { .. }
                | ArenaError::AddressSpaceExhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_fatal_errors() {
        let foreign = ArenaError::ForeignPointer {
            expected: 3,
            found: 5,
        };
        assert!(foreign.is_fatal());
        assert!(!foreign.is_limit());

        let budget = ArenaError::BudgetExceeded {
            requested: 8,
            used: 44,
            limit: 48,
        };
        assert!(budget.is_limit());
        assert!(!budget.is_fatal());
    }

    #[test]
    fn shared_memory_is_neither_fatal_nor_a_limit() {
        assert!(!ArenaError::SharedMemory.is_fatal());
        assert!(!ArenaError::SharedMemory.is_limit());
    }

    #[test]
    fn formats_foreign_pointer() {
        let err = ArenaError::ForeignPointer {
            expected: 0x11,
            found: 0x2b,
        };
        assert_eq!(
            err.to_string(),
            "Pointer 0x002b does not belong to arena 0x0011"
        );
    }
}
