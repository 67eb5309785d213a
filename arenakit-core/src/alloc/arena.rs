//! ## arenakit-core::alloc::arena
//! **Identity-tagged sub-arenas with byte budgets**
//!
//! An [`Arena`] sits on top of another allocator: its own [`Region`] by
//! default, or any [`SharedAllocator`] (a region, a fixed block, another
//! arena). It stamps every pointer with its own identity tag, enforces an
//! optional budget and keeps its own usage counters.
//!
//! ```text
//!   Arena (tag 0x3a5f, budget 4 KiB) ──▶ Arena (tag 0x91c3) ──▶ Region (tag 0x7d01)
//!        pointers 3a5f:..                   pointers 91c3:..       buckets
//! ```
//!
//! Each allocation is charged `size + padding`, the padding measured
//! against the delegate's cursor. That is also what the budget is checked
//! against, so `used_bytes` never passes the limit. Bucket tails a region
//! abandons while growing show up in the region's metrics only.
//!
//! Clearing an arena detaches it from its delegate and rolls a new tag, so
//! every pointer it issued before stops resolving. The delegate itself is
//! untouched, which lets many short-lived arenas share one region.

use std::ptr::NonNull;
use std::rc::Rc;

use crate::config::ArenaOptions;
use crate::error::ArenaError;
use crate::ptr::{Ptr, MAX_BUCKETS, MAX_BUCKET_SIZE};

use super::identity::IdentitySource;
use super::region::Region;
use super::{check_align, padding, Allocator, Exclusive, Metrics, SharedAllocator};

/// What an arena allocates from.
enum Backing {
    Own(Region),
    Shared(SharedAllocator),
}

impl Backing {
    fn get(&self) -> &dyn Allocator {
        match self {
            Backing::Own(region) => region,
            Backing::Shared(shared) => shared,
        }
    }

    fn get_mut(&mut self) -> &mut dyn Allocator {
        match self {
            Backing::Own(region) => region,
            Backing::Shared(shared) => shared,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    used: usize,
    allocated: usize,
    data: usize,
    allocations: usize,
    heap_allocations: usize,
}

impl Counters {
    fn record(&mut self, before: &Metrics, after: &Metrics, size: usize, charged: usize) {
        self.used += charged;
        self.allocated += after.allocated_bytes.saturating_sub(before.allocated_bytes);
        self.heap_allocations += after
            .on_heap_allocation_count
            .saturating_sub(before.on_heap_allocation_count);
        self.data += size;
        self.allocations += 1;
    }
}

/// Allocator facade: identity, budget and metrics over a delegate.
pub struct Arena {
    parent: Option<SharedAllocator>,
    delegate: Option<Backing>,
    options: ArenaOptions,
    id: u16,
    retired: u16,
    ids: IdentitySource,
    counters: Counters,
}

impl Arena {
    /// Arena over its own default region, created on first use.
    pub fn new() -> Self {
        Self::unbound(None, ArenaOptions::default())
    }

    /// Arena over its own region set up by `options`.
    ///
    /// With a non-zero initial capacity the region and its first bucket are
    /// created immediately.
    pub fn with_options(options: ArenaOptions) -> Result<Self, ArenaError> {
        options.validate()?;
        let mut arena = Self::unbound(None, options);
        if arena.options.initial_capacity > 0 {
            arena.bind();
        }
        Ok(arena)
    }

    /// Arena with a byte budget over its own default region.
    pub fn with_limit(limit: usize) -> Self {
        Self::unbound(None, ArenaOptions::default().allocation_limit(limit))
    }

    /// Sub-arena allocating from `parent`.
    ///
    /// Only the budget and seed of `options` apply; the parent decides how
    /// memory is laid out.
    pub fn over(parent: SharedAllocator, options: ArenaOptions) -> Result<Self, ArenaError> {
        options.validate()?;
        if options.initial_capacity > 0 {
            return Err(ArenaError::InvalidArgument(
                "initial capacity needs an arena-owned region".into(),
            ));
        }
        Ok(Self::unbound(Some(parent), options))
    }

    /// Arena taking ownership of an existing region.
    pub fn with_region(region: Region, options: ArenaOptions) -> Result<Self, ArenaError> {
        options.validate()?;
        let mut arena = Self::unbound(None, options);
        arena.adopt(Backing::Own(region));
        Ok(arena)
    }

    fn unbound(parent: Option<SharedAllocator>, options: ArenaOptions) -> Self {
        Self {
            parent,
            delegate: None,
            ids: IdentitySource::from_seed(options.seed),
            options,
            id: 0,
            retired: 0,
            counters: Counters::default(),
        }
    }

    pub fn options(&self) -> &ArenaOptions {
        &self.options
    }

    /// Whether the arena is currently attached to a delegate.
    pub fn is_bound(&self) -> bool {
        self.delegate.is_some()
    }

    /// Gives back the arena's own region, if it has one.
    pub fn into_region(mut self) -> Option<Region> {
        match self.delegate.take() {
            Some(Backing::Own(region)) => Some(region),
            _ => None,
        }
    }

    fn adopt(&mut self, mut backing: Backing) -> &mut Backing {
        // Reading the cursor binds a lazy parent, so its tag is final.
        let parent_id = backing.get_mut().current_offset().arena();
        self.id = self.ids.derive(parent_id, self.retired);
        tracing::debug!(arena = self.id, parent = parent_id, "arena bound");
        self.delegate.insert(backing)
    }

    fn bind(&mut self) -> &mut Backing {
        let backing = match self.delegate.take() {
            Some(backing) => return self.delegate.insert(backing),
            None => match &self.parent {
                Some(parent) => Backing::Shared(Rc::clone(parent)),
                None => Backing::Own(Region::configured(self.ids.fork(), &self.options)),
            },
        };
        self.adopt(backing)
    }

    fn foreign(&self, ptr: Ptr) -> ArenaError {
        tracing::error!(expected = self.id, found = ptr.arena(), "foreign pointer");
        ArenaError::ForeignPointer {
            expected: self.id,
            found: ptr.arena(),
        }
    }

    /// Delegate capacity figures while unbound.
    fn unbound_capacity(&self) -> (usize, usize) {
        match &self.parent {
            Some(parent) => {
                let metrics = parent.metrics();
                (metrics.available_bytes, metrics.max_capacity)
            }
            None => {
                let max = MAX_BUCKETS.saturating_mul(MAX_BUCKET_SIZE);
                (max, max)
            }
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator for Arena {
    fn alloc(&mut self, size: usize, align: usize) -> Result<Ptr, ArenaError> {
        check_align(align)?;
        let limit = self.options.allocation_limit;
        let used = self.counters.used;

        let delegate = self.bind().get_mut();
        let cursor = delegate.current_offset();
        let needed = size.saturating_add(padding(cursor.offset() as usize, align));
        if let Some(limit) = limit {
            if used.saturating_add(needed) > limit {
                return Err(ArenaError::BudgetExceeded {
                    requested: needed,
                    used,
                    limit,
                });
            }
        }

        let before = delegate.metrics();
        let ptr = delegate.alloc(size, align)?;
        let after = delegate.metrics();

        self.counters.record(&before, &after, size, needed);
        Ok(ptr.with_arena(self.id))
    }

    fn current_offset(&mut self) -> Ptr {
        let cursor = self.bind().get_mut().current_offset();
        cursor.with_arena(self.id)
    }

    fn contiguous_bytes(&self) -> usize {
        let Some(delegate) = self.delegate.as_ref() else {
            return 0;
        };
        let room = delegate.get().contiguous_bytes();
        match self.options.allocation_limit {
            Some(limit) => room.min(limit.saturating_sub(self.counters.used)),
            None => room,
        }
    }

    fn resolve(&self, ptr: Ptr, len: usize) -> Result<NonNull<u8>, ArenaError> {
        let Some(delegate) = self.delegate.as_ref() else {
            return Err(self.foreign(ptr));
        };
        if ptr.arena() != self.id {
            return Err(self.foreign(ptr));
        }
        let delegate = delegate.get();
        delegate.resolve(ptr.with_arena(delegate.identity()), len)
    }

    fn metrics(&self) -> Metrics {
        let (delegate_available, delegate_max) = match &self.delegate {
            Some(delegate) => {
                let metrics = delegate.get().metrics();
                (metrics.available_bytes, metrics.max_capacity)
            }
            None => self.unbound_capacity(),
        };
        let used = self.counters.used;
        let (available, max_capacity) = match self.options.allocation_limit {
            Some(limit) => (
                limit.saturating_sub(used).min(delegate_available),
                limit.min(delegate_max),
            ),
            None => (delegate_available, delegate_max),
        };
        Metrics {
            used_bytes: used,
            available_bytes: available,
            allocated_bytes: self.counters.allocated,
            max_capacity,
            on_heap_allocation_count: self.counters.heap_allocations,
            data_bytes: self.counters.data,
            allocation_count: self.counters.allocations,
        }
    }

    fn identity(&self) -> u16 {
        self.id
    }

    fn clear(&mut self) {
        if self.id != 0 {
            self.retired = self.id;
        }
        self.counters = Counters::default();
        self.id = 0;

        match self.delegate.take() {
            Some(Backing::Own(mut region)) if self.options.retain_capacity => {
                region.clear();
                self.adopt(Backing::Own(region));
            }
            _ => {}
        }
        tracing::trace!(retired = self.retired, arena = self.id, "arena cleared");
    }
}

// SAFETY: an owned region is only cleared or dropped through `&mut self`.
// Arenas over a shared parent report that they do not own their memory.
unsafe impl Exclusive for Arena {
    fn owns_memory(&self) -> bool {
        !matches!(self.delegate, Some(Backing::Shared(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::fixed::FixedBlock;
    use crate::alloc::shared;
    use proptest::prelude::*;
    use tracing_test::traced_test;

    fn seeded(limit: Option<usize>, seed: u64) -> Arena {
        let mut options = ArenaOptions::new().seed(seed);
        options.allocation_limit = limit;
        Arena::with_options(options).unwrap()
    }

    #[test]
    fn budget_scenario_tracks_padding() {
        let mut arena = seeded(Some(48), 1);
        let mut used = Vec::new();
        for (size, align) in [(0, 1), (1, 1), (3, 1), (1, 1), (4, 4)] {
            arena.alloc(size, align).unwrap();
            used.push(arena.metrics().used_bytes);
        }
        assert_eq!(used, vec![0, 1, 4, 5, 12]);

        let metrics = arena.metrics();
        assert_eq!(metrics.data_bytes, 9);
        assert_eq!(metrics.padding_overhead(), 3);
        assert_eq!(metrics.allocation_count, 5);
        assert_eq!(metrics.available_bytes, 36);
    }

    #[test]
    fn budget_accepts_exact_fit_and_rejects_overflow() {
        let mut arena = seeded(Some(48), 2);
        arena.alloc(40, 1).unwrap();
        let before = arena.metrics();

        let err = arena.alloc(9, 1).unwrap_err();
        assert_eq!(
            err,
            ArenaError::BudgetExceeded {
                requested: 9,
                used: 40,
                limit: 48
            }
        );
        assert_eq!(arena.metrics(), before);

        arena.alloc(8, 1).unwrap();
        assert_eq!(arena.metrics().used_bytes, 48);
        assert_eq!(arena.metrics().available_bytes, 0);
        assert!(arena.alloc(0, 1).is_ok());
        assert!(arena.alloc(1, 1).is_err());
    }

    #[test]
    fn padding_counts_against_budget() {
        let mut arena = seeded(Some(8), 3);
        arena.alloc(1, 1).unwrap();
        // 3 padding + 8 > 8 - 1
        assert!(matches!(
            arena.alloc(8, 4),
            Err(ArenaError::BudgetExceeded { requested: 11, .. })
        ));
        assert_eq!(arena.metrics().used_bytes, 1);
    }

    /// Two arenas with distinct tags: both start from the same seed, then
    /// the second clears, which always moves it off its previous tag.
    fn distinct_pair(seed: u64) -> (Arena, Arena) {
        let mut a = seeded(None, seed);
        let mut b = seeded(None, seed);
        a.alloc(1, 1).unwrap();
        b.alloc(1, 1).unwrap();
        assert_eq!(a.identity(), b.identity());
        b.clear();
        b.alloc(1, 1).unwrap();
        assert_ne!(a.identity(), b.identity());
        (a, b)
    }

    #[test]
    fn pointers_resolve_in_their_own_arena_only() {
        let (mut a, mut b) = distinct_pair(10);
        let pa = a.alloc(16, 8).unwrap();
        let pb = b.alloc(16, 8).unwrap();

        assert!(a.to_ref(pa).is_ok());
        assert!(b.to_ref(pb).is_ok());
        assert!(b.to_ref(pa).unwrap_err().is_fatal());
        assert!(a.to_ref(pb).unwrap_err().is_fatal());
    }

    #[test]
    fn clear_invalidates_and_resets() {
        let mut arena = seeded(Some(1024), 4);
        let ptr = arena.alloc(64, 8).unwrap();
        arena.clear();

        assert!(!arena.is_bound());
        assert_eq!(arena.metrics().used_bytes, 0);
        assert!(arena.to_ref(ptr).unwrap_err().is_fatal());

        let again = arena.alloc(64, 8).unwrap();
        assert_ne!(again.arena(), ptr.arena());
        assert!(arena.to_ref(ptr).unwrap_err().is_fatal());
        assert!(arena.to_ref(again).is_ok());
    }

    #[test]
    fn clear_is_idempotent() {
        let mut arena = Arena::new();
        arena.alloc(8, 8).unwrap();
        arena.clear();
        arena.clear();
        assert_eq!(arena.metrics().allocation_count, 0);
        assert!(arena.alloc(8, 8).is_ok());
    }

    #[test]
    fn retained_clear_reuses_region() {
        let options = ArenaOptions::new()
            .initial_capacity(4096)
            .retain_capacity(true)
            .seed(5);
        let mut arena = Arena::with_options(options).unwrap();
        let ptr = arena.alloc(100, 1).unwrap();
        arena.clear();

        assert!(arena.is_bound());
        assert!(arena.to_ref(ptr).unwrap_err().is_fatal());
        let again = arena.alloc(100, 1).unwrap();
        assert_eq!(again.offset(), 0);
        assert_eq!(arena.metrics().on_heap_allocation_count, 0);
    }

    #[test]
    fn initial_capacity_is_preallocated() {
        let arena = Arena::with_options(ArenaOptions::new().initial_capacity(2048)).unwrap();
        assert!(arena.is_bound());
        let region = arena.into_region().unwrap();
        assert_eq!(region.capacity(), 2048);
    }

    #[test]
    fn child_tag_differs_from_parent() {
        let parent = shared(Region::with_seed(8));
        let mut child = Arena::over(parent.clone(), ArenaOptions::new().seed(8)).unwrap();
        let ptr = child.alloc(4, 4).unwrap();
        assert_ne!(ptr.arena(), parent.identity());
        assert!(parent.to_ref(ptr).unwrap_err().is_fatal());
        assert!(child.to_ref(ptr).is_ok());
    }

    #[test]
    fn nested_arenas_resolve_transparently() {
        let root = shared(Arena::new());
        let middle = shared(Arena::over(root.clone(), ArenaOptions::new()).unwrap());
        let mut leaf = Arena::over(middle.clone(), ArenaOptions::new()).unwrap();

        let ptr = leaf.alloc(8, 8).unwrap();
        let addr = leaf.resolve(ptr, 8).unwrap();
        unsafe { addr.as_ptr().cast::<u64>().write(0xfeed_beef) };

        let again = leaf.resolve(ptr, 8).unwrap();
        assert_eq!(unsafe { again.as_ptr().cast::<u64>().read() }, 0xfeed_beef);
        assert_ne!(middle.identity(), 0);
        assert!(middle.to_ref(ptr).is_err());
    }

    #[test]
    fn ancestor_budget_rejects_child_allocation() {
        let parent = shared(Arena::with_limit(32));
        let options = ArenaOptions::new().allocation_limit(1024);
        let mut child = Arena::over(parent.clone(), options).unwrap();

        child.alloc(24, 1).unwrap();
        let err = child.alloc(16, 1).unwrap_err();
        assert!(matches!(err, ArenaError::BudgetExceeded { limit: 32, .. }));
        assert_eq!(child.metrics().used_bytes, 24);
        assert_eq!(parent.metrics().used_bytes, 24);
    }

    #[test]
    fn sibling_clear_leaves_shared_region_alone() {
        let region = shared(Region::new());
        let mut first = Arena::over(region.clone(), ArenaOptions::new()).unwrap();
        let mut second = Arena::over(region.clone(), ArenaOptions::new()).unwrap();

        first.alloc(100, 1).unwrap();
        let kept = second.alloc(100, 1).unwrap();
        first.clear();

        assert_eq!(region.metrics().used_bytes, 200);
        assert!(second.to_ref(kept).is_ok());
        assert_eq!(second.metrics().used_bytes, 100);
    }

    #[test]
    fn fixed_block_parent_limits_growth() {
        let block = shared(FixedBlock::new(16).unwrap());
        let mut arena = Arena::over(block, ArenaOptions::new()).unwrap();
        let first = arena.alloc(10, 1).unwrap();
        assert!(matches!(
            arena.alloc(10, 1),
            Err(ArenaError::LimitExceeded { .. })
        ));
        assert!(arena.to_ref(first).is_ok());
        assert_eq!(arena.metrics().allocation_count, 1);
    }

    #[test]
    fn counts_heap_allocations_it_caused() {
        let options = ArenaOptions::new().first_bucket_size(64);
        let mut arena = Arena::with_options(options).unwrap();
        arena.alloc(30, 1).unwrap();
        arena.alloc(40, 1).unwrap();
        let metrics = arena.metrics();
        assert_eq!(metrics.on_heap_allocation_count, 2);
        assert_eq!(metrics.allocated_bytes, 64 + 128);
    }

    #[test]
    fn growth_does_not_charge_abandoned_tail() {
        let options = ArenaOptions::new()
            .first_bucket_size(64)
            .allocation_limit(100)
            .seed(6);
        let mut arena = Arena::with_options(options).unwrap();
        arena.alloc(30, 1).unwrap();
        // Opens a second bucket and leaves 34 bytes behind in the first.
        let ptr = arena.alloc(40, 1).unwrap();
        assert_eq!(ptr.bucket(), 1);

        let metrics = arena.metrics();
        assert_eq!(metrics.used_bytes, 70);
        assert_eq!(metrics.available_bytes, 30);
        assert_eq!(metrics.on_heap_allocation_count, 2);

        let before = arena.metrics();
        assert!(matches!(
            arena.alloc(31, 1),
            Err(ArenaError::BudgetExceeded {
                requested: 31,
                used: 70,
                limit: 100
            })
        ));
        assert_eq!(arena.metrics(), before);
        arena.alloc(30, 1).unwrap();
        assert_eq!(arena.metrics().used_bytes, 100);
    }

    #[test]
    fn contiguous_bytes_respect_budget_and_bucket() {
        let options = ArenaOptions::new().first_bucket_size(64).allocation_limit(40);
        let mut arena = Arena::with_options(options).unwrap();
        assert_eq!(arena.contiguous_bytes(), 0);

        arena.alloc(10, 1).unwrap();
        // 54 bytes left in the bucket, 30 in the budget.
        assert_eq!(arena.contiguous_bytes(), 30);

        let mut unbounded = Arena::with_options(ArenaOptions::new().first_bucket_size(64)).unwrap();
        unbounded.alloc(10, 1).unwrap();
        assert_eq!(unbounded.contiguous_bytes(), 54);
    }

    #[test]
    fn only_arenas_with_their_own_region_own_memory() {
        let mut own = Arena::new();
        own.alloc(1, 1).unwrap();
        assert!(own.owns_memory());

        let mut child = Arena::over(shared(Region::new()), ArenaOptions::new()).unwrap();
        child.alloc(1, 1).unwrap();
        assert!(!child.owns_memory());
    }

    #[test]
    fn unbound_arena_rejects_everything() {
        let arena = Arena::new();
        assert!(arena.to_ref(Ptr::NIL).unwrap_err().is_fatal());
        assert_eq!(arena.metrics().used_bytes, 0);
    }

    #[traced_test]
    #[test]
    fn foreign_pointer_is_logged() {
        let (mut a, b) = distinct_pair(30);
        let ptr = a.alloc(1, 1).unwrap();
        assert!(b.to_ref(ptr).unwrap_err().is_fatal());
        assert!(logs_contain("foreign pointer"));
    }

    proptest! {
        #[test]
        fn used_bytes_follow_padding_formula(
            requests in prop::collection::vec((0usize..64, 0u32..4), 1..64)
        ) {
            let mut arena = Arena::new();
            let mut expected_used = 0usize;
            let mut expected_data = 0usize;
            for (size, align_pow) in requests {
                let align = 1usize << align_pow;
                expected_used += padding(expected_used, align) + size;
                expected_data += size;
                arena.alloc(size, align).unwrap();

                let metrics = arena.metrics();
                prop_assert_eq!(metrics.used_bytes, expected_used);
                prop_assert_eq!(metrics.data_bytes, expected_data);
                prop_assert_eq!(metrics.padding_overhead(), expected_used - expected_data);
            }
        }

        #[test]
        fn used_bytes_follow_cursor_padding_across_buckets(
            requests in prop::collection::vec((0usize..48, 0u32..4), 1..64)
        ) {
            let options = ArenaOptions::new().first_bucket_size(64).seed(12);
            let mut arena = Arena::with_options(options).unwrap();
            let mut expected_used = 0usize;
            for (size, align_pow) in requests {
                let align = 1usize << align_pow;
                let cursor = arena.current_offset().offset() as usize;
                expected_used += padding(cursor, align) + size;
                arena.alloc(size, align).unwrap();
                prop_assert_eq!(arena.metrics().used_bytes, expected_used);
            }
        }

        #[test]
        fn budget_never_overshoots_across_buckets(
            limit in 0usize..512,
            requests in prop::collection::vec((0usize..48, 0u32..4), 1..48)
        ) {
            let options = ArenaOptions::new()
                .first_bucket_size(64)
                .allocation_limit(limit)
                .seed(13);
            let mut arena = Arena::with_options(options).unwrap();
            for (size, align_pow) in requests {
                let before = arena.metrics();
                match arena.alloc(size, 1usize << align_pow) {
                    Ok(_) => prop_assert!(arena.metrics().used_bytes <= limit),
                    Err(err) => {
                        prop_assert!(err.is_limit());
                        prop_assert_eq!(arena.metrics(), before);
                    }
                }
            }
        }

        #[test]
        fn budget_never_overshoots(
            limit in 0usize..256,
            requests in prop::collection::vec((0usize..48, 0u32..4), 1..32)
        ) {
            let mut arena = Arena::with_limit(limit);
            for (size, align_pow) in requests {
                let before = arena.metrics();
                match arena.alloc(size, 1usize << align_pow) {
                    Ok(_) => prop_assert!(arena.metrics().used_bytes <= limit),
                    Err(err) => {
                        prop_assert!(err.is_limit());
                        prop_assert_eq!(arena.metrics(), before);
                    }
                }
            }
        }
    }
}
