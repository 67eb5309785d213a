//! Identity tag generation.
//!
//! Each allocator owns its generator. Tags are odd, hence never zero, so
//! `Ptr::NIL` is rejected everywhere.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub(crate) struct IdentitySource {
    rng: SmallRng,
}

impl IdentitySource {
    pub(crate) fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_rng(&mut rand::rng()),
        }
    }

    pub(crate) fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub(crate) fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    /// Independent generator for an allocator created by this one.
    pub(crate) fn fork(&mut self) -> Self {
        Self {
            rng: SmallRng::from_rng(&mut self.rng),
        }
    }

    /// Tag for an allocator with no parent, distinct from `retired`.
    pub(crate) fn root(&mut self, retired: u16) -> u16 {
        loop {
            let tag = self.rng.random::<u16>() | 1;
            if tag != retired {
                return tag;
            }
        }
    }

    /// Tag for an allocator layered over `parent`: `(parent + odd) | 1`,
    /// distinct from both `parent` and `retired`.
    pub(crate) fn derive(&mut self, parent: u16, retired: u16) -> u16 {
        loop {
            let modifier = self.rng.random::<u16>() | 1;
            let tag = parent.wrapping_add(modifier) | 1;
            if tag != parent && tag != retired {
                return tag;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_odd_and_fresh() {
        let mut ids = IdentitySource::seeded(7);
        let mut retired = 0;
        for _ in 0..1_000 {
            let tag = ids.root(retired);
            assert_eq!(tag & 1, 1);
            assert_ne!(tag, retired);
            retired = tag;
        }
    }

    #[test]
    fn derived_tags_differ_from_parent() {
        let mut ids = IdentitySource::seeded(11);
        for parent in [1u16, 3, 0x7fff, 0xffff] {
            for _ in 0..500 {
                let tag = ids.derive(parent, 0);
                assert_ne!(tag, parent);
                assert_eq!(tag & 1, 1);
            }
        }
    }

    #[test]
    fn seeded_sources_are_deterministic() {
        let mut a = IdentitySource::seeded(42);
        let mut b = IdentitySource::seeded(42);
        assert_eq!(a.root(0), b.root(0));
        assert_eq!(a.derive(5, 0), b.derive(5, 0));
    }
}
