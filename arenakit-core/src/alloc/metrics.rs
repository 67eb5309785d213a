//! ## arenakit-core::alloc::metrics
//! **Per-allocator usage snapshot**

/// Point-in-time usage of one allocator.
///
/// `used_bytes` counts everything the allocator consumed: payload, alignment
/// padding and, for growable regions, the tail of a bucket abandoned on
/// growth. `data_bytes` counts payload only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub used_bytes: usize,
    pub available_bytes: usize,
    pub allocated_bytes: usize,
    pub max_capacity: usize,
    pub on_heap_allocation_count: usize,
    pub data_bytes: usize,
    pub allocation_count: usize,
}

impl Metrics {
    /// Bytes consumed that do not hold payload.
    #[inline]
    pub fn padding_overhead(&self) -> usize {
        self.used_bytes.saturating_sub(self.data_bytes)
    }

    /// Fraction of the consumed bytes that hold payload, in `0.0..=1.0`.
    pub fn utilization(&self) -> f64 {
        if self.used_bytes == 0 {
            return 1.0;
        }
        self.data_bytes as f64 / self.used_bytes as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_values() {
        let metrics = Metrics {
            used_bytes: 12,
            data_bytes: 9,
            ..Metrics::default()
        };
        assert_eq!(metrics.padding_overhead(), 3);
        assert!((metrics.utilization() - 0.75).abs() < f64::EPSILON);
        assert_eq!(Metrics::default().utilization(), 1.0);
    }
}
