use serde::Serialize;

/// Summary of row payload sizes seen during a scan.
///
/// `count` only covers observations that carried a size. With no such
/// observation every field is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SizeStatistics {
    pub count: u64,
    pub average: f64,
    pub max: u64,
    pub min: u64,
}

/// Streaming min/max/average reducer with constant memory.
#[derive(Debug, Clone, Default)]
pub struct StatisticsAccumulator {
    count: u64,
    sum: u128,
    min: u64,
    max: u64,
}

impl StatisticsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one row. `None` means the payload was null: it is skipped here
    /// and only the caller's row counter moves.
    pub fn observe(&mut self, size: Option<u64>) {
        let Some(size) = size else {
            return;
        };

        if self.count == 0 {
            self.min = size;
            self.max = size;
        } else {
            self.min = self.min.min(size);
            self.max = self.max.max(size);
        }
        self.count += 1;
        self.sum += u128::from(size);
    }

    pub fn finalize(&self) -> SizeStatistics {
        if self.count == 0 {
            return SizeStatistics::default();
        }

        SizeStatistics {
            count: self.count,
            average: self.sum as f64 / self.count as f64,
            max: self.max,
            min: self.min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_accumulator_is_all_zero() {
        let stats = StatisticsAccumulator::new().finalize();
        assert_eq!(stats, SizeStatistics { count: 0, average: 0.0, max: 0, min: 0 });
    }

    #[test]
    fn test_absent_sizes_do_not_affect_stats() {
        let mut acc = StatisticsAccumulator::new();
        acc.observe(Some(10));
        acc.observe(None);
        acc.observe(Some(30));

        let stats = acc.finalize();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min, 10);
        assert_eq!(stats.max, 30);
        assert!((stats.average - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_only_absent_sizes() {
        let mut acc = StatisticsAccumulator::new();
        for _ in 0..100 {
            acc.observe(None);
        }
        assert_eq!(acc.finalize(), SizeStatistics::default());
    }

    #[test]
    fn test_single_zero_sized_row() {
        let mut acc = StatisticsAccumulator::new();
        acc.observe(Some(0));

        let stats = acc.finalize();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 0);
        assert_eq!(stats.average, 0.0);
    }

    #[test]
    fn test_average_between_min_and_max() {
        // Детерминированный псевдослучайный набор размеров
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for len in [1usize, 2, 7, 64, 1000] {
            let mut acc = StatisticsAccumulator::new();
            for i in 0..len {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                let size = if i % 5 == 4 { None } else { Some(seed % 1_000_000) };
                acc.observe(size);
            }

            let stats = acc.finalize();
            if stats.count > 0 {
                assert!(stats.min as f64 <= stats.average, "len {len}: {stats:?}");
                assert!(stats.average <= stats.max as f64, "len {len}: {stats:?}");
            }
        }
    }

    #[test]
    fn test_large_sizes_do_not_overflow() {
        let mut acc = StatisticsAccumulator::new();
        acc.observe(Some(u64::MAX));
        acc.observe(Some(u64::MAX));

        let stats = acc.finalize();
        assert_eq!(stats.max, u64::MAX);
        assert_eq!(stats.min, u64::MAX);
        assert_eq!(stats.average, u64::MAX as f64);
    }
}
