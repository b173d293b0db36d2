//! Population ranges used to group communes in statistics.

use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;

/// A commune population range.
///
/// Ranges are closed-open except the last one, which is unbounded. Variants
/// are declared in ascending order, so iterating them walks the ranges from
/// smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIterMacro, Serialize)]
pub enum PopulationBucket {
    Under500,
    From500,
    From1000,
    From2000,
    From5000,
    From10000,
    From20000,
    From50000,
    From100000,
}

impl PopulationBucket {
    /// The bucket a commune of `population` inhabitants falls into.
    ///
    /// Negative values (which the schema rejects) land in the first bucket.
    pub fn for_population(population: i64) -> Self {
        PopulationBucket::iter()
            .find(|bucket| bucket.upper_bound().is_none_or(|max| population <= max))
            .unwrap_or(PopulationBucket::From100000)
    }

    /// Display label, also used as the key of `by_population_range`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PopulationBucket::Under500 => "< 500",
            PopulationBucket::From500 => "500-999",
            PopulationBucket::From1000 => "1000-1999",
            PopulationBucket::From2000 => "2000-4999",
            PopulationBucket::From5000 => "5000-9999",
            PopulationBucket::From10000 => "10000-19999",
            PopulationBucket::From20000 => "20000-49999",
            PopulationBucket::From50000 => "50000-99999",
            PopulationBucket::From100000 => "100000+",
        }
    }

    /// Smallest population in the range.
    pub fn lower_bound(&self) -> i64 {
        match self {
            PopulationBucket::Under500 => 0,
            PopulationBucket::From500 => 500,
            PopulationBucket::From1000 => 1_000,
            PopulationBucket::From2000 => 2_000,
            PopulationBucket::From5000 => 5_000,
            PopulationBucket::From10000 => 10_000,
            PopulationBucket::From20000 => 20_000,
            PopulationBucket::From50000 => 50_000,
            PopulationBucket::From100000 => 100_000,
        }
    }

    /// Largest population in the range (inclusive), `None` for the last one.
    pub fn upper_bound(&self) -> Option<i64> {
        match self {
            PopulationBucket::Under500 => Some(499),
            PopulationBucket::From500 => Some(999),
            PopulationBucket::From1000 => Some(1_999),
            PopulationBucket::From2000 => Some(4_999),
            PopulationBucket::From5000 => Some(9_999),
            PopulationBucket::From10000 => Some(19_999),
            PopulationBucket::From20000 => Some(49_999),
            PopulationBucket::From50000 => Some(99_999),
            PopulationBucket::From100000 => None,
        }
    }
}

impl std::fmt::Display for PopulationBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(PopulationBucket::for_population(0).as_str(), "< 500");
        assert_eq!(PopulationBucket::for_population(499).as_str(), "< 500");
        assert_eq!(PopulationBucket::for_population(500).as_str(), "500-999");
        assert_eq!(PopulationBucket::for_population(1999).as_str(), "1000-1999");
        assert_eq!(PopulationBucket::for_population(2000).as_str(), "2000-4999");
        assert_eq!(PopulationBucket::for_population(99_999).as_str(), "50000-99999");
        assert_eq!(PopulationBucket::for_population(100_000).as_str(), "100000+");
        assert_eq!(PopulationBucket::for_population(2_161_000).as_str(), "100000+");
    }

    #[test]
    fn test_buckets_are_contiguous() {
        let buckets: Vec<PopulationBucket> = PopulationBucket::iter().collect();
        assert_eq!(buckets.len(), 9);
        assert_eq!(buckets[0].lower_bound(), 0);
        for pair in buckets.windows(2) {
            assert_eq!(pair[0].upper_bound().map(|max| max + 1), Some(pair[1].lower_bound()));
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(buckets[8].upper_bound(), None);
    }

    #[test]
    fn test_every_bucket_contains_its_bounds() {
        for bucket in PopulationBucket::iter() {
            assert_eq!(PopulationBucket::for_population(bucket.lower_bound()), bucket);
            if let Some(max) = bucket.upper_bound() {
                assert_eq!(PopulationBucket::for_population(max), bucket);
            }
        }
    }

    #[test]
    fn test_bounds_on_owned_bucket() {
        let bucket = PopulationBucket::for_population(3_000);
        assert_eq!(bucket.lower_bound(), 2_000);
        assert_eq!(bucket.upper_bound(), Some(4_999));
        assert_eq!(PopulationBucket::From100000.upper_bound(), None);
    }
}
