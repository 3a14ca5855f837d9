use serde::{Deserialize, Serialize};

/// Stock held per garment size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeCounts {
    #[serde(default)]
    pub xs: i64,
    #[serde(default)]
    pub s: i64,
    #[serde(default)]
    pub m: i64,
    #[serde(default)]
    pub l: i64,
    #[serde(default)]
    pub xl: i64,
}

impl SizeCounts {
    fn buckets(&self) -> [i64; 5] {
        [self.xs, self.s, self.m, self.l, self.xl]
    }

    /// Sum of every bucket, or `None` if it does not fit in an `i64`.
    pub fn checked_total(&self) -> Option<i64> {
        self.buckets()
            .iter()
            .try_fold(0_i64, |total, count| total.checked_add(*count))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub total: i64,
    pub available: bool,
}

pub fn aggregate(counts: &SizeCounts) -> StockLevel {
    // Input is validated against overflow; saturate for records that were not.
    let total = counts
        .buckets()
        .iter()
        .fold(0_i64, |total, count| total.saturating_add(*count));
    StockLevel {
        total,
        available: total > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inventory_is_unavailable() {
        let level = aggregate(&SizeCounts::default());
        assert_eq!(level.total, 0);
        assert!(!level.available);
    }

    #[test]
    fn sums_every_bucket() {
        let counts = SizeCounts {
            xs: 1,
            s: 2,
            m: 3,
            l: 4,
            xl: 5,
        };
        assert_eq!(
            aggregate(&counts),
            StockLevel {
                total: 15,
                available: true
            }
        );
    }

    #[test]
    fn single_size_in_stock_is_enough() {
        let counts = SizeCounts {
            xl: 1,
            ..Default::default()
        };
        assert!(aggregate(&counts).available);
    }

    #[test]
    fn oversized_buckets_do_not_overflow() {
        let counts = SizeCounts {
            xs: i64::MAX,
            s: 1,
            ..Default::default()
        };
        assert_eq!(counts.checked_total(), None);
        assert_eq!(
            aggregate(&counts),
            StockLevel {
                total: i64::MAX,
                available: true
            }
        );
    }

    #[test]
    fn missing_buckets_deserialize_as_zero() {
        let counts: SizeCounts = serde_json::from_str(r#"{"m": 5}"#).unwrap();
        assert_eq!(aggregate(&counts).total, 5);
    }
}
