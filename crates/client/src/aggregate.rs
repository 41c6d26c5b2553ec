//! Multi-chunk response aggregation.
//!
//! A logical request that decomposes into chunks yields one result per
//! chunk; this module merges them into one logical result. Merge rules are
//! fixed per field: they are part of the response contract, never inferred
//! from the data.

use serde::{Deserialize, Serialize};

/// How one field merges across chunk results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeRule {
    /// Add values across chunks.
    Sum,
    /// Concatenate lists preserving chunk-index order.
    Concat,
    /// Take the value from the last chunk.
    LastValue,
    /// Take the value from the first chunk.
    FirstValue,
}

/// Merge scalar amounts under a rule. Empty input is zero, not an error.
pub fn merge_amounts(rule: MergeRule, values: &[u64]) -> u64 {
    match rule {
        MergeRule::Sum => values.iter().sum(),
        // Concatenation of scalars degenerates to summation.
        MergeRule::Concat => values.iter().sum(),
        MergeRule::LastValue => values.last().copied().unwrap_or(0),
        MergeRule::FirstValue => values.first().copied().unwrap_or(0),
    }
}

/// Merge list-valued fields under a rule, in chunk-index order.
pub fn merge_lists<T: Clone>(rule: MergeRule, lists: &[Vec<T>]) -> Vec<T> {
    match rule {
        MergeRule::Concat => lists.iter().flatten().cloned().collect(),
        MergeRule::LastValue => lists.last().cloned().unwrap_or_default(),
        MergeRule::FirstValue => lists.first().cloned().unwrap_or_default(),
        MergeRule::Sum => lists.iter().flatten().cloned().collect(),
    }
}

/// A named line item on a fee estimate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeExtra {
    /// Line-item name.
    pub name: String,
    /// Amount in base units.
    pub amount: u64,
}

/// Fee estimate for one chunk, or the aggregate over all chunks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    /// Base cost in base units.
    pub subtotal: u64,
    /// Network fee multiplier; constant across the chunks of one request.
    pub multiplier: u64,
    /// Line items beyond the subtotal.
    #[serde(default)]
    pub extras: Vec<FeeExtra>,
    /// Human-readable notes attached by the estimator.
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Per-field merge rules for [`FeeEstimate::aggregate`].
pub const SUBTOTAL_RULE: MergeRule = MergeRule::Sum;
/// The multiplier is identical on every chunk; any chunk's value serves.
pub const MULTIPLIER_RULE: MergeRule = MergeRule::LastValue;
/// Extras concatenate in chunk order. Repeated names are NOT summed by
/// name; whether they should be is an open protocol question, and the
/// observable behavior is kept as-is until it is settled.
pub const EXTRAS_RULE: MergeRule = MergeRule::Concat;
/// Notes concatenate in chunk order.
pub const NOTES_RULE: MergeRule = MergeRule::Concat;

impl FeeEstimate {
    /// Merge per-chunk estimates into the logical request's estimate.
    ///
    /// Input order must be chunk-index order. An empty slice yields the
    /// zero-valued estimate.
    pub fn aggregate(chunks: &[FeeEstimate]) -> FeeEstimate {
        let subtotals: Vec<u64> = chunks.iter().map(|c| c.subtotal).collect();
        let multipliers: Vec<u64> = chunks.iter().map(|c| c.multiplier).collect();
        let extras: Vec<Vec<FeeExtra>> = chunks.iter().map(|c| c.extras.clone()).collect();
        let notes: Vec<Vec<String>> = chunks.iter().map(|c| c.notes.clone()).collect();

        FeeEstimate {
            subtotal: merge_amounts(SUBTOTAL_RULE, &subtotals),
            multiplier: merge_amounts(MULTIPLIER_RULE, &multipliers),
            extras: merge_lists(EXTRAS_RULE, &extras),
            notes: merge_lists(NOTES_RULE, &notes),
        }
    }

    /// Total cost: subtotal plus extras, scaled by the multiplier.
    pub fn total(&self) -> u64 {
        let extras: u64 = self.extras.iter().map(|e| e.amount).sum();
        (self.subtotal + extras) * self.multiplier.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(subtotal: u64, notes: &[&str]) -> FeeEstimate {
        FeeEstimate {
            subtotal,
            multiplier: 2,
            extras: vec![],
            notes: notes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_three_chunk_aggregate() {
        let chunks = [
            chunk(100, &["first"]),
            chunk(200, &["second"]),
            chunk(300, &["third"]),
        ];
        let merged = FeeEstimate::aggregate(&chunks);

        assert_eq!(merged.subtotal, 600);
        assert_eq!(merged.multiplier, 2);
        assert_eq!(merged.notes, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_input_is_zero_aggregate() {
        let merged = FeeEstimate::aggregate(&[]);
        assert_eq!(merged, FeeEstimate::default());
    }

    #[test]
    fn test_extras_concatenate_without_dedup() {
        let a = FeeEstimate {
            subtotal: 1,
            multiplier: 1,
            extras: vec![FeeExtra {
                name: "storage".into(),
                amount: 5,
            }],
            notes: vec![],
        };
        let b = FeeEstimate {
            subtotal: 1,
            multiplier: 1,
            extras: vec![FeeExtra {
                name: "storage".into(),
                amount: 7,
            }],
            notes: vec![],
        };

        let merged = FeeEstimate::aggregate(&[a, b]);
        // Same name appears twice, in chunk order; not summed by name.
        assert_eq!(merged.extras.len(), 2);
        assert_eq!(merged.extras[0].amount, 5);
        assert_eq!(merged.extras[1].amount, 7);
    }

    #[test]
    fn test_total_applies_multiplier() {
        let estimate = FeeEstimate {
            subtotal: 10,
            multiplier: 3,
            extras: vec![FeeExtra {
                name: "bytes".into(),
                amount: 2,
            }],
            notes: vec![],
        };
        assert_eq!(estimate.total(), 36);
    }

    #[test]
    fn test_merge_rule_helpers() {
        assert_eq!(merge_amounts(MergeRule::Sum, &[1, 2, 3]), 6);
        assert_eq!(merge_amounts(MergeRule::LastValue, &[1, 2, 3]), 3);
        assert_eq!(merge_amounts(MergeRule::FirstValue, &[1, 2, 3]), 1);
        assert_eq!(merge_amounts(MergeRule::LastValue, &[]), 0);

        let lists = vec![vec!["a"], vec!["b", "c"]];
        assert_eq!(merge_lists(MergeRule::Concat, &lists), vec!["a", "b", "c"]);
        assert_eq!(merge_lists(MergeRule::FirstValue, &lists), vec!["a"]);
    }
}
