//! Sorted counting multiset.
//!
//! Tracks, for every distinct value, the total weight it was inserted with,
//! and iterates values in ascending order.  This is the accumulator of the
//! histogram and quantile tables, whose combine output is exactly the
//! multiset's `(value, weight)` entries.

use crate::TableError;
use std::{
    collections::{btree_map, BTreeMap},
    fmt::Debug,
};

/// A weighted multiset ordered by value.
///
/// Entries whose cumulative weight drops to zero are removed, so
/// [`Self::len`] counts values with non-zero weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedMultiset<T> {
    entries: BTreeMap<T, i64>,
    total: i64,
}

impl<T> Default for SortedMultiset<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            total: 0,
        }
    }
}

impl<T: Ord + Debug> SortedMultiset<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total = 0;
    }

    /// Adds `weight` to the cumulative weight of `value`.
    ///
    /// Fails with [`TableError::Overflow`], leaving the multiset unchanged,
    /// if either the value's weight or the total leaves the `i64` range.
    pub fn insert(&mut self, value: T, weight: i64) -> Result<(), TableError> {
        if weight == 0 {
            return Ok(());
        }
        let overflow = |value: &T| TableError::Overflow(format!("{value:?}"));
        let total = self.total.checked_add(weight).ok_or_else(|| overflow(&value))?;
        match self.entries.entry(value) {
            btree_map::Entry::Occupied(mut entry) => {
                let sum = entry
                    .get()
                    .checked_add(weight)
                    .ok_or_else(|| overflow(entry.key()))?;
                if sum == 0 {
                    entry.remove();
                } else {
                    *entry.get_mut() = sum;
                }
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(weight);
            }
        }
        self.total = total;
        Ok(())
    }

    /// Cumulative weight of `value`, zero if absent.
    pub fn count(&self, value: &T) -> i64 {
        self.entries.get(value).copied().unwrap_or(0)
    }

    /// Sum of all weights.
    pub fn total(&self) -> i64 {
        self.total
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(value, cumulative weight)` in ascending value order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, i64)> + '_ {
        self.entries.iter().map(|(value, weight)| (value, *weight))
    }
}

#[cfg(test)]
mod tests {
    use super::SortedMultiset;
    use crate::TableError;

    #[test]
    fn test_basic_operations() {
        let mut set = SortedMultiset::new();
        for value in [30, 10, 20, 10, 50, 10] {
            set.insert(value, 1).unwrap();
        }

        assert_eq!(set.total(), 6);
        assert_eq!(set.len(), 4);
        assert_eq!(set.count(&10), 3);
        assert_eq!(set.count(&40), 0);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![(&10, 3), (&20, 1), (&30, 1), (&50, 1)]
        );
    }

    #[test]
    fn test_weights() {
        let mut set = SortedMultiset::new();
        set.insert("b", 4).unwrap();
        set.insert("a", 2).unwrap();
        set.insert("b", -4).unwrap();
        set.insert("c", 0).unwrap();

        assert_eq!(set.total(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![(&"a", 2)]);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.total(), 0);
    }

    #[test]
    fn test_overflow() {
        let mut set = SortedMultiset::new();
        set.insert(1, i64::MAX).unwrap();
        // The total overflows.
        assert!(matches!(set.insert(2, 1), Err(TableError::Overflow(_))));
        assert_eq!(set.total(), i64::MAX);

        // The value's own weight overflows although the total would not.
        set.insert(2, -5).unwrap();
        assert!(matches!(set.insert(1, 1), Err(TableError::Overflow(_))));
        assert_eq!(set.total(), i64::MAX - 5);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![(&1, i64::MAX), (&2, -5)]
        );
    }
}
