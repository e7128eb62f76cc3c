//! Fixed-capacity list of the best-ranked weighted items seen so far.
//!
//! Backs the maximum, minimum and top tables.  Insertion scans the list
//! linearly for the candidate's position and shifts lower-ranked entries
//! down by one slot, dropping the last one when the list is full.

use crate::number::Number;
use std::{fmt::Debug, marker::PhantomData};

/// A kept item.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry<W> {
    pub value: String,
    pub weight: W,
}

/// Ordering rule of a [`BoundedList`].
pub trait Ranking {
    type Weight: Clone + Debug + PartialEq;

    /// Worst possible weight: the weight an unpopulated slot behaves as.
    fn sentinel() -> Self::Weight;

    /// Returns true if the item `(value, weight)` ranks strictly above
    /// `other`.
    fn outranks(value: &str, weight: &Self::Weight, other: &Entry<Self::Weight>) -> bool;
}

/// Heaviest first; equal weights rank the greater string first.
#[derive(Clone, Debug)]
pub struct Largest;

impl Ranking for Largest {
    type Weight = Number;

    fn sentinel() -> Number {
        Number::Float(f64::NEG_INFINITY)
    }

    fn outranks(value: &str, weight: &Number, other: &Entry<Number>) -> bool {
        weight
            .total_cmp(&other.weight)
            .then_with(|| value.cmp(other.value.as_str()))
            .is_gt()
    }
}

/// Lightest first; equal weights rank the greater string first.
#[derive(Clone, Debug)]
pub struct Smallest;

impl Ranking for Smallest {
    type Weight = Number;

    fn sentinel() -> Number {
        Number::Float(f64::INFINITY)
    }

    fn outranks(value: &str, weight: &Number, other: &Entry<Number>) -> bool {
        other
            .weight
            .total_cmp(weight)
            .then_with(|| value.cmp(other.value.as_str()))
            .is_gt()
    }
}

/// Highest count first; equal counts rank the smaller string first.
#[derive(Clone, Debug)]
pub struct MostFrequent;

impl Ranking for MostFrequent {
    type Weight = i64;

    fn sentinel() -> i64 {
        i64::MIN
    }

    fn outranks(value: &str, weight: &i64, other: &Entry<i64>) -> bool {
        weight
            .cmp(&other.weight)
            .then_with(|| other.value.as_str().cmp(value))
            .is_gt()
    }
}

/// The best `capacity` items offered so far, in rank order.
#[derive(Clone, Debug)]
pub struct BoundedList<R: Ranking> {
    capacity: usize,
    entries: Vec<Entry<R::Weight>>,
    phantom: PhantomData<R>,
}

impl<R: Ranking> BoundedList<R> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
            phantom: PhantomData,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Offers an item to the list.  Returns true if it was kept.
    ///
    /// While the list has free slots every item is kept, since a free slot
    /// holds the sentinel weight.  Once full, an item is kept only if it
    /// outranks the current last entry, which is then evicted.
    pub fn offer(&mut self, value: &str, weight: R::Weight) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.is_full() {
            match self.entries.last() {
                Some(last) if R::outranks(value, &weight, last) => {}
                _ => return false,
            }
        }

        let position = self
            .entries
            .iter()
            .position(|entry| R::outranks(value, &weight, entry))
            .unwrap_or(self.entries.len());
        if self.is_full() {
            self.entries.pop();
        }
        self.entries.insert(
            position,
            Entry {
                value: value.to_string(),
                weight,
            },
        );
        true
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry<R::Weight>> {
        self.entries.iter()
    }
}

impl<'a, R: Ranking> IntoIterator for &'a BoundedList<R> {
    type Item = &'a Entry<R::Weight>;
    type IntoIter = std::slice::Iter<'a, Entry<R::Weight>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
