//! Data structures backing the approximate and ordered tables.

pub mod bounded_list;
pub mod membership;
pub mod multiset;

pub use bounded_list::{BoundedList, Entry, Largest, MostFrequent, Ranking, Smallest};
pub use membership::{FilterStats, MembershipFilter};
pub use multiset::SortedMultiset;
