//! Approximate deduplication backed by a per-key membership filter.
//!
//! Both tables test every value against a Bloom filter sized for the
//! declared number of distinct values and act only on values the filter
//! has not seen.  False positives make a value look like a duplicate, so
//! both tables may under-report by roughly the filter's false-positive
//! rate.

use super::{check_positive, Aggregator};
use crate::{
    algebra::MembershipFilter, config::TableKind, sink::EmitSink, EmitKey, EmitValue, TableError,
};
use std::ops::ControlFlow;
use tracing::debug;

/// Forwards each distinct value of a group once.
#[derive(Debug)]
pub struct Distinct {
    combining: bool,
    key: EmitKey,
    filter: MembershipFilter,
}

impl Distinct {
    pub fn new(expected_items: usize) -> Result<Self, TableError> {
        check_positive(TableKind::Distinct, "expected item count", expected_items)?;
        Ok(Self {
            combining: false,
            key: EmitKey::default(),
            filter: MembershipFilter::with_expected_items(expected_items),
        })
    }
}

impl Aggregator for Distinct {
    fn kind(&self) -> TableKind {
        TableKind::Distinct
    }

    fn start(&mut self, key: &EmitKey) {
        self.key = key.clone();
        self.filter.reset();
    }

    fn aggregate(
        &mut self,
        value: &EmitValue,
        sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError> {
        if !self.filter.check_and_insert(&value.data()) {
            sink.emit(&self.key, value.clone())?;
        }
        Ok(ControlFlow::Continue(()))
    }

    fn finish(&mut self, _sink: &mut dyn EmitSink) -> Result<(), TableError> {
        debug!(table = %self.key, stats = ?self.filter.stats(), "distinct finished");
        Ok(())
    }

    fn is_associative(&self) -> bool {
        true
    }

    fn is_commutative(&self) -> bool {
        true
    }

    fn set_combining(&mut self, combining: bool) {
        self.combining = combining;
    }

    fn is_combining(&self) -> bool {
        self.combining
    }
}

/// Counts the distinct values of a group.
///
/// A combining instance forwards each distinct value instead of counting,
/// so that the reducing instance can deduplicate across partitions.
#[derive(Debug)]
pub struct Unique {
    combining: bool,
    key: EmitKey,
    filter: MembershipFilter,
    count: u64,
}

impl Unique {
    pub fn new(expected_items: usize) -> Result<Self, TableError> {
        check_positive(TableKind::Unique, "expected item count", expected_items)?;
        Ok(Self {
            combining: false,
            key: EmitKey::default(),
            filter: MembershipFilter::with_expected_items(expected_items),
            count: 0,
        })
    }
}

impl Aggregator for Unique {
    fn kind(&self) -> TableKind {
        TableKind::Unique
    }

    fn start(&mut self, key: &EmitKey) {
        self.key = key.clone();
        self.filter.reset();
        self.count = 0;
    }

    fn aggregate(
        &mut self,
        value: &EmitValue,
        sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError> {
        if !self.filter.check_and_insert(&value.data()) {
            self.count += 1;
            if self.combining {
                sink.emit(&self.key, value.unweighted())?;
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn finish(&mut self, sink: &mut dyn EmitSink) -> Result<(), TableError> {
        debug!(table = %self.key, stats = ?self.filter.stats(), "unique finished");
        if self.combining {
            return Ok(());
        }
        sink.emit(&self.key, EmitValue::new(self.count.to_string()))
    }

    fn is_associative(&self) -> bool {
        true
    }

    fn is_commutative(&self) -> bool {
        true
    }

    fn set_combining(&mut self, combining: bool) {
        self.combining = combining;
    }

    fn is_combining(&self) -> bool {
        self.combining
    }
}
