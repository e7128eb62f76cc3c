use super::{check_positive, Aggregator};
use crate::{config::TableKind, sink::EmitSink, EmitKey, EmitValue, TableError};
use indexmap::IndexSet;
use std::ops::ControlFlow;
use tracing::debug;

/// Up to `max` distinct values of a group.
///
/// The first value that would grow the set past `max` is dropped and ends
/// the group's aggregation.  Which values survive then depends on arrival
/// order, and across partitions on which partition filled up first.
#[derive(Clone, Debug)]
pub struct Set {
    max: usize,
    combining: bool,
    key: EmitKey,
    values: IndexSet<String>,
}

impl Set {
    pub fn new(max: usize) -> Result<Self, TableError> {
        Ok(Self {
            max: check_positive(TableKind::Set, "max", max)?,
            combining: false,
            key: EmitKey::default(),
            values: IndexSet::new(),
        })
    }
}

impl Aggregator for Set {
    fn kind(&self) -> TableKind {
        TableKind::Set
    }

    fn start(&mut self, key: &EmitKey) {
        self.key = key.clone();
        self.values.clear();
    }

    fn aggregate(
        &mut self,
        value: &EmitValue,
        _sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError> {
        if self.values.insert(value.data().into_owned()) && self.values.len() > self.max {
            self.values.pop();
            debug!(table = %self.key, max = self.max, "set is full");
            return Ok(ControlFlow::Break(()));
        }
        Ok(ControlFlow::Continue(()))
    }

    fn finish(&mut self, sink: &mut dyn EmitSink) -> Result<(), TableError> {
        for value in &self.values {
            sink.emit(&self.key, EmitValue::new(value.clone()))?;
        }
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
