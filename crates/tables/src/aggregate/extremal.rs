use super::{check_positive, Aggregator};
use crate::{
    algebra::{BoundedList, Largest, Ranking, Smallest},
    config::TableKind,
    number::Number,
    sink::EmitSink,
    EmitKey, EmitValue, TableError,
};
use std::ops::ControlFlow;

/// Ranking of an extremal table.
pub trait ExtremalRanking: Ranking<Weight = Number> {
    const KIND: TableKind;
}

impl ExtremalRanking for Largest {
    const KIND: TableKind = TableKind::Maximum;
}

impl ExtremalRanking for Smallest {
    const KIND: TableKind = TableKind::Minimum;
}

/// The `n` values of a group with the most extreme weights.
///
/// A value without weight gets the worst possible weight: it is kept only
/// while the list has room, and is emitted without weight.  Global top-`n`
/// is the top-`n` of the partitions' top-`n`s, so both phases emit the
/// kept items the same way.
#[derive(Clone, Debug)]
pub struct Extremal<R: ExtremalRanking> {
    combining: bool,
    key: EmitKey,
    list: BoundedList<R>,
}

/// Values with the largest weights, heaviest first.
pub type Maximum = Extremal<Largest>;

/// Values with the smallest weights, lightest first.
pub type Minimum = Extremal<Smallest>;

impl<R: ExtremalRanking> Extremal<R> {
    pub fn new(n: usize) -> Result<Self, TableError> {
        Ok(Self {
            combining: false,
            key: EmitKey::default(),
            list: BoundedList::new(check_positive(R::KIND, "n", n)?),
        })
    }
}

impl<R: ExtremalRanking> Aggregator for Extremal<R> {
    fn kind(&self) -> TableKind {
        R::KIND
    }

    fn start(&mut self, key: &EmitKey) {
        self.key = key.clone();
        self.list.clear();
    }

    fn aggregate(
        &mut self,
        value: &EmitValue,
        _sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError> {
        let weight = match value.weight() {
            Some(weight) => Number::parse(weight)?,
            None => R::sentinel(),
        };
        self.list.offer(&value.data(), weight);
        Ok(ControlFlow::Continue(()))
    }

    fn finish(&mut self, sink: &mut dyn EmitSink) -> Result<(), TableError> {
        let sentinel = R::sentinel();
        for entry in &self.list {
            let value = if entry.weight == sentinel {
                EmitValue::new(entry.value.clone())
            } else {
                EmitValue::weighted(entry.value.clone(), entry.weight.to_string())
            };
            sink.emit(&self.key, value)?;
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
