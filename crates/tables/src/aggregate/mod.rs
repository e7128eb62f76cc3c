//! Tables: the aggregators a program attaches its results to.
//!
//! A table instance is constructed once per worker from a [`TableConfig`]
//! and then serves one group (one [`EmitKey`]) at a time:
//!
//! * [`Aggregator::start`] resets the per-key state,
//! * [`Aggregator::aggregate`] ingests the group's values one by one,
//! * [`Aggregator::finish`] emits the group's result.
//!
//! The same instance is reused by calling `start` again.
//!
//! # Combining
//!
//! A table whose accumulation is associative and commutative may also run
//! in the combine phase, next to the producers, to shrink the data shipped
//! to the reduce phase.  In that mode `finish` emits an intermediate
//! representation of the accumulator instead of the human-readable result:
//! e.g., a mean emits `sum weight count` rather than `sum / count`.  The
//! reduce phase feeds these intermediate values back into a fresh instance
//! of the same table, which must produce the same result as if it had seen
//! all raw values.  This is the same `Agg(x + y) = Agg(x) + Agg(y)` contract
//! semigroup aggregates obey, with the emitted values playing the role of
//! the accumulator.

use crate::{
    algebra::{Largest, Smallest},
    config::{ElementType, TableConfig, TableKind},
    counters::{Counters, MetricsCounters},
    sink::{EmitSink, SideChannels},
    EmitKey, EmitValue, TableError,
};
use ordered_float::OrderedFloat;
use std::{ops::ControlFlow, sync::Arc};
use tracing::Dispatch;

mod channel;
mod distinct;
mod extremal;
mod histogram;
mod mean;
mod mrcounter;
mod passthrough;
mod quantile;
mod set;
mod sum;
mod top;

pub use channel::{ChannelTable, Log, Severity, LOG_TARGET};
pub use distinct::{Distinct, Unique};
pub use extremal::{Extremal, ExtremalRanking, Maximum, Minimum};
pub use histogram::{FloatHistogram, Histogram, IntHistogram};
pub use mean::Mean;
pub use mrcounter::Mrcounter;
pub use passthrough::{Collection, Text};
pub use quantile::{FloatQuantile, IntQuantile, Quantile};
pub use set::Set;
pub use sum::Sum;
pub use top::Top;

/// The interface every table implements.
pub trait Aggregator {
    fn kind(&self) -> TableKind;

    /// Prepares the table for the group identified by `key`, discarding any
    /// state left over from the previous group.
    fn start(&mut self, key: &EmitKey);

    /// Ingests one value of the current group.
    ///
    /// Tables that forward values as they arrive write them to `sink`.
    /// Returns [`ControlFlow::Break`] if the table dropped this value and
    /// does not accept any more values for this group; the caller must then
    /// skip to [`Self::finish`].
    fn aggregate(
        &mut self,
        value: &EmitValue,
        sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError>;

    /// Emits the result for the current group.
    fn finish(&mut self, sink: &mut dyn EmitSink) -> Result<(), TableError>;

    /// Returns true if any grouping of partial aggregates yields the same
    /// result.
    fn is_associative(&self) -> bool {
        false
    }

    /// Returns true if the order in which values arrive does not matter.
    fn is_commutative(&self) -> bool {
        false
    }

    /// Selects the combine-phase (`true`) or final (`false`) output
    /// encoding.  Set by the driver before the first `start`.
    fn set_combining(&mut self, combining: bool);

    fn is_combining(&self) -> bool;

    /// Returns true if the table may run in the combine phase.
    fn is_combinable(&self) -> bool {
        self.is_associative() && self.is_commutative()
    }
}

/// Handles injected into tables at construction.
#[derive(Clone, Debug)]
pub struct TableContext {
    pub channels: SideChannels,
    pub counters: Arc<dyn Counters>,
    /// Receives the events of `log` tables.  Defaults to the dispatcher
    /// that is current when the context is created.
    pub dispatch: Dispatch,
}

impl Default for TableContext {
    fn default() -> Self {
        Self {
            channels: SideChannels::default(),
            counters: Arc::new(MetricsCounters),
            dispatch: Dispatch::default(),
        }
    }
}

impl TableContext {
    pub fn with_channels(mut self, channels: SideChannels) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_counters(mut self, counters: Arc<dyn Counters>) -> Self {
        self.counters = counters;
        self
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }
}

/// Any table.
#[derive(Debug)]
pub enum Table {
    Sum(Sum),
    Mean(Mean),
    IntHistogram(IntHistogram),
    FloatHistogram(FloatHistogram),
    IntQuantile(IntQuantile),
    FloatQuantile(FloatQuantile),
    Distinct(Distinct),
    Unique(Unique),
    Maximum(Maximum),
    Minimum(Minimum),
    Top(Top),
    Set(Set),
    Collection(Collection),
    Text(Text),
    Channel(ChannelTable),
    Log(Log),
    Mrcounter(Mrcounter),
}

macro_rules! dispatch {
    ($table:expr, $inner:ident => $body:expr) => {
        match $table {
            Table::Sum($inner) => $body,
            Table::Mean($inner) => $body,
            Table::IntHistogram($inner) => $body,
            Table::FloatHistogram($inner) => $body,
            Table::IntQuantile($inner) => $body,
            Table::FloatQuantile($inner) => $body,
            Table::Distinct($inner) => $body,
            Table::Unique($inner) => $body,
            Table::Maximum($inner) => $body,
            Table::Minimum($inner) => $body,
            Table::Top($inner) => $body,
            Table::Set($inner) => $body,
            Table::Collection($inner) => $body,
            Table::Text($inner) => $body,
            Table::Channel($inner) => $body,
            Table::Log($inner) => $body,
            Table::Mrcounter($inner) => $body,
        }
    };
}

impl Table {
    /// Constructs a table from its declaration, validating the constructor
    /// arguments.
    pub fn new(config: &TableConfig, context: &TableContext) -> Result<Self, TableError> {
        let table = match config {
            TableConfig::Sum { element } => Table::Sum(Sum::new(*element)),
            TableConfig::Mean => Table::Mean(Mean::new()),
            TableConfig::Histogram {
                element: ElementType::Int,
                min,
                max,
                buckets,
            } => Table::IntHistogram(Histogram::new(*min, *max, *buckets)?),
            TableConfig::Histogram {
                element: ElementType::Float,
                min,
                max,
                buckets,
            } => Table::FloatHistogram(Histogram::new(*min, *max, *buckets)?),
            TableConfig::Quantile {
                element: ElementType::Int,
                n,
            } => Table::IntQuantile(Quantile::new(*n)?),
            TableConfig::Quantile {
                element: ElementType::Float,
                n,
            } => Table::FloatQuantile(Quantile::new(*n)?),
            TableConfig::Distinct { n } => Table::Distinct(Distinct::new(*n)?),
            TableConfig::Unique { n } => Table::Unique(Unique::new(*n)?),
            TableConfig::Maximum { n } => Table::Maximum(Extremal::<Largest>::new(*n)?),
            TableConfig::Minimum { n } => Table::Minimum(Extremal::<Smallest>::new(*n)?),
            TableConfig::Top { n } => Table::Top(Top::new(*n)?),
            TableConfig::Set { max } => Table::Set(Set::new(*max)?),
            TableConfig::Collection => Table::Collection(Collection::new()),
            TableConfig::Text => Table::Text(Text::new()),
            TableConfig::Stdout => Table::Channel(ChannelTable::new(
                TableKind::Stdout,
                context.channels.stdout().clone(),
            )),
            TableConfig::Stderr => Table::Channel(ChannelTable::new(
                TableKind::Stderr,
                context.channels.stderr().clone(),
            )),
            TableConfig::Output { channel } => Table::Channel(ChannelTable::new(
                TableKind::Output,
                context.channels.output(channel)?.clone(),
            )),
            TableConfig::Log => Table::Log(Log::new(context.dispatch.clone())),
            TableConfig::Mrcounter => Table::Mrcounter(Mrcounter::new(context.counters.clone())),
        };
        Ok(table)
    }
}

impl Aggregator for Table {
    fn kind(&self) -> TableKind {
        dispatch!(self, table => table.kind())
    }

    fn start(&mut self, key: &EmitKey) {
        dispatch!(self, table => table.start(key))
    }

    fn aggregate(
        &mut self,
        value: &EmitValue,
        sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError> {
        dispatch!(self, table => table.aggregate(value, sink))
    }

    fn finish(&mut self, sink: &mut dyn EmitSink) -> Result<(), TableError> {
        dispatch!(self, table => table.finish(sink))
    }

    fn is_associative(&self) -> bool {
        dispatch!(self, table => table.is_associative())
    }

    fn is_commutative(&self) -> bool {
        dispatch!(self, table => table.is_commutative())
    }

    fn set_combining(&mut self, combining: bool) {
        dispatch!(self, table => table.set_combining(combining))
    }

    fn is_combining(&self) -> bool {
        dispatch!(self, table => table.is_combining())
    }
}

/// Fails unless a size argument is at least one.
pub(crate) fn check_positive(
    kind: TableKind,
    argument: &str,
    value: usize,
) -> Result<usize, TableError> {
    if value == 0 {
        return Err(TableError::config(
            kind.name(),
            format!("{argument} must be at least 1"),
        ));
    }
    Ok(value)
}

/// Float element type of histograms and quantiles.
pub type FloatElement = OrderedFloat<f64>;

#[cfg(test)]
pub(crate) mod testing {
    use super::{Aggregator, Table, TableContext};
    use crate::{config::TableConfig, sink::RecordSink, EmitKey, EmitValue};

    pub fn key() -> EmitKey {
        EmitKey::new("t")
    }

    pub fn values<I, S>(data: I) -> Vec<EmitValue>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        data.into_iter().map(EmitValue::new).collect()
    }

    pub fn weighted<'a, I>(data: I) -> Vec<EmitValue>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        data.into_iter()
            .map(|(value, weight)| EmitValue::weighted(value, weight))
            .collect()
    }

    /// Runs one group through `table` and returns everything it emitted.
    pub fn run<A>(table: &mut A, combining: bool, values: &[EmitValue]) -> Vec<EmitValue>
    where
        A: Aggregator + ?Sized,
    {
        let mut sink = RecordSink::new();
        table.set_combining(combining);
        table.start(&key());
        for value in values {
            if table.aggregate(value, &mut sink).unwrap().is_break() {
                break;
            }
        }
        table.finish(&mut sink).unwrap();
        assert!(sink.records().iter().all(|record| record.key == key()));
        sink.values()
    }

    /// Runs each partition through its own combining instance, then reduces
    /// everything the partitions emitted.
    pub fn combine_then_reduce(config: &TableConfig, partitions: &[Vec<EmitValue>]) -> Vec<EmitValue> {
        let context = TableContext::default();
        let mut combined = Vec::new();
        for partition in partitions {
            let mut table = Table::new(config, &context).unwrap();
            assert!(table.is_combinable());
            combined.extend(run(&mut table, true, partition));
        }
        let mut table = Table::new(config, &context).unwrap();
        run(&mut table, false, &combined)
    }

    /// Reduces all values in a single pass.
    pub fn reduce(config: &TableConfig, values: &[EmitValue]) -> Vec<EmitValue> {
        let mut table = Table::new(config, &TableContext::default()).unwrap();
        run(&mut table, false, values)
    }

    pub fn rendered(values: &[EmitValue]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }
}
