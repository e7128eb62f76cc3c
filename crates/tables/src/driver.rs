//! Reference driver for the combine and reduce phases.
//!
//! The host pipeline owns grouping and scheduling; this driver implements
//! the per-group protocol on top of an already grouped record stream, for
//! embedders and tests.

use crate::{
    aggregate::{Aggregator, Table, TableContext},
    config::{Catalog, DriverConfig},
    sink::EmitSink,
    EmitKey, EmitRecord, EmitValue, TableError,
};
use hashbrown::HashMap;
use itertools::Itertools;
use std::{
    borrow::Borrow,
    fmt::{self, Display},
    ops::{AddAssign, ControlFlow},
};
use tracing::{debug, info, warn};

/// The phase a table runs in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Partial aggregation next to the producers.
    Combine,
    /// Final aggregation producing the results.
    Reduce,
}

impl Phase {
    pub fn is_combining(self) -> bool {
        self == Phase::Combine
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Combine => f.write_str("combine"),
            Phase::Reduce => f.write_str("reduce"),
        }
    }
}

/// What happened while running groups.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of groups run.
    pub groups: usize,
    /// Number of values the tables accepted.
    pub values: usize,
    /// Number of malformed values skipped in robust mode.
    pub skipped: usize,
    /// Number of groups whose table stopped accepting values early.
    pub stopped_early: usize,
}

impl AddAssign for RunSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.groups += rhs.groups;
        self.values += rhs.values;
        self.skipped += rhs.skipped;
        self.stopped_early += rhs.stopped_early;
    }
}

/// Runs groups of values through tables.
#[derive(Clone, Debug, Default)]
pub struct GroupDriver {
    config: DriverConfig,
}

impl GroupDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Runs one group: `start(key)`, `aggregate` for each value until the
    /// table breaks, then `finish`.
    ///
    /// Fails with [`TableError::NotCombinable`] if asked to run a table
    /// that is not associative and commutative in the combine phase.  In
    /// robust mode, values the table rejects as malformed are logged and
    /// skipped; any other error aborts the group.
    pub fn run_group<A, I>(
        &self,
        table: &mut A,
        phase: Phase,
        key: &EmitKey,
        values: I,
        sink: &mut dyn EmitSink,
    ) -> Result<RunSummary, TableError>
    where
        A: Aggregator + ?Sized,
        I: IntoIterator,
        I::Item: Borrow<EmitValue>,
    {
        if phase.is_combining() && !table.is_combinable() {
            return Err(TableError::NotCombinable(format!(
                "{key} ({})",
                table.kind()
            )));
        }

        let mut summary = RunSummary {
            groups: 1,
            ..RunSummary::default()
        };
        table.set_combining(phase.is_combining());
        table.start(key);
        for value in values {
            let value: &EmitValue = value.borrow();
            match table.aggregate(value, sink) {
                Ok(ControlFlow::Continue(())) => summary.values += 1,
                // The value that made the table break is not kept.
                Ok(ControlFlow::Break(())) => {
                    summary.stopped_early += 1;
                    debug!(
                        table = %key,
                        %phase,
                        values = summary.values,
                        "table stopped accepting values"
                    );
                    break;
                }
                Err(error) if self.config.robust && error.is_malformed_input() => {
                    warn!(table = %key, %phase, "skipping value {value}: {error}");
                    summary.skipped += 1;
                }
                Err(error) => return Err(error),
            }
        }
        table.finish(sink)?;
        Ok(summary)
    }

    /// Runs a stream of records in which all records sharing a key are
    /// adjacent, starting a new group at every change of key.  Each table
    /// named by a key is instantiated from `catalog` once and reused for
    /// all of its groups.
    pub fn run<I>(
        &self,
        catalog: &Catalog,
        context: &TableContext,
        phase: Phase,
        records: I,
        sink: &mut dyn EmitSink,
    ) -> Result<RunSummary, TableError>
    where
        I: IntoIterator<Item = EmitRecord>,
    {
        let mut tables: HashMap<String, Table> = HashMap::new();
        let mut summary = RunSummary::default();

        let groups = records
            .into_iter()
            .chunk_by(|record| record.key.clone());
        for (key, group) in &groups {
            let table = match tables.entry_ref(key.table()) {
                hashbrown::hash_map::EntryRef::Occupied(entry) => entry.into_mut(),
                hashbrown::hash_map::EntryRef::Vacant(entry) => {
                    entry.insert(catalog.instantiate(key.table(), context)?)
                }
            };
            summary += self.run_group(
                table,
                phase,
                &key,
                group.map(|record| record.value),
                sink,
            )?;
        }

        info!(
            %phase,
            groups = summary.groups,
            values = summary.values,
            skipped = summary.skipped,
            "finished {} tables",
            tables.len()
        );
        Ok(summary)
    }
}
