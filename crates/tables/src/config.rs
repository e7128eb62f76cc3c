//! Table declarations.
//!
//! The compiler resolves every table declaration in a program to a
//! [`TableConfig`]: the table kind plus its constructor arguments.  A
//! program's declarations form a [`Catalog`], which can be deserialized
//! from YAML or JSON, e.g.:
//!
//! ```yaml
//! word_counts:
//!   kind: top
//!   n: 10
//! latency:
//!   kind: histogram
//!   element: float
//!   min: 0
//!   max: 500
//!   buckets: 50
//! ```

use crate::{
    aggregate::{Table, TableContext},
    TableError,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    str::FromStr,
};

/// Element type of the numeric tables.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    /// 64-bit signed integers.
    #[default]
    Int,

    /// 64-bit floating point.
    Float,
}

/// The kinds of tables, by their canonical names.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Sum,
    Mean,
    Histogram,
    Quantile,
    Distinct,
    Unique,
    Maximum,
    Minimum,
    Top,
    Set,
    Collection,
    Text,
    Stdout,
    Stderr,
    Output,
    Log,
    Mrcounter,
}

impl TableKind {
    pub const ALL: [TableKind; 17] = [
        TableKind::Sum,
        TableKind::Mean,
        TableKind::Histogram,
        TableKind::Quantile,
        TableKind::Distinct,
        TableKind::Unique,
        TableKind::Maximum,
        TableKind::Minimum,
        TableKind::Top,
        TableKind::Set,
        TableKind::Collection,
        TableKind::Text,
        TableKind::Stdout,
        TableKind::Stderr,
        TableKind::Output,
        TableKind::Log,
        TableKind::Mrcounter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Sum => "sum",
            TableKind::Mean => "mean",
            TableKind::Histogram => "histogram",
            TableKind::Quantile => "quantile",
            TableKind::Distinct => "distinct",
            TableKind::Unique => "unique",
            TableKind::Maximum => "maximum",
            TableKind::Minimum => "minimum",
            TableKind::Top => "top",
            TableKind::Set => "set",
            TableKind::Collection => "collection",
            TableKind::Text => "text",
            TableKind::Stdout => "stdout",
            TableKind::Stderr => "stderr",
            TableKind::Output => "output",
            TableKind::Log => "log",
            TableKind::Mrcounter => "mrcounter",
        }
    }
}

impl Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TableKind {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| TableError::UnknownKind(s.to_string()))
    }
}

/// A table kind together with its constructor arguments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableConfig {
    /// Running total.
    Sum {
        #[serde(default)]
        element: ElementType,
    },

    /// Arithmetic mean.  Integer and float inputs accumulate into the same
    /// float sum, so the mean takes no element type.
    Mean,

    /// Counts of values in `buckets` equal-width buckets covering
    /// `[min, max)`.
    Histogram {
        #[serde(default)]
        element: ElementType,
        min: f64,
        max: f64,
        buckets: usize,
    },

    /// The `n - 1` boundaries dividing the values into `n` equal-count
    /// groups.
    Quantile {
        #[serde(default)]
        element: ElementType,
        n: usize,
    },

    /// Approximately deduplicated values, sized for `n` distinct values.
    Distinct { n: usize },

    /// Approximate number of distinct values, sized for `n` of them.
    Unique { n: usize },

    /// The `n` values with the largest weights.
    Maximum { n: usize },

    /// The `n` values with the smallest weights.
    Minimum { n: usize },

    /// The `n` most frequent values.
    Top { n: usize },

    /// Up to `max` distinct values.
    Set { max: usize },

    /// Every value, with its weight.
    Collection,

    /// Every value, without weight.
    Text,

    /// Values written to standard output.
    Stdout,

    /// Values written to standard error.
    Stderr,

    /// Values written to the named side channel.
    Output { channel: String },

    /// Values logged at the severity carried in their weight.
    Log,

    /// Counter increments, keyed by `[group][name]`.
    Mrcounter,
}

impl TableConfig {
    pub fn kind(&self) -> TableKind {
        match self {
            TableConfig::Sum { .. } => TableKind::Sum,
            TableConfig::Mean => TableKind::Mean,
            TableConfig::Histogram { .. } => TableKind::Histogram,
            TableConfig::Quantile { .. } => TableKind::Quantile,
            TableConfig::Distinct { .. } => TableKind::Distinct,
            TableConfig::Unique { .. } => TableKind::Unique,
            TableConfig::Maximum { .. } => TableKind::Maximum,
            TableConfig::Minimum { .. } => TableKind::Minimum,
            TableConfig::Top { .. } => TableKind::Top,
            TableConfig::Set { .. } => TableKind::Set,
            TableConfig::Collection => TableKind::Collection,
            TableConfig::Text => TableKind::Text,
            TableConfig::Stdout => TableKind::Stdout,
            TableConfig::Stderr => TableKind::Stderr,
            TableConfig::Output { .. } => TableKind::Output,
            TableConfig::Log => TableKind::Log,
            TableConfig::Mrcounter => TableKind::Mrcounter,
        }
    }
}

/// The tables declared by a program, by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    tables: BTreeMap<String, TableConfig>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, TableError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_table(mut self, name: impl Into<String>, config: TableConfig) -> Self {
        self.tables.insert(name.into(), config);
        self
    }

    pub fn get(&self, name: &str) -> Result<&TableConfig, TableError> {
        self.tables
            .get(name)
            .ok_or_else(|| TableError::UnknownTable(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.tables.keys().map(String::as_str)
    }

    /// Constructs a fresh instance of the named table.
    pub fn instantiate(&self, name: &str, context: &TableContext) -> Result<Table, TableError> {
        Table::new(self.get(name)?, context)
    }
}

/// Configuration of the group driver.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Log and skip values a table rejects as malformed instead of failing
    /// the whole run.
    pub robust: bool,
}
