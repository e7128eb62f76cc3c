//! Aggregation tables for two-phase, key-grouped batch programs.
//!
//! A program emits values into named tables.  The surrounding pipeline
//! groups the emitted [`EmitRecord`]s by [`EmitKey`] and runs each group
//! through an instance of the table's [`Aggregator`]: first, optionally, in
//! a combine phase next to the producers, then in a reduce phase that
//! merges the combine output into the final, human-readable result.
//!
//! ```
//! use feldera_tables::{
//!     Catalog, DriverConfig, EmitKey, EmitRecord, EmitValue, GroupDriver, Phase, RecordSink,
//!     TableContext,
//! };
//!
//! let catalog = Catalog::from_yaml("latency:\n  kind: mean\n").unwrap();
//! let records = ["10", "20", "60"]
//!     .map(|v| EmitRecord::new(EmitKey::new("latency"), EmitValue::new(v)));
//!
//! let driver = GroupDriver::new(DriverConfig::default());
//! let context = TableContext::default();
//!
//! let mut combined = RecordSink::new();
//! driver
//!     .run(&catalog, &context, Phase::Combine, records, &mut combined)
//!     .unwrap();
//! assert_eq!(combined.lines(), ["latency = 90.0 weight 3"]);
//!
//! let mut result = RecordSink::new();
//! driver
//!     .run(&catalog, &context, Phase::Reduce, combined.into_records(), &mut result)
//!     .unwrap();
//! assert_eq!(result.lines(), ["latency = 30.0"]);
//! ```

pub mod aggregate;
pub mod algebra;
pub mod config;
pub mod counters;
pub mod driver;
pub mod emit;
pub mod error;
pub mod number;
pub mod sink;
pub mod wire;

pub use aggregate::{Aggregator, Table, TableContext};
pub use config::{Catalog, DriverConfig, ElementType, TableConfig, TableKind};
pub use counters::{CounterMap, Counters, MetricsCounters};
pub use driver::{GroupDriver, Phase, RunSummary};
pub use emit::{EmitKey, EmitRecord, EmitValue};
pub use error::TableError;
pub use sink::{EmitSink, RecordSink, SharedBuffer, SideChannel, SideChannels, TextSink};
pub use wire::{decode_records, encode_records};
