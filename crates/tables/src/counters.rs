//! Named counters updated by `mrcounter` tables.

use metrics::counter;
use std::{
    collections::BTreeMap,
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::warn;

/// Name of the metric [`MetricsCounters`] reports increments under.
pub const MRCOUNTER_METRIC: &str = "tables_mrcounter_total";

/// Destination of counter increments.  Counters are identified by a group
/// and a name.
pub trait Counters: Debug + Send + Sync {
    fn increment(&self, group: &str, name: &str, delta: i64);
}

/// Reports counters through the [`metrics`] facade, as the
/// [`MRCOUNTER_METRIC`] counter labeled with `group` and `name`.
///
/// Metric counters cannot decrease, so negative increments are dropped with
/// a warning.
#[derive(Clone, Debug, Default)]
pub struct MetricsCounters;

impl Counters for MetricsCounters {
    fn increment(&self, group: &str, name: &str, delta: i64) {
        match u64::try_from(delta) {
            Ok(delta) => counter!(
                MRCOUNTER_METRIC,
                "group" => group.to_string(),
                "name" => name.to_string()
            )
            .increment(delta),
            Err(_) => warn!("dropping negative increment {delta} of counter {group}.{name}"),
        }
    }
}

/// Keeps counters in memory.  Clones share the same counters.
#[derive(Clone, Debug, Default)]
pub struct CounterMap(Arc<Mutex<BTreeMap<(String, String), i64>>>);

impl CounterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter, zero if it was never incremented.
    pub fn get(&self, group: &str, name: &str) -> i64 {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(group.to_string(), name.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<(String, String), i64> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Counters for CounterMap {
    /// Saturates at the bounds of `i64`.
    fn increment(&self, group: &str, name: &str, delta: i64) {
        let mut counters = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = counters
            .entry((group.to_string(), name.to_string()))
            .or_insert(0);
        *counter = counter.saturating_add(delta);
    }
}
