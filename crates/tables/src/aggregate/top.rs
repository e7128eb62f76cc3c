use super::{check_positive, Aggregator};
use crate::{
    algebra::{BoundedList, MostFrequent},
    config::TableKind,
    number::{add_count, parse_count},
    sink::EmitSink,
    EmitKey, EmitValue, TableError,
};
use hashbrown::HashMap;
use std::ops::ControlFlow;

/// The `n` most frequent values of a group.
///
/// Values are counted exactly per partition; a combining instance emits
/// every count without truncating to `n`, and only the final output
/// selects the `n` heaviest.  The result is exact for one group on one
/// machine, and an approximation of true heavy hitters only insofar as
/// the host pipeline samples or truncates combine output.
#[derive(Clone, Debug)]
pub struct Top {
    n: usize,
    combining: bool,
    key: EmitKey,
    counts: HashMap<String, i64>,
}

impl Top {
    pub fn new(n: usize) -> Result<Self, TableError> {
        Ok(Self {
            n: check_positive(TableKind::Top, "n", n)?,
            combining: false,
            key: EmitKey::default(),
            counts: HashMap::new(),
        })
    }
}

impl Aggregator for Top {
    fn kind(&self) -> TableKind {
        TableKind::Top
    }

    fn start(&mut self, key: &EmitKey) {
        self.key = key.clone();
        self.counts.clear();
    }

    fn aggregate(
        &mut self,
        value: &EmitValue,
        _sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError> {
        let count = parse_count(value.weight())?;
        let data = value.data();
        let total = self.counts.entry_ref(&*data).or_insert(0);
        *total = add_count(*total, count, &data)?;
        Ok(ControlFlow::Continue(()))
    }

    fn finish(&mut self, sink: &mut dyn EmitSink) -> Result<(), TableError> {
        if self.combining {
            for (value, count) in &self.counts {
                sink.emit(
                    &self.key,
                    EmitValue::weighted(value.clone(), count.to_string()),
                )?;
            }
            return Ok(());
        }

        let mut top = BoundedList::<MostFrequent>::new(self.n);
        for (value, count) in &self.counts {
            top.offer(value, *count);
        }
        for entry in &top {
            let value = EmitValue::from_fields(
                [entry.value.clone(), entry.weight.to_string(), "0".to_string()],
                None,
            )?;
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
