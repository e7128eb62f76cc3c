use super::Aggregator;
use crate::{
    config::TableKind, counters::Counters, number::parse_count, sink::EmitSink, EmitKey,
    EmitValue, TableError,
};
use std::{ops::ControlFlow, sync::Arc};

/// Folds value weights into named counters.
///
/// The table is indexed `[group][name]`; each value adds its weight
/// (default 1) to that counter.  Counters are updated during the combine
/// phase only, where every record is seen exactly once; the table emits
/// nothing.
#[derive(Clone, Debug)]
pub struct Mrcounter {
    counters: Arc<dyn Counters>,
    combining: bool,
    key: EmitKey,
    counter: Option<(String, String)>,
}

impl Mrcounter {
    pub fn new(counters: Arc<dyn Counters>) -> Self {
        Self {
            counters,
            combining: false,
            key: EmitKey::default(),
            counter: None,
        }
    }
}

impl Aggregator for Mrcounter {
    fn kind(&self) -> TableKind {
        TableKind::Mrcounter
    }

    fn start(&mut self, key: &EmitKey) {
        self.key = key.clone();
        self.counter = match key.subscripts().as_deref() {
            Some([group, name]) => Some((group.to_string(), name.to_string())),
            _ => None,
        };
    }

    fn aggregate(
        &mut self,
        value: &EmitValue,
        _sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError> {
        if !self.combining {
            return Ok(ControlFlow::Continue(()));
        }
        let Some((group, name)) = &self.counter else {
            return Err(TableError::CounterIndex(self.key.index().to_string()));
        };
        self.counters
            .increment(group, name, parse_count(value.weight())?);
        Ok(ControlFlow::Continue(()))
    }

    fn finish(&mut self, _sink: &mut dyn EmitSink) -> Result<(), TableError> {
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

#[cfg(test)]
mod test {
    use super::Mrcounter;
    use crate::{
        aggregate::Aggregator, counters::CounterMap, sink::RecordSink, EmitKey, EmitValue,
        TableError,
    };
    use std::sync::Arc;

    fn feed(table: &mut Mrcounter, key: &EmitKey, values: &[EmitValue]) -> Result<(), TableError> {
        let mut sink = RecordSink::new();
        table.start(key);
        for value in values {
            table.aggregate(value, &mut sink)?;
        }
        table.finish(&mut sink)?;
        assert!(sink.records().is_empty());
        Ok(())
    }

    #[test]
    fn counts_in_combine_phase() {
        let counters = CounterMap::new();
        let mut table = Mrcounter::new(Arc::new(counters.clone()));
        let key = EmitKey::indexed("counters", ["io", "reads"]);
        let values = [
            EmitValue::new("x"),
            EmitValue::weighted("y", "10"),
            EmitValue::weighted("z", "-2"),
        ];

        table.set_combining(true);
        feed(&mut table, &key, &values).unwrap();
        assert_eq!(counters.get("io", "reads"), 9);

        // Reduce-phase values were already counted.
        table.set_combining(false);
        feed(&mut table, &key, &values).unwrap();
        assert_eq!(counters.get("io", "reads"), 9);
    }

    #[test]
    fn index_must_name_a_counter() {
        let mut table = Mrcounter::new(Arc::new(CounterMap::new()));
        table.set_combining(true);
        for key in [
            EmitKey::new("counters"),
            EmitKey::indexed("counters", ["io"]),
            EmitKey::with_index("counters", "[io]reads"),
        ] {
            assert!(matches!(
                feed(&mut table, &key, &[EmitValue::new("x")]),
                Err(TableError::CounterIndex(_))
            ));
        }
    }
}
