use super::Aggregator;
use crate::{
    config::TableKind,
    number::{add_count, format_float, parse_count, Number},
    sink::EmitSink,
    EmitKey, EmitValue, TableError,
};
use std::ops::ControlFlow;

/// Arithmetic mean of a group's values.
///
/// The accumulator is a `(sum, count)` pair.  A combining instance emits
/// the sum weighted by the count, which the reducing instance absorbs like
/// any other weighted value; only the final output divides.  The mean is
/// always a float.
#[derive(Clone, Debug, Default)]
pub struct Mean {
    combining: bool,
    key: EmitKey,
    sum: f64,
    count: i64,
}

impl Mean {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Aggregator for Mean {
    fn kind(&self) -> TableKind {
        TableKind::Mean
    }

    fn start(&mut self, key: &EmitKey) {
        self.key = key.clone();
        self.sum = 0.0;
        self.count = 0;
    }

    fn aggregate(
        &mut self,
        value: &EmitValue,
        _sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError> {
        let data = value.data();
        let count = add_count(self.count, parse_count(value.weight())?, &data)?;
        self.sum += Number::parse(&data)?.as_f64();
        self.count = count;
        Ok(ControlFlow::Continue(()))
    }

    fn finish(&mut self, sink: &mut dyn EmitSink) -> Result<(), TableError> {
        if self.count == 0 {
            return Ok(());
        }
        let value = if self.combining {
            EmitValue::weighted(format_float(self.sum), self.count.to_string())
        } else {
            EmitValue::new(format_float(self.sum / self.count as f64))
        };
        sink.emit(&self.key, value)
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
    use super::Mean;
    use crate::{
        aggregate::{
            testing::{run, values, weighted},
            Aggregator,
        },
        sink::RecordSink,
        EmitKey, EmitValue, TableError,
    };

    #[test]
    fn combine_and_final() {
        let input = values(["1", "2.0", "3", "4.0"]);
        let mut mean = Mean::new();
        assert_eq!(run(&mut mean, true, &input), [EmitValue::weighted("10.0", "4")]);
        assert_eq!(run(&mut mean, false, &input), [EmitValue::new("2.5")]);
    }

    #[test]
    fn absorbs_partial_counts() {
        let mut mean = Mean::new();
        assert_eq!(
            run(&mut mean, false, &weighted([("10.0", "4"), ("5", "1"), ("0.0", "5")])),
            [EmitValue::new("1.5")]
        );
    }

    #[test]
    fn integer_inputs_do_not_truncate() {
        let mut mean = Mean::new();
        assert_eq!(run(&mut mean, false, &values(["1", "2"])), [EmitValue::new("1.5")]);
    }

    #[test]
    fn count_overflow() {
        let mut mean = Mean::new();
        let mut sink = RecordSink::new();
        mean.set_combining(true);
        mean.start(&EmitKey::new("t"));
        mean.aggregate(&EmitValue::weighted("1.0", i64::MAX.to_string()), &mut sink)
            .unwrap();
        assert!(matches!(
            mean.aggregate(&EmitValue::new("2"), &mut sink),
            Err(TableError::Overflow(_))
        ));

        // The rejected value does not leak into the partial aggregate.
        mean.finish(&mut sink).unwrap();
        assert_eq!(
            sink.values(),
            [EmitValue::weighted("1.0", i64::MAX.to_string())]
        );
    }

    #[test]
    fn empty_group_emits_nothing() {
        assert!(run(&mut Mean::new(), false, &[]).is_empty());
    }
}
