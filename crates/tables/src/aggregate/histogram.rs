use super::{check_positive, Aggregator, FloatElement};
use crate::{
    algebra::SortedMultiset,
    config::TableKind,
    number::{add_count, parse_count, Scalar},
    sink::EmitSink,
    EmitKey, EmitValue, TableError,
};
use itertools::Itertools;
use std::ops::ControlFlow;
use tracing::trace;

/// Counts of a group's values in `buckets` equal-width buckets covering
/// `[min, max)`.
///
/// Values are accumulated exactly in a sorted multiset and only bucketed
/// in the final output, so the combine phase emits one weighted entry per
/// distinct value.
#[derive(Clone, Debug)]
pub struct Histogram<T> {
    min: f64,
    max: f64,
    buckets: usize,
    combining: bool,
    key: EmitKey,
    values: SortedMultiset<T>,
}

pub type IntHistogram = Histogram<i64>;
pub type FloatHistogram = Histogram<FloatElement>;

impl<T: Scalar> Histogram<T> {
    pub fn new(min: f64, max: f64, buckets: usize) -> Result<Self, TableError> {
        check_positive(TableKind::Histogram, "bucket count", buckets)?;
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(TableError::config(
                TableKind::Histogram.name(),
                format!("range [{min}, {max}) is empty or unbounded"),
            ));
        }
        Ok(Self {
            min,
            max,
            buckets,
            combining: false,
            key: EmitKey::default(),
            values: SortedMultiset::new(),
        })
    }

    fn bucket(&self, value: f64) -> usize {
        let step = (self.max - self.min) / self.buckets as f64;
        // Rounding can push values just below `max` past the last bucket.
        (((value - self.min) / step).floor() as usize).min(self.buckets - 1)
    }
}

impl<T: Scalar> Aggregator for Histogram<T> {
    fn kind(&self) -> TableKind {
        TableKind::Histogram
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
        let element = T::parse(&value.data())?;
        let x = element.to_f64();
        if !(self.min..self.max).contains(&x) {
            return Err(TableError::OutOfRange {
                value: element.render(),
                min: self.min,
                max: self.max,
            });
        }
        self.values.insert(element, parse_count(value.weight())?)?;
        Ok(ControlFlow::Continue(()))
    }

    fn finish(&mut self, sink: &mut dyn EmitSink) -> Result<(), TableError> {
        if self.combining {
            for (element, count) in self.values.iter() {
                sink.emit(
                    &self.key,
                    EmitValue::weighted(element.render(), count.to_string()),
                )?;
            }
            return Ok(());
        }

        let mut counts = vec![0i64; self.buckets];
        for (element, count) in self.values.iter() {
            let bucket = &mut counts[self.bucket(element.to_f64())];
            *bucket = add_count(*bucket, count, &element.render())?;
        }
        trace!(
            table = %self.key,
            values = self.values.len(),
            total = self.values.total(),
            "histogram finished"
        );
        sink.emit(
            &self.key,
            EmitValue::new(format!("{{{}}}", counts.iter().join(", "))),
        )
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
    use super::{FloatHistogram, IntHistogram};
    use crate::{
        aggregate::{
            testing::{run, values},
            Aggregator,
        },
        sink::RecordSink,
        EmitKey, EmitValue, TableError,
    };
    use rand::{seq::SliceRandom, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// 575 distinct integers from `[-400, 400)`.
    fn sample() -> Vec<EmitValue> {
        let mut rng = ChaCha8Rng::seed_from_u64(575);
        let mut population: Vec<i64> = (-400..400).collect();
        population.shuffle(&mut rng);
        population[..575]
            .iter()
            .map(|n| EmitValue::new(n.to_string()))
            .collect()
    }

    fn bucket_counts(value: &EmitValue) -> Vec<i64> {
        value
            .data()
            .trim_start_matches('{')
            .trim_end_matches('}')
            .split(", ")
            .map(|count| count.parse().unwrap())
            .collect()
    }

    #[test]
    fn sample_histogram() {
        let input = sample();
        let mut histogram = IntHistogram::new(-400.0, 400.0, 8).unwrap();

        let combined = run(&mut histogram, true, &input);
        assert_eq!(combined.len(), 575);
        assert!(combined.iter().all(|value| value.weight() == Some("1")));

        let result = run(&mut histogram, false, &input);
        assert_eq!(result.len(), 1);
        let counts = bucket_counts(&result[0]);
        assert_eq!(counts.len(), 8);
        assert_eq!(counts.iter().sum::<i64>(), 575);

        // Reducing the combine output gives the same buckets.
        assert_eq!(run(&mut histogram, false, &combined), result);
    }

    #[test]
    fn bucketing() {
        let mut histogram = FloatHistogram::new(0.0, 1.0, 4).unwrap();
        let input = values(["0.0", "0.1", "0.25", "0.6", "0.99999999999999994", "0.75"]);
        assert_eq!(
            run(&mut histogram, false, &input),
            [EmitValue::new("{2, 1, 1, 2}")]
        );
    }

    #[test]
    fn weights_are_counts() {
        let mut histogram = IntHistogram::new(0.0, 10.0, 2).unwrap();
        let input = vec![
            EmitValue::weighted("1", "3"),
            EmitValue::new("1"),
            EmitValue::weighted("7", "5"),
        ];
        assert_eq!(
            run(&mut histogram, true, &input),
            [EmitValue::weighted("1", "4"), EmitValue::weighted("7", "5")]
        );
        assert_eq!(run(&mut histogram, false, &input), [EmitValue::new("{4, 5}")]);
    }

    #[test]
    fn count_overflow() {
        let max = i64::MAX.to_string();
        let mut histogram = IntHistogram::new(0.0, 10.0, 2).unwrap();
        let mut sink = RecordSink::new();

        histogram.set_combining(false);
        histogram.start(&EmitKey::new("t"));
        histogram
            .aggregate(&EmitValue::weighted("1", max.as_str()), &mut sink)
            .unwrap();
        assert!(matches!(
            histogram.aggregate(&EmitValue::weighted("2", "1"), &mut sink),
            Err(TableError::Overflow(_))
        ));

        // Per-value counts fit, but their sum in the first bucket does not.
        histogram.start(&EmitKey::new("t"));
        for (value, weight) in [("1", max.as_str()), ("3", "-1"), ("2", "1")] {
            histogram
                .aggregate(&EmitValue::weighted(value, weight), &mut sink)
                .unwrap();
        }
        assert!(matches!(
            histogram.finish(&mut sink),
            Err(TableError::Overflow(_))
        ));
        assert!(sink.records().is_empty());
    }

    #[test]
    fn out_of_range() {
        let mut histogram = IntHistogram::new(-400.0, 400.0, 8).unwrap();
        histogram.start(&EmitKey::new("t"));
        for input in ["400", "-401"] {
            assert!(matches!(
                histogram.aggregate(&EmitValue::new(input), &mut RecordSink::new()),
                Err(TableError::OutOfRange { .. })
            ));
        }
        assert!(matches!(
            histogram.aggregate(&EmitValue::new("1.5"), &mut RecordSink::new()),
            Err(TableError::Parse { .. })
        ));
    }
}
