use super::{Aggregator, FloatElement};
use crate::{
    algebra::SortedMultiset,
    config::TableKind,
    number::{parse_count, Scalar},
    sink::EmitSink,
    EmitKey, EmitValue, TableError,
};
use itertools::Itertools;
use std::ops::ControlFlow;

/// Rendering of a boundary no value fell on.
const UNDEFINED: &str = "undefined";

/// The `n - 1` boundaries splitting a group's values into `n` groups of
/// (approximately) equal count.
#[derive(Clone, Debug)]
pub struct Quantile<T> {
    n: usize,
    combining: bool,
    key: EmitKey,
    values: SortedMultiset<T>,
}

pub type IntQuantile = Quantile<i64>;
pub type FloatQuantile = Quantile<FloatElement>;

impl<T: Scalar> Quantile<T> {
    pub fn new(n: usize) -> Result<Self, TableError> {
        if n < 2 {
            return Err(TableError::config(
                TableKind::Quantile.name(),
                format!("at least 2 quantiles are required, got {n}"),
            ));
        }
        Ok(Self {
            n,
            combining: false,
            key: EmitKey::default(),
            values: SortedMultiset::new(),
        })
    }

    /// Scans the values in ascending order.  Whenever the cumulative count
    /// `q` crosses into a new multiple of `total / (n - 1)`, the current
    /// value becomes the boundary that multiple closes.  A value spanning
    /// several multiples only closes the last of them.
    fn boundaries(&self) -> Vec<Option<&T>> {
        let slots = self.n - 1;
        let total = i128::from(self.values.total());
        let mut boundaries = vec![None; slots];
        let mut last = 0;
        let mut q = 0i128;
        for (value, count) in self.values.iter() {
            q += i128::from(count);
            let index = (q.max(0) * slots as i128 / total).min(slots as i128) as usize;
            if index > last {
                boundaries[index - 1] = Some(value);
                last = index;
            }
        }
        boundaries
    }
}

impl<T: Scalar> Aggregator for Quantile<T> {
    fn kind(&self) -> TableKind {
        TableKind::Quantile
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
        self.values
            .insert(T::parse(&value.data())?, parse_count(value.weight())?)?;
        Ok(ControlFlow::Continue(()))
    }

    fn finish(&mut self, sink: &mut dyn EmitSink) -> Result<(), TableError> {
        if self.combining {
            for (value, count) in self.values.iter() {
                sink.emit(
                    &self.key,
                    EmitValue::weighted(value.render(), count.to_string()),
                )?;
            }
            return Ok(());
        }

        if self.values.total() <= 0 {
            return Ok(());
        }
        let boundaries = self
            .boundaries()
            .into_iter()
            .map(|boundary| boundary.map_or_else(|| UNDEFINED.to_string(), Scalar::render))
            .join(", ");
        sink.emit(&self.key, EmitValue::new(format!("{{{boundaries}}}")))
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
