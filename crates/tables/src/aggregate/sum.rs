use super::Aggregator;
use crate::{
    config::{ElementType, TableKind},
    number::Number,
    sink::EmitSink,
    EmitKey, EmitValue, TableError,
};
use std::ops::ControlFlow;

/// Running total of a group's values.
///
/// The partial sum a combining instance emits is itself a valid input, so
/// both phases emit the same thing.
#[derive(Clone, Debug)]
pub struct Sum {
    element: ElementType,
    combining: bool,
    key: EmitKey,
    total: Number,
}

impl Sum {
    pub fn new(element: ElementType) -> Self {
        Self {
            element,
            combining: false,
            key: EmitKey::default(),
            total: Self::zero(element),
        }
    }

    fn zero(element: ElementType) -> Number {
        match element {
            ElementType::Int => Number::Int(0),
            ElementType::Float => Number::Float(0.0),
        }
    }
}

impl Aggregator for Sum {
    fn kind(&self) -> TableKind {
        TableKind::Sum
    }

    fn start(&mut self, key: &EmitKey) {
        self.key = key.clone();
        self.total = Self::zero(self.element);
    }

    fn aggregate(
        &mut self,
        value: &EmitValue,
        _sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError> {
        self.total = self.total + Number::parse(&value.data())?;
        Ok(ControlFlow::Continue(()))
    }

    fn finish(&mut self, sink: &mut dyn EmitSink) -> Result<(), TableError> {
        sink.emit(&self.key, EmitValue::new(self.total.to_string()))
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
