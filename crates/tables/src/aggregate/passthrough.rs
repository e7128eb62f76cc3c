use super::Aggregator;
use crate::{config::TableKind, sink::EmitSink, EmitKey, EmitValue, TableError};
use std::ops::ControlFlow;

/// Emits every value unchanged, weight included.
#[derive(Clone, Debug, Default)]
pub struct Collection {
    combining: bool,
    key: EmitKey,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Aggregator for Collection {
    fn kind(&self) -> TableKind {
        TableKind::Collection
    }

    fn start(&mut self, key: &EmitKey) {
        self.key = key.clone();
    }

    fn aggregate(
        &mut self,
        value: &EmitValue,
        sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError> {
        sink.emit(&self.key, value.clone())?;
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

/// Emits the data fields of every value, dropping the weight.
#[derive(Clone, Debug, Default)]
pub struct Text {
    combining: bool,
    key: EmitKey,
}

impl Text {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Aggregator for Text {
    fn kind(&self) -> TableKind {
        TableKind::Text
    }

    fn start(&mut self, key: &EmitKey) {
        self.key = key.clone();
    }

    fn aggregate(
        &mut self,
        value: &EmitValue,
        sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError> {
        sink.emit(&self.key, value.unweighted())?;
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
    use super::{Collection, Text};
    use crate::{aggregate::testing::run, EmitValue};

    #[test]
    fn passthrough() {
        let input = vec![
            EmitValue::weighted("a", "2"),
            EmitValue::from_fields(["b", "c"], None).unwrap(),
        ];
        assert_eq!(run(&mut Collection::new(), false, &input), input);
        assert_eq!(
            run(&mut Text::new(), true, &input),
            [
                EmitValue::new("a"),
                EmitValue::from_fields(["b", "c"], None).unwrap()
            ]
        );
    }
}
