use std::io::ErrorKind;
use thiserror::Error;

/// An error that can occur while configuring or running a table.
#[derive(Error, Debug)]
pub enum TableError {
    /// A data field or weight could not be parsed as the type the table
    /// expects.
    #[error("cannot parse {input:?} as {expected}")]
    Parse {
        input: String,
        expected: &'static str,
    },

    /// Accumulated weights of a group exceed the range of a count.
    #[error("accumulated weight of {0:?} overflows a 64-bit count")]
    Overflow(String),

    /// A table was configured with arguments it cannot work with, e.g., a
    /// histogram with zero buckets.
    #[error("invalid configuration for {kind} table: {reason}")]
    Config { kind: &'static str, reason: String },

    /// The table kind named in a declaration does not exist.
    #[error("unknown table kind {0:?}")]
    UnknownKind(String),

    /// The catalog has no declaration for the named table.
    #[error("no table named {0:?} is declared")]
    UnknownTable(String),

    /// A value fell outside the range covered by a histogram.
    #[error("value {value} falls outside histogram range [{min}, {max})")]
    OutOfRange { value: String, min: f64, max: f64 },

    /// An emit value was constructed or decoded without any data fields.
    #[error("emit value must contain at least one data field")]
    EmptyValue,

    /// A log table received a severity it does not recognize.
    #[error("unknown log severity {0:?}")]
    Severity(String),

    /// An output table refers to a side channel that was not provided.
    #[error("side channel {0:?} is not available")]
    UnknownChannel(String),

    /// A counter table's index does not have the `[group][name]` shape.
    #[error("counter index {0:?} must have the form [group][name]")]
    CounterIndex(String),

    /// The driver was asked to run a table in the combine phase although the
    /// table is not associative and commutative.
    #[error("table {0} cannot run in the combine phase")]
    NotCombinable(String),

    /// Malformed bytes on the combine/reduce wire.
    #[error("malformed wire record: {0}")]
    Wire(#[from] binrw::Error),

    /// A length-prefixed field on the wire is not valid UTF-8.
    #[error("wire field is not valid UTF-8")]
    Utf8,

    /// I/O error while writing to a sink or side channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing a JSON table declaration.
    #[error("invalid JSON table declaration: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing a YAML table declaration.
    #[error("invalid YAML table declaration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TableError {
    pub(crate) fn parse(input: &str, expected: &'static str) -> Self {
        Self::Parse {
            input: input.to_string(),
            expected,
        }
    }

    pub(crate) fn config(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            kind,
            reason: reason.into(),
        }
    }

    /// Returns true for errors caused by malformed input data, as opposed to
    /// configuration or I/O problems.  Only these may be skipped by a
    /// tolerant driver.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::Overflow(_) | Self::OutOfRange { .. } | Self::Severity(_)
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(error) => error.kind(),
            Self::Parse { .. }
            | Self::Overflow(_)
            | Self::OutOfRange { .. }
            | Self::EmptyValue
            | Self::Severity(_)
            | Self::CounterIndex(_)
            | Self::Wire(_)
            | Self::Utf8 => ErrorKind::InvalidData,
            Self::Config { .. } | Self::Json(_) | Self::Yaml(_) | Self::NotCombinable(_) => {
                ErrorKind::InvalidInput
            }
            Self::UnknownKind(_) | Self::UnknownTable(_) | Self::UnknownChannel(_) => {
                ErrorKind::NotFound
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TableError;
    use std::io::ErrorKind;

    #[test]
    fn messages() {
        assert_eq!(
            TableError::parse("x1", "an integer").to_string(),
            "cannot parse \"x1\" as an integer"
        );
        assert_eq!(
            TableError::config("histogram", "bucket count must be positive").to_string(),
            "invalid configuration for histogram table: bucket count must be positive"
        );
    }

    #[test]
    fn classification() {
        assert!(TableError::parse("x", "a float").is_malformed_input());
        assert!(TableError::Overflow("x".into()).is_malformed_input());
        assert!(!TableError::EmptyValue.is_malformed_input());
        assert_eq!(
            TableError::UnknownChannel("out".into()).kind(),
            ErrorKind::NotFound
        );
    }
}
