//! Numeric forms of emitted data.
//!
//! Everything crossing the combine/reduce boundary is a string.  Tables that
//! compute on numbers parse their inputs here: a field containing a decimal
//! point is a float, anything else is an integer.

use crate::TableError;
use ordered_float::OrderedFloat;
use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display},
    ops::Add,
};

/// Renders a float the way every table prints one: shortest round-trip
/// representation, always with a fractional part.
pub fn format_float(value: f64) -> String {
    ryu::Buffer::new().format(value).to_string()
}

/// A parsed numeric field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Parses a numeric field.  Rejects NaN.
    pub fn parse(input: &str) -> Result<Self, TableError> {
        let trimmed = input.trim();
        if trimmed.contains('.') {
            return Self::parse_float(trimmed, input, "a float");
        }
        match trimmed.parse::<i64>() {
            Ok(i) => Ok(Number::Int(i)),
            // Exponent notation and infinities have no decimal point.
            Err(_) => Self::parse_float(trimmed, input, "a number"),
        }
    }

    fn parse_float(trimmed: &str, input: &str, expected: &'static str) -> Result<Self, TableError> {
        match trimmed.parse::<f64>() {
            Ok(f) if !f.is_nan() => Ok(Number::Float(f)),
            _ => Err(TableError::parse(input, expected)),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Total order over numbers of either form.  Two integers compare
    /// exactly; anything else compares as `f64`.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Number::Int(left), Number::Int(right)) => left.cmp(right),
            _ => self.as_f64().total_cmp(&other.as_f64()),
        }
    }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(left), Number::Int(right)) => Number::Int(left.wrapping_add(right)),
            (left, right) => Number::Float(left.as_f64() + right.as_f64()),
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => f.write_str(ryu::Buffer::new().format(x)),
        }
    }
}

/// Parses an optional weight as an integer count, defaulting to 1.
pub fn parse_count(weight: Option<&str>) -> Result<i64, TableError> {
    let Some(weight) = weight else {
        return Ok(1);
    };
    match Number::parse(weight)? {
        Number::Int(count) => Ok(count),
        Number::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
        Number::Float(_) => Err(TableError::parse(weight, "an integer count")),
    }
}

/// Adds a count to an accumulated weight, failing instead of wrapping.
/// `value` names what is being counted in the error.
pub fn add_count(total: i64, count: i64, value: &str) -> Result<i64, TableError> {
    total
        .checked_add(count)
        .ok_or_else(|| TableError::Overflow(value.to_string()))
}

/// Element types of the ordered numeric tables (histogram and quantile).
pub trait Scalar: Ord + Clone + Debug + 'static {
    /// Describes the expected input in parse errors.
    const EXPECTED: &'static str;

    fn parse(input: &str) -> Result<Self, TableError>;

    fn to_f64(&self) -> f64;

    fn render(&self) -> String;
}

impl Scalar for i64 {
    const EXPECTED: &'static str = "an integer";

    fn parse(input: &str) -> Result<Self, TableError> {
        input
            .trim()
            .parse()
            .map_err(|_| TableError::parse(input, Self::EXPECTED))
    }

    fn to_f64(&self) -> f64 {
        *self as f64
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl Scalar for OrderedFloat<f64> {
    const EXPECTED: &'static str = "a float";

    fn parse(input: &str) -> Result<Self, TableError> {
        Number::parse(input).map(|n| OrderedFloat(n.as_f64()))
    }

    fn to_f64(&self) -> f64 {
        self.0
    }

    fn render(&self) -> String {
        format_float(self.0)
    }
}
