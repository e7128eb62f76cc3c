//! Emit records: the unit of data flowing into a table and between the
//! combine and reduce phases.

use crate::TableError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::{
    borrow::Cow,
    fmt::{self, Display},
};

/// Separator used when a multi-field value is rendered as one string.
pub const FIELD_SEPARATOR: &str = ", ";

/// Identifies the group a value belongs to: a table name plus the rendered
/// index of the element the program emitted to.
///
/// Unindexed tables use an empty index.  Indexed tables render each
/// subscript in brackets, so `t[3]["x"]` has index `[3][x]`.  Keys order by
/// table name and then by index.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmitKey {
    table: String,
    index: String,
}

impl EmitKey {
    /// Key of an unindexed table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            index: String::new(),
        }
    }

    /// Key with an already rendered index.
    pub fn with_index(table: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            index: index.into(),
        }
    }

    /// Key built from subscript values, each rendered inside brackets.
    pub fn indexed<I, S>(table: impl Into<String>, subscripts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Display,
    {
        Self {
            table: table.into(),
            index: subscripts.into_iter().map(|s| format!("[{s}]")).collect(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Splits the index back into its subscripts.
    ///
    /// Returns `None` if the index is not a sequence of `[...]` groups.
    pub fn subscripts(&self) -> Option<Vec<&str>> {
        let mut rest = self.index.as_str();
        let mut subscripts = Vec::new();
        while !rest.is_empty() {
            let inner = rest.strip_prefix('[')?;
            let end = inner.find(']')?;
            subscripts.push(&inner[..end]);
            rest = &inner[end + 1..];
        }
        Some(subscripts)
    }
}

impl Display for EmitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.table, self.index)
    }
}

/// Data fields of an emit value.  Almost all values have exactly one.
pub type Fields = SmallVec<[String; 1]>;

/// One emitted value: a non-empty sequence of data fields plus optional
/// metadata, which most tables interpret as a weight.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmitValue {
    fields: Fields,
    weight: Option<String>,
}

impl EmitValue {
    /// A single-field value without weight.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            fields: smallvec::smallvec![data.into()],
            weight: None,
        }
    }

    /// A single-field value carrying `weight`.
    pub fn weighted(data: impl Into<String>, weight: impl Into<String>) -> Self {
        Self {
            fields: smallvec::smallvec![data.into()],
            weight: Some(weight.into()),
        }
    }

    pub fn from_fields<I, S>(fields: I, weight: Option<String>) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Fields = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(TableError::EmptyValue);
        }
        Ok(Self { fields, weight })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The data part rendered as one string: the field itself for scalar
    /// values, otherwise the fields joined by [`FIELD_SEPARATOR`].
    pub fn data(&self) -> Cow<'_, str> {
        match self.fields.as_slice() {
            [field] => Cow::Borrowed(field.as_str()),
            fields => Cow::Owned(fields.iter().join(FIELD_SEPARATOR)),
        }
    }

    pub fn weight(&self) -> Option<&str> {
        self.weight.as_deref()
    }

    /// The same data fields without the weight.
    pub fn unweighted(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            weight: None,
        }
    }
}

impl Display for EmitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data())?;
        if let Some(weight) = &self.weight {
            write!(f, " weight {weight}")?;
        }
        Ok(())
    }
}

/// A key paired with a value, as exchanged between phases.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmitRecord {
    pub key: EmitKey,
    pub value: EmitValue,
}

impl EmitRecord {
    pub fn new(key: EmitKey, value: EmitValue) -> Self {
        Self { key, value }
    }
}

/// Renders the human-readable result line `<key> = <value>`.
impl Display for EmitRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.key, self.value)
    }
}
