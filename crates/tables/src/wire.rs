//! # Combine/reduce wire format
//!
//! Combine output crosses to the reduce phase as a sequence of binary emit
//! records.  All integers are little-endian `u32`.
//!
//! * A string is its byte length followed by that many bytes of UTF-8.
//!
//! * An [`EmitKey`] is the table name string followed by the index string.
//!
//! * An [`EmitValue`] is the number of data fields, then each field as a
//!   string, then one more string for the metadata.  An empty metadata
//!   string means the value has no metadata, so a value whose metadata is
//!   genuinely empty decodes without metadata.
//!
//! * An [`EmitRecord`] is a key followed by a value.  Records are
//!   concatenated without any framing beyond their own length prefixes.

use crate::{EmitKey, EmitRecord, EmitValue, TableError};
use binrw::{binrw, BinRead, BinWrite};
use std::io::{self, Read, Seek, Write};

#[binrw]
#[derive(Debug)]
struct WireString {
    #[bw(calc(bytes.len() as u32))]
    len: u32,

    #[br(count = len)]
    bytes: Vec<u8>,
}

impl WireString {
    fn new(s: &str) -> Self {
        Self {
            bytes: s.as_bytes().to_vec(),
        }
    }

    fn into_string(self) -> Result<String, TableError> {
        String::from_utf8(self.bytes).map_err(|_| TableError::Utf8)
    }
}

#[binrw]
#[derive(Debug)]
struct WireValue {
    #[bw(calc(fields.len() as u32))]
    n_fields: u32,

    #[br(count = n_fields)]
    fields: Vec<WireString>,

    metadata: WireString,
}

#[binrw]
#[derive(Debug)]
struct WireKey {
    table: WireString,
    index: WireString,
}

impl From<&EmitValue> for WireValue {
    fn from(value: &EmitValue) -> Self {
        Self {
            fields: value.fields().iter().map(|f| WireString::new(f)).collect(),
            metadata: WireString::new(value.weight().unwrap_or_default()),
        }
    }
}

impl TryFrom<WireValue> for EmitValue {
    type Error = TableError;

    fn try_from(wire: WireValue) -> Result<Self, TableError> {
        let fields = wire
            .fields
            .into_iter()
            .map(WireString::into_string)
            .collect::<Result<Vec<_>, _>>()?;
        let metadata = wire.metadata.into_string()?;
        let weight = (!metadata.is_empty()).then_some(metadata);
        EmitValue::from_fields(fields, weight)
    }
}

impl From<&EmitKey> for WireKey {
    fn from(key: &EmitKey) -> Self {
        Self {
            table: WireString::new(key.table()),
            index: WireString::new(key.index()),
        }
    }
}

impl TryFrom<WireKey> for EmitKey {
    type Error = TableError;

    fn try_from(wire: WireKey) -> Result<Self, TableError> {
        Ok(EmitKey::with_index(
            wire.table.into_string()?,
            wire.index.into_string()?,
        ))
    }
}

impl EmitValue {
    pub fn write_to<W>(&self, writer: &mut W) -> Result<(), TableError>
    where
        W: Write + Seek,
    {
        Ok(WireValue::from(self).write_le(writer)?)
    }

    pub fn read_from<R>(reader: &mut R) -> Result<Self, TableError>
    where
        R: Read + Seek,
    {
        WireValue::read_le(reader)?.try_into()
    }

    pub fn encode(&self) -> Result<Vec<u8>, TableError> {
        let mut cursor = io::Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, TableError> {
        Self::read_from(&mut io::Cursor::new(bytes))
    }
}

impl EmitKey {
    pub fn write_to<W>(&self, writer: &mut W) -> Result<(), TableError>
    where
        W: Write + Seek,
    {
        Ok(WireKey::from(self).write_le(writer)?)
    }

    pub fn read_from<R>(reader: &mut R) -> Result<Self, TableError>
    where
        R: Read + Seek,
    {
        WireKey::read_le(reader)?.try_into()
    }
}

impl EmitRecord {
    pub fn write_to<W>(&self, writer: &mut W) -> Result<(), TableError>
    where
        W: Write + Seek,
    {
        self.key.write_to(writer)?;
        self.value.write_to(writer)
    }

    pub fn read_from<R>(reader: &mut R) -> Result<Self, TableError>
    where
        R: Read + Seek,
    {
        let key = EmitKey::read_from(reader)?;
        let value = EmitValue::read_from(reader)?;
        Ok(Self { key, value })
    }
}

/// Serializes `records` back to back.
pub fn encode_records<'a, I>(records: I) -> Result<Vec<u8>, TableError>
where
    I: IntoIterator<Item = &'a EmitRecord>,
{
    let mut cursor = io::Cursor::new(Vec::new());
    for record in records {
        record.write_to(&mut cursor)?;
    }
    Ok(cursor.into_inner())
}

/// Parses every record in `bytes`, which must end exactly at a record
/// boundary.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<EmitRecord>, TableError> {
    let mut cursor = io::Cursor::new(bytes);
    let mut records = Vec::new();
    while (cursor.position() as usize) < bytes.len() {
        records.push(EmitRecord::read_from(&mut cursor)?);
    }
    Ok(records)
}
