//! Destinations for table output.
//!
//! Tables emit through an [`EmitSink`] supplied by the driver: in the combine
//! phase this is typically a [`RecordSink`] whose records are serialized for
//! the reduce phase, in the reduce phase a [`TextSink`] rendering result
//! lines.  Tables that write to the outside world (stdout, stderr, named
//! outputs) instead hold a [`SideChannel`] handed to them at construction.

use crate::{EmitKey, EmitRecord, EmitValue, TableError};
use std::{
    collections::BTreeMap,
    fmt::{self, Debug},
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

/// Receives the values a table emits.
pub trait EmitSink {
    fn emit(&mut self, key: &EmitKey, value: EmitValue) -> Result<(), TableError>;
}

impl<F> EmitSink for F
where
    F: FnMut(&EmitKey, EmitValue) -> Result<(), TableError>,
{
    fn emit(&mut self, key: &EmitKey, value: EmitValue) -> Result<(), TableError> {
        self(key, value)
    }
}

/// Collects emitted records in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordSink {
    records: Vec<EmitRecord>,
}

impl RecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[EmitRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<EmitRecord> {
        self.records
    }

    /// The emitted values, without their keys.
    pub fn values(&self) -> Vec<EmitValue> {
        self.records.iter().map(|r| r.value.clone()).collect()
    }

    /// The emitted records rendered as result lines.
    pub fn lines(&self) -> Vec<String> {
        self.records.iter().map(ToString::to_string).collect()
    }
}

impl EmitSink for RecordSink {
    fn emit(&mut self, key: &EmitKey, value: EmitValue) -> Result<(), TableError> {
        self.records.push(EmitRecord::new(key.clone(), value));
        Ok(())
    }
}

/// Writes each emitted record as a `<key> = <value>` line.
#[derive(Debug)]
pub struct TextSink<W> {
    writer: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EmitSink for TextSink<W> {
    fn emit(&mut self, key: &EmitKey, value: EmitValue) -> Result<(), TableError> {
        writeln!(self.writer, "{key} = {value}")?;
        Ok(())
    }
}

/// A named, shareable line-oriented writer.
///
/// Clones share the underlying writer; each line is written under a lock,
/// so lines from different tables never interleave.
#[derive(Clone)]
pub struct SideChannel {
    name: Arc<str>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SideChannel {
    pub fn new<W>(name: &str, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            name: name.into(),
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// The process's standard output.
    pub fn stdout() -> Self {
        Self::new("stdout", io::stdout())
    }

    /// The process's standard error.
    pub fn stderr() -> Self {
        Self::new("stderr", io::stderr())
    }

    /// A channel writing into memory, plus a handle to read what was
    /// written.
    pub fn memory(name: &str) -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Self::new(name, buffer.clone()), buffer)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Writes `line` followed by a newline.
    pub fn write_line(&self, line: &str) -> Result<(), TableError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")?;
        Ok(())
    }

    pub fn flush(&self) -> Result<(), TableError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.flush()?;
        Ok(())
    }
}

impl Debug for SideChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SideChannel")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// In-memory writer whose clones share one buffer.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The side channels available to the tables of one worker.
#[derive(Clone, Debug)]
pub struct SideChannels {
    stdout: SideChannel,
    stderr: SideChannel,
    outputs: BTreeMap<String, SideChannel>,
}

impl Default for SideChannels {
    fn default() -> Self {
        Self {
            stdout: SideChannel::stdout(),
            stderr: SideChannel::stderr(),
            outputs: BTreeMap::new(),
        }
    }
}

impl SideChannels {
    pub fn with_stdout(mut self, channel: SideChannel) -> Self {
        self.stdout = channel;
        self
    }

    pub fn with_stderr(mut self, channel: SideChannel) -> Self {
        self.stderr = channel;
        self
    }

    /// Registers a named output channel, replacing any previous channel with
    /// the same name.
    pub fn with_output(mut self, channel: SideChannel) -> Self {
        self.outputs.insert(channel.name().to_string(), channel);
        self
    }

    pub fn stdout(&self) -> &SideChannel {
        &self.stdout
    }

    pub fn stderr(&self) -> &SideChannel {
        &self.stderr
    }

    pub fn output(&self, name: &str) -> Result<&SideChannel, TableError> {
        self.outputs
            .get(name)
            .ok_or_else(|| TableError::UnknownChannel(name.to_string()))
    }
}
