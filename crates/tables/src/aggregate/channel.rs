//! Tables writing their values to the outside world as they arrive.

use super::Aggregator;
use crate::{
    config::TableKind,
    sink::{EmitSink, SideChannel},
    EmitKey, EmitValue, TableError,
};
use std::{ops::ControlFlow, str::FromStr};
use tracing::{debug, dispatcher, error, info, warn, Dispatch};

/// Writes each value as a line to a side channel: standard output,
/// standard error, or a named output.
#[derive(Clone, Debug)]
pub struct ChannelTable {
    kind: TableKind,
    channel: SideChannel,
    combining: bool,
    key: EmitKey,
}

impl ChannelTable {
    pub fn new(kind: TableKind, channel: SideChannel) -> Self {
        Self {
            kind,
            channel,
            combining: false,
            key: EmitKey::default(),
        }
    }
}

impl Aggregator for ChannelTable {
    fn kind(&self) -> TableKind {
        self.kind
    }

    fn start(&mut self, key: &EmitKey) {
        self.key = key.clone();
    }

    fn aggregate(
        &mut self,
        value: &EmitValue,
        _sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError> {
        self.channel.write_line(&value.data())?;
        Ok(ControlFlow::Continue(()))
    }

    fn finish(&mut self, _sink: &mut dyn EmitSink) -> Result<(), TableError> {
        self.channel.flush()
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

/// Target of the events [`Log`] tables emit.
pub const LOG_TARGET: &str = "feldera_tables::log";

/// Severity of a logged value, carried in its weight.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Fatal,
}

impl FromStr for Severity {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            _ => Err(TableError::Severity(s.to_string())),
        }
    }
}

/// Logs each value through `tracing` at the severity named by its weight,
/// `info` if it has none.
///
/// Events go to the dispatcher the table was constructed with, not to
/// whichever subscriber is current when the value arrives.
#[derive(Clone, Debug)]
pub struct Log {
    dispatch: Dispatch,
    combining: bool,
    key: EmitKey,
}

impl Log {
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch,
            combining: false,
            key: EmitKey::default(),
        }
    }
}

impl Aggregator for Log {
    fn kind(&self) -> TableKind {
        TableKind::Log
    }

    fn start(&mut self, key: &EmitKey) {
        self.key = key.clone();
    }

    fn aggregate(
        &mut self,
        value: &EmitValue,
        _sink: &mut dyn EmitSink,
    ) -> Result<ControlFlow<()>, TableError> {
        let severity = value
            .weight()
            .map_or(Ok(Severity::default()), Severity::from_str)?;
        let data = value.data();
        let key = &self.key;
        dispatcher::with_default(&self.dispatch, || match severity {
            Severity::Debug => debug!(target: LOG_TARGET, table = %key, "{data}"),
            Severity::Info => info!(target: LOG_TARGET, table = %key, "{data}"),
            Severity::Warning => warn!(target: LOG_TARGET, table = %key, "{data}"),
            Severity::Error => error!(target: LOG_TARGET, table = %key, "{data}"),
            Severity::Fatal => error!(target: LOG_TARGET, table = %key, fatal = true, "{data}"),
        });
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
    use super::{ChannelTable, Log, Severity};
    use crate::{
        aggregate::{
            testing::{run, values, weighted},
            Aggregator,
        },
        config::TableKind,
        sink::{RecordSink, SharedBuffer, SideChannel},
        EmitKey, EmitValue, TableError,
    };
    use tracing::{dispatcher, Dispatch};

    #[test]
    fn writes_lines() {
        let (channel, buffer) = SideChannel::memory("audit");
        let mut table = ChannelTable::new(TableKind::Output, channel);
        let emitted = run(
            &mut table,
            false,
            &[
                EmitValue::new("login alice"),
                EmitValue::weighted("logout bob", "1"),
                EmitValue::from_fields(["x", "y"], None).unwrap(),
            ],
        );
        assert!(emitted.is_empty());
        assert_eq!(buffer.lines(), ["login alice", "logout bob", "x, y"]);
    }

    #[test]
    fn severities() {
        assert_eq!("WARN".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("fatal".parse::<Severity>().unwrap(), Severity::Fatal);
        assert!(matches!(
            "loud".parse::<Severity>(),
            Err(TableError::Severity(_))
        ));
    }

    fn buffered_dispatch() -> (Dispatch, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .without_time()
            .finish();
        (Dispatch::new(subscriber), buffer)
    }

    #[test]
    fn logs_at_severity() {
        // No subscriber is installed, globally or for this thread.
        let (dispatch, buffer) = buffered_dispatch();
        let mut log = Log::new(dispatch);
        run(&mut log, false, &values(["service started"]));
        run(
            &mut log,
            false,
            &weighted([("disk nearly full", "warning"), ("cache miss", "debug")]),
        );

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2, "{lines:?}");
        assert!(lines[0].contains("INFO") && lines[0].contains("service started"));
        assert!(lines[1].contains("WARN") && lines[1].contains("disk nearly full"));
        assert!(lines[1].contains("table=t"));
    }

    #[test]
    fn ignores_the_current_subscriber() {
        let (injected, buffer) = buffered_dispatch();
        let (current, elsewhere) = buffered_dispatch();
        dispatcher::with_default(&current, || {
            run(&mut Log::new(injected), false, &values(["to the injected one"]));
        });
        assert_eq!(buffer.lines().len(), 1);
        assert!(elsewhere.lines().is_empty());
    }

    #[test]
    fn rejects_unknown_severity() {
        let mut log = Log::new(Dispatch::none());
        log.start(&EmitKey::new("t"));
        assert!(matches!(
            log.aggregate(&EmitValue::weighted("x", "loud"), &mut RecordSink::new()),
            Err(TableError::Severity(_))
        ));
    }
}
