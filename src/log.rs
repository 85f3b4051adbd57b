//! Structured logging service.
//!
//! A [`Logger`] is an explicit value: build one at startup, hand it to the
//! [`Router`](crate::Router), and derive request-scoped copies with
//! [`Logger::with`]. There is no ambient global logger in this crate.
//!
//! ```text
//! Logger::tracing()                       ← created once in main
//!        ↓ .with("RequestID", id)          ← one derivation per request
//! Logger { context: [RequestID] }          ← parent untouched
//!        ↓ .info("request received", …)
//! Record { level, message, fields }        ← handed to the Sink
//! ```
//!
//! Derivation copies the context into a fresh `Arc<[Field]>`. The parent is
//! never written to, so concurrent derivations need no locking.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Map, Value};

/// One structured key/value pair attached to a record.
pub type Field = (&'static str, Value);

/// Severity of a [`Record`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Level {
    Info,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info  => "info",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log record, written to the sink as soon as it is created.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub level: Level,
    pub message: String,
    /// Logger context first, then the call-site fields, in order.
    pub fields: Vec<Field>,
}

impl Record {
    /// Returns the value of the last field named `key`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.iter().rev().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Renders the fields as a JSON object. Later keys win on duplicates.
    pub fn fields_json(&self) -> Value {
        let map: Map<String, Value> = self.fields.iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect();
        Value::Object(map)
    }
}

// ── Sinks ─────────────────────────────────────────────────────────────────────

/// Destination for log records.
pub trait Sink: Send + Sync + 'static {
    fn emit(&self, record: Record);

    /// Flushes anything the sink buffers. Called once on process exit.
    fn flush(&self) {}
}

/// Keys emitted as first-class `tracing` fields when their value is a string.
/// Everything else travels in one JSON-rendered `fields` value.
const PROMOTED: [&str; 5] = ["RequestID", "RemoteAddr", "Method", "URL", "Error"];

/// Forwards records to the process-wide `tracing` subscriber installed by
/// [`logging::init`](crate::logging::init).
///
/// `RequestID`, `RemoteAddr`, `Method`, `URL` and `Error` become real event
/// fields, so the JSON layer prints them as top-level keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn emit(&self, record: Record) {
        let promoted = |key: &str| record.field(key).and_then(Value::as_str);

        let rest: Map<String, Value> = record.fields.iter()
            .filter(|(k, v)| !(PROMOTED.contains(k) && v.is_string()))
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect();
        let rest = (!rest.is_empty()).then(|| Value::Object(rest));

        macro_rules! emit {
            ($level:expr) => {
                tracing::event!(
                    target: "pingd",
                    $level,
                    RequestID = promoted("RequestID"),
                    RemoteAddr = promoted("RemoteAddr"),
                    Method = promoted("Method"),
                    URL = promoted("URL"),
                    Error = promoted("Error"),
                    fields = rest.as_ref().map(tracing::field::display),
                    "{}",
                    record.message
                )
            };
        }

        match record.level {
            Level::Info  => emit!(tracing::Level::INFO),
            Level::Error => emit!(tracing::Level::ERROR),
        }
    }

    fn flush(&self) {
        // The fmt layer writes straight to stdout.
        let _ = std::io::stdout().flush();
    }
}

/// Keeps every record in memory. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far, oldest first.
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Sink for MemorySink {
    fn emit(&self, record: Record) {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push(record);
    }
}

// ── Logger ────────────────────────────────────────────────────────────────────

/// Leveled, structured logger with immutable context fields.
///
/// Cloning is one `Arc` increment per field set; pass it around freely.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Sink>,
    context: Arc<[Field]>,
}

impl Logger {
    /// A logger writing to `sink` with no context fields.
    pub fn new(sink: impl Sink) -> Self {
        Self { sink: Arc::new(sink), context: Arc::from(Vec::new()) }
    }

    /// A logger writing to the global `tracing` subscriber.
    pub fn tracing() -> Self {
        Self::new(TracingSink)
    }

    /// Returns a derived logger carrying every field of `self` plus
    /// `key = value`. `self` is left unchanged.
    ///
    /// ```rust
    /// use pingd::log::{Logger, MemorySink};
    ///
    /// let sink = MemorySink::new();
    /// let root = Logger::new(sink.clone());
    /// let child = root.with("RequestID", "abc");
    ///
    /// root.info("plain", []);
    /// child.info("tagged", []);
    ///
    /// let records = sink.records();
    /// assert!(records[0].field("RequestID").is_none());
    /// assert_eq!(records[1].field("RequestID").and_then(|v| v.as_str()), Some("abc"));
    /// ```
    pub fn with(&self, key: &'static str, value: impl Into<Value>) -> Self {
        let mut context = Vec::with_capacity(self.context.len() + 1);
        context.extend(self.context.iter().cloned());
        context.push((key, value.into()));
        Self { sink: Arc::clone(&self.sink), context: context.into() }
    }

    /// Context fields carried by this logger.
    pub fn context(&self) -> &[Field] {
        &self.context
    }

    pub fn log<I>(&self, level: Level, message: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = Field>,
    {
        let mut all = self.context.to_vec();
        all.extend(fields);
        self.sink.emit(Record { level, message: message.into(), fields: all });
    }

    pub fn info<I>(&self, message: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = Field>,
    {
        self.log(Level::Info, message, fields);
    }

    pub fn error<I>(&self, message: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = Field>,
    {
        self.log(Level::Error, message, fields);
    }

    /// Flushes the underlying sink.
    pub fn sync(&self) {
        self.sink.flush();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("context", &self.context).finish_non_exhaustive()
    }
}
