//! Log record representation consumed by encoders and publishers.
//!
//! A [`LogRecord`] is produced by the host logging framework and handed to a
//! publisher read-only. Records created through [`LogRecord::new`] capture the
//! wall-clock time, the calling thread and the next process-wide sequence
//! number; the builder-style setters let hosts supply their own values.

use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::level::Level;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);
static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: Cell<u64> = const { Cell::new(0) };
}

/// Return the next sequence number. Unique and increasing within the process.
pub fn next_sequence() -> u64 {
    NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// Return a small numeric identifier for the calling thread.
///
/// Identifiers are assigned on first use and stay stable for the lifetime of
/// the thread.
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| {
        if id.get() == 0 {
            id.set(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed));
        }
        id.get()
    })
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    /// Event time in milliseconds since the UNIX epoch.
    pub millis: i64,
    /// Sequence number assigned when the record was created.
    pub sequence: u64,
    /// Name of the logger that produced the record.
    pub logger: Option<String>,
    pub level: Level,
    /// Class (or module) the logging call originated from.
    pub source_class: Option<String>,
    /// Method (or function) the logging call originated from.
    pub source_method: Option<String>,
    pub thread_id: u64,
    /// Rendered message. `None` is encoded as an empty string.
    pub message: Option<String>,
    /// Optional message parameters.
    pub params: Vec<String>,
}

impl LogRecord {
    /// Construct a record for `logger` at `level` stamped with the current
    /// time, thread and sequence number.
    pub fn new(logger: &str, level: Level, message: &str) -> Self {
        Self {
            millis: now_millis(),
            sequence: next_sequence(),
            logger: Some(logger.to_owned()),
            level,
            source_class: None,
            source_method: None,
            thread_id: current_thread_id(),
            message: Some(message.to_owned()),
            params: Vec::new(),
        }
    }

    pub fn with_millis(mut self, millis: i64) -> Self {
        self.millis = millis;
        self
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_thread_id(mut self, thread_id: u64) -> Self {
        self.thread_id = thread_id;
        self
    }

    /// Record the class and method the logging call originated from.
    pub fn with_source(mut self, class: &str, method: &str) -> Self {
        self.source_class = Some(class.to_owned());
        self.source_method = Some(method.to_owned());
        self
    }

    /// Replace the message; `None` models a record without a message.
    pub fn with_message(mut self, message: Option<&str>) -> Self {
        self.message = message.map(str::to_owned);
        self
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn logger(&self) -> &str {
        self.logger.as_deref().unwrap_or_default()
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message())
    }
}
