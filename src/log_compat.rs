//! Compatibility bridge for the Rust `log` crate.
//!
//! [`RelayLogAdapter`] implements `log::Log` and turns each `log` record into
//! a [`LogRecord`] for a single publisher. Failure reports written by
//! [`LogReporter`](crate::report::LogReporter) also go through `log`; a
//! per-thread guard drops those records instead of publishing them again.

use std::{borrow::Cow, cell::Cell, sync::Arc};

use log::{Metadata, Record, SetLoggerError};

use crate::{level::Level, log_record::LogRecord, publisher::Publisher};

thread_local! {
    static IN_RELAY: Cell<bool> = const { Cell::new(false) };
}

/// Map a `log` level onto the publisher level scale.
pub fn map_log_level(level: log::Level) -> Level {
    match level {
        log::Level::Trace => Level::Finest,
        log::Level::Debug => Level::Fine,
        log::Level::Info => Level::Info,
        log::Level::Warn => Level::Warning,
        log::Level::Error => Level::Severe,
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        map_log_level(level)
    }
}

fn normalise_target(target: &str) -> Cow<'_, str> {
    if target.contains("::") {
        Cow::Owned(target.replace("::", "."))
    } else {
        Cow::Borrowed(target)
    }
}

/// Resets the re-entrancy flag when dropped.
struct RelayGuard;

impl RelayGuard {
    fn enter() -> Option<Self> {
        IN_RELAY.with(|flag| {
            if flag.replace(true) {
                None
            } else {
                Some(RelayGuard)
            }
        })
    }
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        IN_RELAY.with(|flag| flag.set(false));
    }
}

/// Adapter implementing the Rust `log::Log` trait.
///
/// Records are published synchronously on the logging thread when the
/// publisher's threshold admits them.
#[derive(Debug)]
pub struct RelayLogAdapter {
    publisher: Arc<Publisher>,
}

impl RelayLogAdapter {
    pub fn new(publisher: Arc<Publisher>) -> Self {
        Self { publisher }
    }

    pub fn publisher(&self) -> &Arc<Publisher> {
        &self.publisher
    }

    fn to_record(record: &Record<'_>) -> LogRecord {
        let mut converted = LogRecord::new(
            &normalise_target(record.target()),
            map_log_level(record.level()),
            &record.args().to_string(),
        );
        converted.source_class = record
            .module_path()
            .map(|path| normalise_target(path).into_owned());
        converted.source_method = match (record.file(), record.line()) {
            (Some(file), Some(line)) => Some(format!("{file}:{line}")),
            (Some(file), None) => Some(file.to_owned()),
            _ => None,
        };
        converted
    }
}

impl log::Log for RelayLogAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.publisher
            .is_enabled_for(map_log_level(metadata.level()))
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Some(_guard) = RelayGuard::enter() else {
            return;
        };
        self.publisher.publish(&Self::to_record(record));
    }

    fn flush(&self) {
        let Some(_guard) = RelayGuard::enter() else {
            return;
        };
        self.publisher.flush();
    }
}

/// Install `adapter` as the global `log` logger.
///
/// Fails when another global logger has already been set. The `log` max
/// level is raised to `Trace`; the publisher's own threshold does the
/// filtering.
pub fn install(adapter: RelayLogAdapter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(adapter))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
