//! Per-caller entry point: encode a record, hand it to one transport, report
//! any failure.
//!
//! [`Publisher::publish`] runs synchronously on the calling thread and never
//! panics or returns an error. Formatting faults, connection problems and
//! unexpected responses are classified and passed to the configured
//! [`ErrorReporter`]; the caller's logging call site is never disturbed.

use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{
    encoder::SharedEncoder,
    error::DeliveryError,
    level::Level,
    log_record::LogRecord,
    report::{ErrorReporter, LogReporter},
    transport::Transport,
};

pub struct Publisher {
    encoder: SharedEncoder,
    transport: Box<dyn Transport>,
    level: Level,
    reporter: Arc<dyn ErrorReporter>,
    closed: AtomicBool,
    reported_closed: AtomicBool,
}

impl Publisher {
    /// Create a publisher bound to `transport` using the JSON encoder, the
    /// `INFO` threshold and a [`LogReporter`].
    pub fn new<T>(transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self {
            encoder: SharedEncoder::default(),
            transport: Box::new(transport),
            level: Level::Info,
            reporter: Arc::new(LogReporter::default()),
            closed: AtomicBool::new(false),
            reported_closed: AtomicBool::new(false),
        }
    }

    pub fn with_encoder(mut self, encoder: SharedEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Ignore records less severe than `level`.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn reporter(&self) -> &Arc<dyn ErrorReporter> {
        &self.reporter
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Whether a record at `level` would be published.
    pub fn is_enabled_for(&self, level: Level) -> bool {
        self.level != Level::Off && level != Level::Off && level >= self.level
    }

    /// Encode `record` and deliver it, reporting any failure.
    pub fn publish(&self, record: &LogRecord) {
        if !self.is_enabled_for(record.level) {
            return;
        }
        if self.is_closed() {
            if !self.reported_closed.swap(true, Ordering::AcqRel) {
                self.reporter
                    .report("publish called after close", &DeliveryError::Closed);
            }
            return;
        }
        let payload = match self.encode(record) {
            Ok(payload) => payload,
            Err(err) => {
                let context = format!("failed to encode record {}", record.sequence);
                self.reporter.report(&context, &err);
                return;
            }
        };
        if let Err(err) = self.transport.send(payload.as_bytes()) {
            let context = format!(
                "failed to deliver record {} to {}",
                record.sequence,
                self.transport.endpoint()
            );
            self.reporter.report(&context, &err);
        }
    }

    fn encode(&self, record: &LogRecord) -> Result<String, DeliveryError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.encoder.encode(record))) {
            Ok(result) => result.map_err(DeliveryError::from),
            Err(panic) => Err(DeliveryError::FormatPanic(panic_message(panic.as_ref()))),
        }
    }

    /// Flush the transport, reporting any failure.
    pub fn flush(&self) {
        if self.is_closed() {
            return;
        }
        if let Err(err) = self.transport.flush() {
            let context = format!("failed to flush {}", self.transport.endpoint());
            self.reporter.report(&context, &err);
        }
    }

    /// Release the transport. Only the first call has any effect; a failure
    /// while closing is reported, not raised.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(err) = self.transport.close() {
            let context = format!("failed to close {}", self.transport.endpoint());
            self.reporter.report(&context, &err);
        }
        self.reporter.flush();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("endpoint", &self.transport.endpoint())
            .field("level", &self.level)
            .field("encoder", &self.encoder)
            .field("closed", &self.is_closed())
            .finish()
    }
}
