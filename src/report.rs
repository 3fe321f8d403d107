//! Pluggable sinks for delivery failures.
//!
//! Publishers never raise delivery problems to the calling thread. Instead
//! each failure is handed to an [`ErrorReporter`] together with a short
//! context message. [`LogReporter`] forwards failures to the `log` facade and
//! is the default; [`ChannelReporter`] hands them to a supervising thread.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::{debug, warn};

use crate::error::{DeliveryError, ErrorKind};
use crate::rate_limited_warner::{DEFAULT_WARN_INTERVAL, RateLimitedWarner};

/// Receives every failure a publisher or transport encounters.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, context: &str, error: &DeliveryError);

    /// Emit anything held back, such as counts of suppressed reports.
    fn flush(&self) {}
}

impl<F> ErrorReporter for F
where
    F: Fn(&str, &DeliveryError) + Send + Sync,
{
    fn report(&self, context: &str, error: &DeliveryError) {
        self(context, error)
    }
}

/// Reporter writing failures to the `log` facade at warn level.
///
/// Reports are rate limited so an unreachable backend cannot flood the
/// secondary log; suppressed reports are counted and mentioned in the next
/// warning.
pub struct LogReporter {
    name: String,
    warner: RateLimitedWarner,
}

impl LogReporter {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_interval(name, DEFAULT_WARN_INTERVAL)
    }

    pub fn with_interval(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            warner: RateLimitedWarner::new(interval),
        }
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new("logrelay")
    }
}

impl ErrorReporter for LogReporter {
    fn report(&self, context: &str, error: &DeliveryError) {
        let emitted = self.warner.warn_if_due(|suppressed| {
            if suppressed > 0 {
                warn!(
                    "{}: {}: {context}: {error} ({suppressed} earlier failures suppressed)",
                    self.name,
                    error.kind()
                );
            } else {
                warn!("{}: {}: {context}: {error}", self.name, error.kind());
            }
        });
        if !emitted {
            debug!("{}: {}: {context}: {error}", self.name, error.kind());
        }
    }

    /// Log the number of reports suppressed since the last warning.
    fn flush(&self) {
        self.warner.flush(|count| {
            warn!("{}: {count} further delivery failures suppressed", self.name);
        });
    }
}

/// Owned snapshot of a reported failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureReport {
    pub kind: ErrorKind,
    pub context: String,
    pub message: String,
}

impl FailureReport {
    pub fn new(context: &str, error: &DeliveryError) -> Self {
        Self {
            kind: error.kind(),
            context: context.to_owned(),
            message: error.to_string(),
        }
    }
}

/// Reporter forwarding failures over a bounded channel.
///
/// When the channel is full further reports are dropped rather than blocking
/// the publishing thread.
#[derive(Clone, Debug)]
pub struct ChannelReporter {
    tx: Sender<FailureReport>,
}

impl ChannelReporter {
    pub fn new(capacity: usize) -> (Self, Receiver<FailureReport>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx }, rx)
    }
}

impl ErrorReporter for ChannelReporter {
    fn report(&self, context: &str, error: &DeliveryError) {
        match self.tx.try_send(FailureReport::new(context, error)) {
            Ok(()) => {}
            Err(TrySendError::Full(report)) => {
                debug!("failure channel full; dropping report: {}", report.message);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
