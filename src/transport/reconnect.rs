//! Opt-in reconnection for the framed socket transport.
//!
//! [`FramedSocketTransport`] never reconnects on its own. Wrapping it in a
//! [`ReconnectingTransport`] adds a supervisor: after a write failure the next
//! send that arrives once the backoff delay has elapsed re-establishes the
//! connection before writing. The failed payload itself is never re-sent and
//! no thread ever sleeps. Once the backoff deadline has passed, attempts
//! continue at the `cap` interval until the collector comes back.

use std::time::Instant;

use log::{info, warn};
use parking_lot::Mutex;

use super::{
    Ack, Transport,
    backoff::{BackoffPolicy, BackoffState},
    socket::FramedSocketTransport,
};
use crate::error::DeliveryError;

struct Schedule {
    backoff: BackoffState,
    /// Earliest instant the next reconnect may be attempted.
    next_attempt: Option<Instant>,
    /// Set once the backoff deadline passed during the current outage.
    exhausted: bool,
}

impl Schedule {
    fn failed(&mut self, now: Instant, endpoint: &str) {
        let delay = match self.backoff.next_delay(now) {
            Some(delay) => delay,
            None => {
                let cap = self.backoff.cap();
                if !self.exhausted {
                    warn!(
                        "backoff deadline exceeded for {endpoint}; retrying every {}ms",
                        cap.as_millis()
                    );
                }
                self.exhausted = true;
                cap
            }
        };
        self.next_attempt = Some(now + delay);
    }

    fn succeeded(&mut self, now: Instant) {
        if self.exhausted {
            self.exhausted = false;
            self.backoff.restart();
        } else {
            self.backoff.record_success(now);
        }
    }

    fn due(&self, now: Instant) -> bool {
        self.next_attempt.is_none_or(|at| now >= at)
    }
}

/// Socket transport that re-establishes lost connections with backoff.
pub struct ReconnectingTransport {
    inner: FramedSocketTransport,
    schedule: Mutex<Schedule>,
}

impl ReconnectingTransport {
    pub fn new(inner: FramedSocketTransport, policy: BackoffPolicy) -> Self {
        Self {
            inner,
            schedule: Mutex::new(Schedule {
                backoff: BackoffState::new(policy),
                next_attempt: None,
                exhausted: false,
            }),
        }
    }

    pub fn inner(&self) -> &FramedSocketTransport {
        &self.inner
    }

    fn reconnect_if_due(&self, now: Instant) -> Result<(), DeliveryError> {
        let mut schedule = self.schedule.lock();
        // Another sender may have reconnected while we waited for the lock.
        if !self.inner.is_broken() || !schedule.due(now) {
            return Ok(());
        }
        match self.inner.reconnect() {
            Ok(()) => {
                info!("reconnected to {}", self.inner.endpoint());
                schedule.next_attempt = None;
                Ok(())
            }
            Err(err) => {
                schedule.failed(now, &self.inner.endpoint());
                Err(err)
            }
        }
    }
}

impl Transport for ReconnectingTransport {
    fn send(&self, payload: &[u8]) -> Result<Ack, DeliveryError> {
        let now = Instant::now();
        if self.inner.is_broken() {
            self.reconnect_if_due(now)?;
        }
        match self.inner.send(payload) {
            Ok(ack) => {
                self.schedule.lock().succeeded(now);
                Ok(ack)
            }
            Err(err) => {
                if self.inner.is_broken() {
                    let mut schedule = self.schedule.lock();
                    if schedule.next_attempt.is_none() {
                        schedule.failed(now, &self.inner.endpoint());
                    }
                }
                Err(err)
            }
        }
    }

    fn flush(&self) -> Result<(), DeliveryError> {
        self.inner.flush()
    }

    fn close(&self) -> Result<(), DeliveryError> {
        self.inner.close()
    }

    fn endpoint(&self) -> String {
        self.inner.endpoint()
    }
}
