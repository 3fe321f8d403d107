//! Transports hand an encoded payload to one remote endpoint.
//!
//! Two variants ship with the crate:
//!
//! - [`HttpTransport`] POSTs each payload inside a JSON notification envelope
//!   and accepts only `204 No Content`.
//! - [`FramedSocketTransport`] keeps one long-lived TCP connection and writes
//!   `TOKEN SP PAYLOAD LF` frames, looping over partial writes.
//!
//! Neither retries. [`ReconnectingTransport`] is an opt-in wrapper that
//! re-establishes a lost socket connection for later sends.

use std::sync::Arc;

use crate::error::DeliveryError;

pub(crate) mod backoff;
mod connection;
mod frame;
pub mod http;
mod reconnect;
pub mod socket;

pub use backoff::BackoffPolicy;
pub use connection::TlsOptions;
pub use frame::{FrameBuffer, write_frame};
pub use http::{HttpConfig, HttpTransport, envelope};
pub use reconnect::ReconnectingTransport;
pub use socket::{FramedSocketTransport, SocketConfig};

/// Acknowledgement returned by a successful send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ack {
    /// The HTTP endpoint answered with this status.
    Status(u16),
    /// This many frame bytes were written to the socket.
    Written(usize),
}

/// Capability to deliver one payload to a remote endpoint.
///
/// Implementations are shared between publishing threads and must serialise
/// any internal state themselves.
pub trait Transport: Send + Sync {
    /// Deliver `payload`, making a single attempt.
    fn send(&self, payload: &[u8]) -> Result<Ack, DeliveryError>;

    /// Flush buffered bytes, if the transport buffers any.
    fn flush(&self) -> Result<(), DeliveryError> {
        Ok(())
    }

    /// Release owned resources. Calling `close` more than once is harmless.
    fn close(&self) -> Result<(), DeliveryError> {
        Ok(())
    }

    /// Human-readable description of the endpoint for diagnostics.
    fn endpoint(&self) -> String;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, payload: &[u8]) -> Result<Ack, DeliveryError> {
        (**self).send(payload)
    }

    fn flush(&self) -> Result<(), DeliveryError> {
        (**self).flush()
    }

    fn close(&self) -> Result<(), DeliveryError> {
        (**self).close()
    }

    fn endpoint(&self) -> String {
        (**self).endpoint()
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, payload: &[u8]) -> Result<Ack, DeliveryError> {
        (**self).send(payload)
    }

    fn flush(&self) -> Result<(), DeliveryError> {
        (**self).flush()
    }

    fn close(&self) -> Result<(), DeliveryError> {
        (**self).close()
    }

    fn endpoint(&self) -> String {
        (**self).endpoint()
    }
}
