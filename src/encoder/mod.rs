//! Encoders turning a [`LogRecord`] into its wire payload.
//!
//! [`JsonEncoder`] is the canonical, injection-safe wire format.
//! [`OneLineEncoder`] is a compact text form for line-oriented collectors.
//! Both escape application-controlled text with [`escape`] so no raw control
//! character ever reaches a backend.

use std::{fmt, str::FromStr, sync::Arc};

use thiserror::Error;

use crate::log_record::LogRecord;

pub mod escape;
mod json;
mod one_line;

pub use escape::{escape, escape_into};
pub use json::{JsonEncoder, RECORD_SEPARATOR};
pub use one_line::OneLineEncoder;

/// Error raised by an encoder that could not produce a payload.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("failed to encode record: {0}")]
pub struct EncodeError(pub String);

/// Trait for encoding log records into their wire payload.
///
/// Implementors must be thread-safe (`Send + Sync`) so one encoder can serve
/// publishers invoked from many threads.
pub trait Encoder: Send + Sync {
    /// Encode `record`. Built-in encoders never fail.
    fn encode(&self, record: &LogRecord) -> Result<String, EncodeError>;
}

/// Shared encoder trait object used by publishers.
#[derive(Clone)]
pub struct SharedEncoder {
    inner: Arc<dyn Encoder>,
}

impl SharedEncoder {
    pub fn new<E>(encoder: E) -> Self
    where
        E: Encoder + 'static,
    {
        Self {
            inner: Arc::new(encoder),
        }
    }

    pub fn from_arc(inner: Arc<dyn Encoder>) -> Self {
        Self { inner }
    }

    pub fn encode(&self, record: &LogRecord) -> Result<String, EncodeError> {
        self.inner.encode(record)
    }
}

impl fmt::Debug for SharedEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedEncoder(<dyn Encoder>)")
    }
}

impl Default for SharedEncoder {
    fn default() -> Self {
        Self::new(JsonEncoder::new())
    }
}

/// Built-in encoders selectable by name from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncoderKind {
    Json,
    OneLine,
}

impl EncoderKind {
    pub fn shared(self) -> SharedEncoder {
        match self {
            EncoderKind::Json => SharedEncoder::new(JsonEncoder::new()),
            EncoderKind::OneLine => SharedEncoder::new(OneLineEncoder::new()),
        }
    }
}

impl FromStr for EncoderKind {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "oneline" | "one-line" | "one_line" => Ok(Self::OneLine),
            other => Err(EncodeError(format!("unknown encoder {other:?}"))),
        }
    }
}

impl Encoder for Arc<dyn Encoder> {
    fn encode(&self, record: &LogRecord) -> Result<String, EncodeError> {
        (**self).encode(record)
    }
}

impl Encoder for Box<dyn Encoder> {
    fn encode(&self, record: &LogRecord) -> Result<String, EncodeError> {
        (**self).encode(record)
    }
}
