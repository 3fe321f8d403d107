//! Delivery failures and their classification.
//!
//! Every failure raised while formatting, connecting, writing or closing is a
//! [`DeliveryError`]. Publishers never propagate these to the caller; they
//! hand them to an [`ErrorReporter`](crate::report::ErrorReporter) tagged with
//! the coarse [`ErrorKind`].

use std::{fmt, io};

use thiserror::Error;

use crate::encoder::EncodeError;

/// Coarse failure classes reported to the error sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The record could not be encoded; nothing was sent.
    FormatFailure,
    /// The transport could not establish its connection.
    OpenFailure,
    /// An I/O error interrupted an in-progress send.
    WriteFailure,
    /// The endpoint answered with a status other than the expected one.
    UnexpectedStatus,
    /// Releasing the transport's resources failed.
    CloseFailure,
    /// A configuration value was malformed and its default was used.
    ConfigFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::FormatFailure => "format failure",
            ErrorKind::OpenFailure => "open failure",
            ErrorKind::WriteFailure => "write failure",
            ErrorKind::UnexpectedStatus => "unexpected status",
            ErrorKind::CloseFailure => "close failure",
            ErrorKind::ConfigFailure => "config failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Format(#[from] EncodeError),
    /// The encoder panicked while producing the payload.
    #[error("encoder panicked: {0}")]
    FormatPanic(String),
    #[error("failed to connect to {endpoint}: {source}")]
    Open {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// Network-level failure while sending.
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),
    #[error("expected HTTP status 204, got {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("frame of {size} bytes exceeds the {capacity} byte limit")]
    PayloadTooLarge { size: usize, capacity: usize },
    #[error("failed to close transport: {0}")]
    Close(#[source] io::Error),
    #[error("transport is closed")]
    Closed,
    #[error("invalid value {value:?} for {key}: {reason}")]
    Config {
        key: String,
        value: String,
        reason: String,
    },
}

impl DeliveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeliveryError::Format(_) | DeliveryError::FormatPanic(_) => ErrorKind::FormatFailure,
            DeliveryError::Open { .. } => ErrorKind::OpenFailure,
            DeliveryError::Transport(_)
            | DeliveryError::PayloadTooLarge { .. }
            | DeliveryError::Closed => ErrorKind::WriteFailure,
            DeliveryError::UnexpectedStatus { .. } => ErrorKind::UnexpectedStatus,
            DeliveryError::Close(_) => ErrorKind::CloseFailure,
            DeliveryError::Config { .. } => ErrorKind::ConfigFailure,
        }
    }

    pub(crate) fn config(key: &str, value: &str, reason: impl fmt::Display) -> Self {
        DeliveryError::Config {
            key: key.to_owned(),
            value: value.to_owned(),
            reason: reason.to_string(),
        }
    }
}
