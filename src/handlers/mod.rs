//! Publisher builders and associated traits.
//!
//! Each builder validates its options and returns a ready [`Publisher`]
//! bound to one transport. Builders never open connections; the socket
//! transport connects lazily on the first send.

use std::io;

use thiserror::Error;

use crate::publisher::Publisher;

pub(crate) mod builder_macros;
mod common;
pub mod http_builder;
pub mod socket_builder;

pub use common::BackoffOverrides;
pub use http_builder::HttpPublisherBuilder;
pub use socket_builder::SocketPublisherBuilder;

/// Errors that may occur while building a publisher.
#[derive(Debug, Error)]
pub enum HandlerBuildError {
    /// Invalid user supplied configuration.
    #[error("invalid publisher configuration: {0}")]
    InvalidConfig(String),
    /// Underlying I/O error whilst creating the publisher.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Trait implemented by all publisher builders.
pub trait PublisherBuilderTrait: Send + Sync {
    /// Build the publisher instance.
    fn build(&self) -> Result<Publisher, HandlerBuildError>;
}
