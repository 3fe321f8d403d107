//! Ship log records to remote collectors.
//!
//! A [`Publisher`] encodes each [`LogRecord`] with an [`Encoder`] and hands
//! the payload to one [`Transport`]: either an HTTP notification endpoint or
//! a token-framed TCP collector. Publishing is synchronous and never fails
//! the caller; problems go to an [`ErrorReporter`].

pub mod config;
pub mod encoder;
pub mod error;
pub mod handlers;
pub mod level;
pub mod log_compat;
pub mod log_record;
pub mod publisher;
mod rate_limited_warner;
pub mod report;
pub mod transport;

pub use config::{ConfigError, Properties};
pub use encoder::{EncodeError, Encoder, EncoderKind, JsonEncoder, OneLineEncoder, SharedEncoder};
pub use error::{DeliveryError, ErrorKind};
pub use handlers::{
    BackoffOverrides, HandlerBuildError, HttpPublisherBuilder, PublisherBuilderTrait,
    SocketPublisherBuilder,
};
pub use level::Level;
pub use log_compat::RelayLogAdapter;
pub use log_record::LogRecord;
pub use publisher::Publisher;
pub use report::{ChannelReporter, ErrorReporter, FailureReport, LogReporter};
pub use transport::{
    Ack, FramedSocketTransport, HttpConfig, HttpTransport, ReconnectingTransport, SocketConfig,
    Transport,
};
