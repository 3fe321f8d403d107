//! Builder for publishers backed by [`FramedSocketTransport`].
//!
//! Exposes endpoint and token configuration, timeout tuning, TLS and the
//! optional reconnection supervisor.

use std::io;

use super::{
    HandlerBuildError, PublisherBuilderTrait,
    builder_macros::{common_setters, ensure_positive, option_setter},
    common::{BackoffOverrides, CommonOptions},
};
use crate::{
    encoder::EncoderKind,
    error::DeliveryError,
    publisher::Publisher,
    transport::{
        FramedSocketTransport, ReconnectingTransport, SocketConfig, TlsOptions,
        socket::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_WRITE_TIMEOUT},
    },
};

#[derive(Clone, Debug, Default)]
struct TlsConfig {
    domain: Option<String>,
    insecure: bool,
}

/// Builder for socket publishers.
///
/// Unset fields fall back to `data.logentries.com:514`, an empty token and the
/// one-line encoder.
#[derive(Clone, Debug, Default)]
pub struct SocketPublisherBuilder {
    pub(crate) common: CommonOptions,
    host: Option<String>,
    port: Option<u16>,
    token: Option<String>,
    max_frame_size: Option<usize>,
    tls: Option<TlsConfig>,
    reconnect: Option<BackoffOverrides>,
    connect_on_build: bool,
}

impl SocketPublisherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collector host and port.
    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the token prefixed to every frame.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Configure TLS using the provided domain and validation policy.
    ///
    /// The host name is used for certificate validation when `domain` is
    /// `None` or blank.
    pub fn with_tls(mut self, domain: Option<String>, insecure: bool) -> Self {
        self.tls = Some(TlsConfig { domain, insecure });
        self
    }

    /// Re-establish broken connections on later sends, waiting out the given
    /// backoff between attempts.
    pub fn with_reconnect(mut self, overrides: BackoffOverrides) -> Self {
        self.reconnect = Some(overrides);
        self
    }

    /// Open the connection while building instead of on the first send.
    ///
    /// Building then fails with [`HandlerBuildError::Io`] when the collector
    /// is unreachable.
    pub fn with_connect_on_build(mut self, enabled: bool) -> Self {
        self.connect_on_build = enabled;
        self
    }

    option_setter!(with_port, port, u16);
    option_setter!(
        #[doc = "Limit the size of a single frame in bytes."]
        with_max_frame_size,
        max_frame_size,
        usize
    );
    common_setters!();

    fn validate(&self) -> Result<(), HandlerBuildError> {
        self.common.validate()?;
        if let Some(host) = &self.host
            && host.trim().is_empty()
        {
            return Err(HandlerBuildError::InvalidConfig(
                "host must not be empty".into(),
            ));
        }
        if let Some(port) = self.port {
            ensure_positive!(port, "port")?;
        }
        if let Some(size) = self.max_frame_size {
            ensure_positive!(size, "max_frame_size")?;
        }
        if let Some(token) = &self.token
            && token.contains(['\n', '\r'])
        {
            return Err(HandlerBuildError::InvalidConfig(
                "token must not contain line breaks".into(),
            ));
        }
        Ok(())
    }

    /// Validate the builder and produce the transport configuration.
    pub fn build_config(&self) -> Result<SocketConfig, HandlerBuildError> {
        self.validate()?;
        let host = self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let mut config = SocketConfig::new(
            host.clone(),
            self.port.unwrap_or(DEFAULT_PORT),
            self.token.clone().unwrap_or_default(),
        );
        config.connect_timeout = self.common.connect_timeout(DEFAULT_CONNECT_TIMEOUT);
        config.write_timeout = Some(self.common.write_timeout(DEFAULT_WRITE_TIMEOUT));
        if let Some(size) = self.max_frame_size {
            config.max_frame_size = size;
        }
        config.tls = self.tls.as_ref().map(|tls| TlsOptions {
            domain: tls
                .domain
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(host),
            insecure_skip_verify: tls.insecure,
        });
        Ok(config)
    }
}

impl PublisherBuilderTrait for SocketPublisherBuilder {
    fn build(&self) -> Result<Publisher, HandlerBuildError> {
        let config = self.build_config()?;
        let transport = FramedSocketTransport::new(config);
        if self.connect_on_build {
            transport.connect().map_err(|err| match err {
                DeliveryError::Open { source, .. } => HandlerBuildError::Io(source),
                other => HandlerBuildError::Io(io::Error::other(other.to_string())),
            })?;
        }
        let publisher = match &self.reconnect {
            Some(overrides) => {
                let policy = overrides.policy()?;
                self.common.publisher(
                    ReconnectingTransport::new(transport, policy),
                    EncoderKind::OneLine,
                )
            }
            None => self.common.publisher(transport, EncoderKind::OneLine),
        };
        Ok(publisher)
    }
}
