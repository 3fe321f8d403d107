//! Builder for publishers backed by [`HttpTransport`].
//!
//! Exposes the room, auth token, API endpoint and timeouts. The JSON encoder
//! is used unless another one is configured.

use super::{
    HandlerBuildError, PublisherBuilderTrait,
    builder_macros::common_setters,
    common::CommonOptions,
};
use crate::{
    encoder::EncoderKind,
    publisher::Publisher,
    transport::{
        HttpConfig, HttpTransport,
        http::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_WRITE_TIMEOUT},
    },
};

/// Builder for HTTP notification publishers.
#[derive(Clone, Debug, Default)]
pub struct HttpPublisherBuilder {
    pub(crate) common: CommonOptions,
    room: Option<String>,
    token: Option<String>,
    api_host: Option<String>,
    scheme: Option<String>,
}

impl HttpPublisherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the room notifications are posted to (required).
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// Set the bearer token sent with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the API host, optionally including a port.
    pub fn with_api_host(mut self, api_host: impl Into<String>) -> Self {
        self.api_host = Some(api_host.into());
        self
    }

    /// Override the URL scheme (`https` or `http`).
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    common_setters!();

    fn validate(&self) -> Result<(), HandlerBuildError> {
        self.common.validate()?;
        match &self.room {
            None => {
                return Err(HandlerBuildError::InvalidConfig(
                    "HTTP publisher requires a room".into(),
                ));
            }
            Some(room) if room.trim().is_empty() => {
                return Err(HandlerBuildError::InvalidConfig(
                    "room must not be empty".into(),
                ));
            }
            Some(_) => {}
        }
        if let Some(host) = &self.api_host
            && (host.trim().is_empty() || host.contains('/'))
        {
            return Err(HandlerBuildError::InvalidConfig(format!(
                "api_host {host:?} is not a host name"
            )));
        }
        if let Some(scheme) = &self.scheme
            && !matches!(scheme.as_str(), "http" | "https")
        {
            return Err(HandlerBuildError::InvalidConfig(format!(
                "unsupported scheme {scheme:?}"
            )));
        }
        if let Some(token) = &self.token
            && token.chars().any(char::is_control)
        {
            return Err(HandlerBuildError::InvalidConfig(
                "token must not contain control characters".into(),
            ));
        }
        Ok(())
    }

    /// Validate the builder and produce the transport configuration.
    pub fn build_config(&self) -> Result<HttpConfig, HandlerBuildError> {
        self.validate()?;
        let mut config = HttpConfig::new(
            self.room.clone().unwrap_or_default(),
            self.token.clone().unwrap_or_default(),
        );
        if let Some(host) = &self.api_host {
            config.api_host = host.clone();
        }
        if let Some(scheme) = &self.scheme {
            config.scheme = scheme.clone();
        }
        config.connect_timeout = self.common.connect_timeout(DEFAULT_CONNECT_TIMEOUT);
        config.write_timeout = self.common.write_timeout(DEFAULT_WRITE_TIMEOUT);
        Ok(config)
    }
}

impl PublisherBuilderTrait for HttpPublisherBuilder {
    fn build(&self) -> Result<Publisher, HandlerBuildError> {
        let config = self.build_config()?;
        Ok(self
            .common
            .publisher(HttpTransport::new(config), EncoderKind::Json))
    }
}
