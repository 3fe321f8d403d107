//! Properties-file configuration for the bundled publishers.
//!
//! Settings are read from an INI/properties document with `rust-ini`. Keys
//! live under a prefix, either spelled out (`logrelay.socket.port = 10000`)
//! or grouped in a section (`[logrelay.socket]` then `port = 10000`).
//!
//! | key                   | socket                | http              |
//! |-----------------------|-----------------------|-------------------|
//! | `level`               | `INFO`                | `INFO`            |
//! | `formatter`           | `oneline`             | `json`            |
//! | `host` / `port`       | `data.logentries.com` / `514` | n/a       |
//! | `token`               | empty                 | empty             |
//! | `room`                | n/a                   | required          |
//! | `api_host` / `scheme` | n/a                   | `api.hipchat.com` / `https` |
//! | `connect_timeout_ms`, `write_timeout_ms` | transport default | transport default |
//!
//! Missing keys fall back silently. Malformed values fall back to the default
//! and are reported to the supplied [`ErrorReporter`] as a configuration
//! failure; loading never aborts because of a bad value.

use std::{collections::HashMap, fmt, fs, io, path::Path, str::FromStr, sync::Arc};

use ini::Ini;
use thiserror::Error;

use crate::{
    encoder::EncoderKind,
    error::DeliveryError,
    handlers::{HttpPublisherBuilder, SocketPublisherBuilder},
    level::Level,
    report::ErrorReporter,
};

/// Default key prefix for socket publisher settings.
pub const SOCKET_PREFIX: &str = "logrelay.socket";
/// Default key prefix for HTTP publisher settings.
pub const HTTP_PREFIX: &str = "logrelay.http";

/// Errors raised while loading a properties document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid properties document: {0}")]
    Parse(String),
}

/// Flattened key/value view of a properties document.
///
/// Keys inside a section are stored as `section.key`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse the document at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        text.parse()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// View the keys below `prefix`, reporting malformed values to `reporter`.
    pub fn scoped<'a>(&'a self, prefix: &'a str, reporter: &'a dyn ErrorReporter) -> Scope<'a> {
        Scope {
            props: self,
            prefix,
            reporter,
        }
    }
}

impl FromStr for Properties {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let ini = Ini::load_from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let mut props = Properties::new();
        for (section, entries) in &ini {
            for (key, value) in entries.iter() {
                let key = match section {
                    Some(section) => format!("{section}.{key}"),
                    None => key.to_owned(),
                };
                props.set(key, value.trim());
            }
        }
        Ok(props)
    }
}

/// Typed lookups below one key prefix.
pub struct Scope<'a> {
    props: &'a Properties,
    prefix: &'a str,
    reporter: &'a dyn ErrorReporter,
}

impl Scope<'_> {
    fn key(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_owned()
        } else {
            format!("{}.{name}", self.prefix)
        }
    }

    /// Raw value for `name`; blank values count as missing.
    pub fn string(&self, name: &str) -> Option<String> {
        self.props
            .get(&self.key(name))
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    }

    /// Parse the value for `name`, reporting and discarding malformed input.
    pub fn parse<T>(&self, name: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.string(name)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(err) => {
                self.reject(name, &raw, err);
                None
            }
        }
    }

    /// Parse a strictly positive integer for `name`.
    pub fn positive(&self, name: &str) -> Option<u64> {
        let value = self.parse::<u64>(name)?;
        if value == 0 {
            self.reject(name, "0", "must be greater than zero");
            return None;
        }
        Some(value)
    }

    fn reject(&self, name: &str, raw: &str, reason: impl fmt::Display) {
        let key = self.key(name);
        let err = DeliveryError::config(&key, raw, reason);
        self.reporter.report("ignoring configuration value", &err);
    }
}

impl SocketPublisherBuilder {
    /// Configure a socket publisher from the keys below `prefix`.
    ///
    /// `reporter` receives malformed values and becomes the publisher's
    /// failure sink.
    pub fn from_properties(
        props: &Properties,
        prefix: &str,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let scope = props.scoped(prefix, reporter.as_ref());
        let mut builder = SocketPublisherBuilder::new();
        if let Some(level) = scope.parse::<Level>("level") {
            builder = builder.with_level(level);
        }
        if let Some(kind) = scope.parse::<EncoderKind>("formatter") {
            builder = builder.with_encoder_kind(kind);
        }
        if let Some(host) = scope.string("host") {
            builder = builder.with_host(host);
        }
        if let Some(port) = scope.positive("port") {
            match u16::try_from(port) {
                Ok(port) => builder = builder.with_port(port),
                Err(err) => scope.reject("port", &port.to_string(), err),
            }
        }
        if let Some(token) = scope.string("token") {
            builder = builder.with_token(token);
        }
        if let Some(timeout) = scope.positive("connect_timeout_ms") {
            builder = builder.with_connect_timeout_ms(timeout);
        }
        if let Some(timeout) = scope.positive("write_timeout_ms") {
            builder = builder.with_write_timeout_ms(timeout);
        }
        builder.with_reporter(Arc::clone(&reporter))
    }
}

impl HttpPublisherBuilder {
    /// Configure an HTTP publisher from the keys below `prefix`.
    ///
    /// `reporter` receives malformed values and becomes the publisher's
    /// failure sink. A missing `room` is left for [`build`] to reject.
    ///
    /// [`build`]: crate::handlers::PublisherBuilderTrait::build
    pub fn from_properties(
        props: &Properties,
        prefix: &str,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let scope = props.scoped(prefix, reporter.as_ref());
        let mut builder = HttpPublisherBuilder::new();
        if let Some(level) = scope.parse::<Level>("level") {
            builder = builder.with_level(level);
        }
        if let Some(kind) = scope.parse::<EncoderKind>("formatter") {
            builder = builder.with_encoder_kind(kind);
        }
        if let Some(room) = scope.string("room") {
            builder = builder.with_room(room);
        }
        if let Some(token) = scope.string("token") {
            builder = builder.with_token(token);
        }
        if let Some(host) = scope.string("api_host") {
            builder = builder.with_api_host(host);
        }
        if let Some(scheme) = scope.string("scheme") {
            if matches!(scheme.as_str(), "http" | "https") {
                builder = builder.with_scheme(scheme);
            } else {
                scope.reject("scheme", &scheme, "expected http or https");
            }
        }
        if let Some(timeout) = scope.positive("connect_timeout_ms") {
            builder = builder.with_connect_timeout_ms(timeout);
        }
        if let Some(timeout) = scope.positive("write_timeout_ms") {
            builder = builder.with_write_timeout_ms(timeout);
        }
        builder.with_reporter(Arc::clone(&reporter))
    }
}
