//! Options shared by the publisher builders.

use std::{fmt, sync::Arc, time::Duration};

use super::{HandlerBuildError, builder_macros::ensure_positive};
use crate::{
    encoder::{EncoderKind, SharedEncoder},
    level::Level,
    publisher::Publisher,
    report::ErrorReporter,
    transport::{BackoffPolicy, Transport},
};

#[derive(Clone, Default)]
pub(crate) struct CommonOptions {
    pub(crate) level: Option<Level>,
    pub(crate) encoder: Option<SharedEncoder>,
    pub(crate) reporter: Option<Arc<dyn ErrorReporter>>,
    pub(crate) connect_timeout_ms: Option<u64>,
    pub(crate) write_timeout_ms: Option<u64>,
}

impl CommonOptions {
    pub(crate) fn validate(&self) -> Result<(), HandlerBuildError> {
        if let Some(timeout) = self.connect_timeout_ms {
            ensure_positive!(timeout, "connect_timeout_ms")?;
        }
        if let Some(timeout) = self.write_timeout_ms {
            ensure_positive!(timeout, "write_timeout_ms")?;
        }
        Ok(())
    }

    pub(crate) fn connect_timeout(&self, default: Duration) -> Duration {
        self.connect_timeout_ms.map_or(default, Duration::from_millis)
    }

    pub(crate) fn write_timeout(&self, default: Duration) -> Duration {
        self.write_timeout_ms.map_or(default, Duration::from_millis)
    }

    /// Wrap `transport` in a publisher carrying these options.
    pub(crate) fn publisher<T>(&self, transport: T, default_encoder: EncoderKind) -> Publisher
    where
        T: Transport + 'static,
    {
        let encoder = self
            .encoder
            .clone()
            .unwrap_or_else(|| default_encoder.shared());
        let mut publisher = Publisher::new(transport)
            .with_encoder(encoder)
            .with_level(self.level.unwrap_or_default());
        if let Some(reporter) = &self.reporter {
            publisher = publisher.with_reporter(Arc::clone(reporter));
        }
        publisher
    }
}

impl fmt::Debug for CommonOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonOptions")
            .field("level", &self.level)
            .field("encoder", &self.encoder)
            .field("reporter", &self.reporter.as_ref().map(|_| ".."))
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("write_timeout_ms", &self.write_timeout_ms)
            .finish()
    }
}

/// Overrides for the reconnection backoff timings.
#[derive(Clone, Debug, Default)]
pub struct BackoffOverrides {
    base_ms: Option<u64>,
    cap_ms: Option<u64>,
    reset_after_ms: Option<u64>,
    deadline_ms: Option<u64>,
}

impl BackoffOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the base jitter duration in milliseconds.
    pub fn with_base_ms(mut self, base_ms: u64) -> Self {
        self.base_ms = Some(base_ms);
        self
    }

    /// Override the maximum delay in milliseconds.
    pub fn with_cap_ms(mut self, cap_ms: u64) -> Self {
        self.cap_ms = Some(cap_ms);
        self
    }

    /// Override how long healthy writes must last before backoff resets.
    pub fn with_reset_after_ms(mut self, reset_after_ms: u64) -> Self {
        self.reset_after_ms = Some(reset_after_ms);
        self
    }

    /// Override how long reconnects are attempted after the first failure.
    pub fn with_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }

    pub(crate) fn policy(&self) -> Result<BackoffPolicy, HandlerBuildError> {
        let mut policy = BackoffPolicy::default();
        if let Some(base) = self.base_ms {
            ensure_positive!(base, "backoff_base_ms")?;
            policy.base = Duration::from_millis(base);
        }
        if let Some(cap) = self.cap_ms {
            ensure_positive!(cap, "backoff_cap_ms")?;
            policy.cap = Duration::from_millis(cap);
        }
        if let Some(reset) = self.reset_after_ms {
            ensure_positive!(reset, "backoff_reset_after_ms")?;
            policy.reset_after = Duration::from_millis(reset);
        }
        if let Some(deadline) = self.deadline_ms {
            ensure_positive!(deadline, "backoff_deadline_ms")?;
            policy.deadline = Duration::from_millis(deadline);
        }
        if policy.cap < policy.base {
            return Err(HandlerBuildError::InvalidConfig(
                "backoff_cap_ms must not be smaller than backoff_base_ms".into(),
            ));
        }
        Ok(policy)
    }
}
