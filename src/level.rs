//! Severity levels understood by publishers and encoders.
//!
//! Levels are ordered from the most verbose (`Finest`) to the most severe
//! (`Severe`). `All` and `Off` are threshold sentinels: a publisher set to
//! `All` accepts every record and one set to `Off` accepts none.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    All,
    Finest,
    Finer,
    Fine,
    Config,
    Info,
    Warning,
    Severe,
    Off,
}

/// Returned when a level name or value is not recognised.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown level {0:?}")]
pub struct ParseLevelError(pub String);

impl Default for Level {
    fn default() -> Self {
        Self::Info
    }
}

impl Level {
    /// Canonical upper-case name emitted on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Level::All => "ALL",
            Level::Finest => "FINEST",
            Level::Finer => "FINER",
            Level::Fine => "FINE",
            Level::Config => "CONFIG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Severe => "SEVERE",
            Level::Off => "OFF",
        }
    }

    /// Numeric weight of the level; larger is more severe.
    pub fn value(self) -> i32 {
        match self {
            Level::All => i32::MIN,
            Level::Finest => 300,
            Level::Finer => 400,
            Level::Fine => 500,
            Level::Config => 700,
            Level::Info => 800,
            Level::Warning => 900,
            Level::Severe => 1000,
            Level::Off => i32::MAX,
        }
    }

    fn from_value(value: i32) -> Option<Self> {
        [
            Level::All,
            Level::Finest,
            Level::Finer,
            Level::Fine,
            Level::Config,
            Level::Info,
            Level::Warning,
            Level::Severe,
            Level::Off,
        ]
        .into_iter()
        .find(|level| level.value() == value)
    }

    /// Parse `s`, falling back to [`Level::Info`] when it is not a level.
    pub fn parse_or_info(s: &str) -> Self {
        s.parse().unwrap_or(Self::Info)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let level = match trimmed.to_ascii_uppercase().as_str() {
            "ALL" => Some(Self::All),
            "FINEST" | "TRACE" => Some(Self::Finest),
            "FINER" => Some(Self::Finer),
            "FINE" | "DEBUG" => Some(Self::Fine),
            "CONFIG" => Some(Self::Config),
            "INFO" => Some(Self::Info),
            "WARNING" | "WARN" => Some(Self::Warning),
            "SEVERE" | "ERROR" => Some(Self::Severe),
            "OFF" => Some(Self::Off),
            other => other.parse::<i32>().ok().and_then(Self::from_value),
        };
        level.ok_or_else(|| ParseLevelError(trimmed.to_owned()))
    }
}
