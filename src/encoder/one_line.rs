//! Compact human-readable encoder for line-oriented collectors.

use chrono::{FixedOffset, Local};

use super::escape::escape_into;
use super::json::format_date;
use super::{EncodeError, Encoder};
use crate::log_record::LogRecord;

/// Encoder producing `<date> <LEVEL> [<logger>] <class>.<method>: <message>`.
///
/// Control characters in any field are escaped so each record occupies a
/// single physical line. No terminator is appended; socket framing supplies
/// the trailing newline.
#[derive(Clone, Copy, Debug, Default)]
pub struct OneLineEncoder {
    offset: Option<FixedOffset>,
}

impl OneLineEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
        }
    }
}

impl Encoder for OneLineEncoder {
    fn encode(&self, record: &LogRecord) -> Result<String, EncodeError> {
        let mut out = match self.offset {
            Some(offset) => format_date(record.millis, &offset),
            None => format_date(record.millis, &Local),
        };
        out.push(' ');
        out.push_str(record.level.name());
        out.push_str(" [");
        escape_into(&mut out, record.logger());
        out.push(']');
        let class = record.source_class.as_deref().unwrap_or_default();
        let method = record.source_method.as_deref().unwrap_or_default();
        if !class.is_empty() || !method.is_empty() {
            out.push(' ');
            escape_into(&mut out, class);
            if !method.is_empty() {
                out.push('.');
                escape_into(&mut out, method);
            }
        }
        out.push_str(": ");
        escape_into(&mut out, record.message());
        Ok(out)
    }
}
