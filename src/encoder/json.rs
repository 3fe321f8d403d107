//! Single-line JSON encoder.
//!
//! Emits `{"date":..,"millis":..,"sequence":..,"logger":..,"level":..,
//! "class":..,"method":..,"thread":..,"message":..}` followed by `\r\n`.
//! Field order is fixed. The `params` array is appended only when the record
//! carries parameters.

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};

use super::escape::quote_into;
use super::{EncodeError, Encoder};
use crate::log_record::LogRecord;

/// Line terminator appended to every encoded record.
pub const RECORD_SEPARATOR: &str = "\r\n";

const INITIAL_CAPACITY: usize = 256;
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Render `millis` as an ISO-8601 timestamp with millisecond precision in
/// zone `tz`. Out-of-range values render as the epoch.
pub(crate) fn format_date<Tz>(millis: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let utc: DateTime<Utc> = DateTime::from_timestamp_millis(millis).unwrap_or_default();
    utc.with_timezone(tz).format(DATE_FORMAT).to_string()
}

/// Encoder producing line-delimited JSON objects.
///
/// Dates are rendered in the local time zone unless a fixed offset is pinned
/// with [`JsonEncoder::with_offset`].
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEncoder {
    offset: Option<FixedOffset>,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render dates using `offset` instead of the local time zone.
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
        }
    }

    fn date(&self, millis: i64) -> String {
        match self.offset {
            Some(offset) => format_date(millis, &offset),
            None => format_date(millis, &Local),
        }
    }

    /// Encode `record`; this never fails.
    pub fn encode_record(&self, record: &LogRecord) -> String {
        let mut fields = FieldWriter::new(INITIAL_CAPACITY);
        fields.string("date", Some(&self.date(record.millis)));
        fields.number("millis", record.millis);
        fields.number("sequence", record.sequence);
        fields.string("logger", record.logger.as_deref());
        fields.string("level", Some(record.level.name()));
        fields.string("class", record.source_class.as_deref());
        fields.string("method", record.source_method.as_deref());
        fields.number("thread", record.thread_id);
        fields.string("message", record.message.as_deref());
        if !record.params.is_empty() {
            fields.strings("params", &record.params);
        }
        fields.finish()
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, record: &LogRecord) -> Result<String, EncodeError> {
        Ok(self.encode_record(record))
    }
}

struct FieldWriter {
    out: String,
    empty: bool,
}

impl FieldWriter {
    fn new(capacity: usize) -> Self {
        let mut out = String::with_capacity(capacity);
        out.push('{');
        Self { out, empty: true }
    }

    fn key(&mut self, name: &str) {
        if !self.empty {
            self.out.push(',');
        }
        self.empty = false;
        quote_into(&mut self.out, Some(name));
        self.out.push(':');
    }

    fn string(&mut self, name: &str, value: Option<&str>) {
        self.key(name);
        quote_into(&mut self.out, value);
    }

    fn number(&mut self, name: &str, value: impl ToString) {
        self.key(name);
        self.out.push_str(&value.to_string());
    }

    fn strings(&mut self, name: &str, values: &[String]) {
        self.key(name);
        self.out.push('[');
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            quote_into(&mut self.out, Some(value));
        }
        self.out.push(']');
    }

    fn finish(mut self) -> String {
        self.out.push('}');
        self.out.push_str(RECORD_SEPARATOR);
        self.out
    }
}
