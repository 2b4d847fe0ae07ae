//! Vendor-agnostic header sink for timing records.
//!
//! The registry does not talk to an HTTP stack directly. Each completed
//! `profile` toggle produces one [`TimingRecord`] and hands it to a
//! [`HeaderSink`]; the host decides how records reach the response. Multiple
//! records are distinct `Server-Timing` header instances, never merged into
//! one value, so the host's response machinery must support repeated fields.

use serde::Serialize;
use std::sync::Mutex;

/// One completed measurement, ready for header emission.
///
/// The name has already been sanitized for the header character set (see
/// [`crate::sanitize_metric_name`]); the duration is elapsed wall-clock
/// milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct TimingRecord {
    pub name: String,
    pub duration_ms: f64,
}

impl TimingRecord {
    /// Header field name the rendered value belongs under.
    pub const HEADER_NAME: &'static str = "Server-Timing";

    pub fn new(name: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            name: name.into(),
            duration_ms,
        }
    }

    /// Render the `Server-Timing` field value.
    ///
    /// The duration is a plain decimal number; the `dur` parameter carries
    /// the unit per the Server-Timing grammar.
    pub fn header_value(&self) -> String {
        format!(
            "{name};dur={dur};desc={name}",
            name = self.name,
            dur = self.duration_ms
        )
    }
}

/// Receives one record per completed `profile` toggle.
///
/// Implementations must be `Send + Sync` and should return quickly; they are
/// called synchronously on the request path.
pub trait HeaderSink: Send + Sync {
    fn on_record(&self, record: &TimingRecord);
}

/// Default sink; records are silently dropped.
pub struct NoOpHeaderSink;

impl HeaderSink for NoOpHeaderSink {
    fn on_record(&self, _record: &TimingRecord) {}
}

/// Buffers rendered header values in memory.
///
/// Hosts drain the buffer onto their response once the request is done;
/// tests use it to observe emissions.
#[derive(Default)]
pub struct MemoryHeaderSink {
    values: Mutex<Vec<String>>,
}

impl MemoryHeaderSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered header values in emission order.
    pub fn values(&self) -> Vec<String> {
        self.values.lock().unwrap().clone()
    }

    /// Remove and return all buffered values.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.values.lock().unwrap())
    }
}

impl HeaderSink for MemoryHeaderSink {
    fn on_record(&self, record: &TimingRecord) {
        self.values.lock().unwrap().push(record.header_value());
    }
}
