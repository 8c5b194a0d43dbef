//! Log sinks and the two composition primitives
//!
//! A [`LogSink`] accepts `(severity, message, context)`. Capture pathways never
//! talk to a concrete sink directly: they push entries through a
//! [`SeverityRangeFilter`] wrapping a [`CompositeSink`] that fans out to every
//! sink registered for that pathway.

pub mod composite;
pub mod memory;
pub mod range_filter;
pub mod stream;
pub mod tracing_sink;

use crate::errors::Result;
use faultline_core_types::{LogContext, SeverityLevel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use composite::CompositeSink;
pub use memory::MemorySink;
pub use range_filter::SeverityRangeFilter;
pub use stream::StreamSink;
pub use tracing_sink::TracingSink;

/// Delivery endpoint for structured log entries
///
/// Implementations may block (for instance on a file write). A returned error
/// aborts the delivery in progress: callers such as [`CompositeSink`] do not
/// retry or skip failing sinks.
pub trait LogSink: Send + Sync {
    /// Accept one entry
    fn log(&self, severity: SeverityLevel, message: &str, context: &LogContext) -> Result<()>;
}

/// Shared handle to a registered sink
pub type SharedSink = Arc<dyn LogSink>;

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn log(&self, severity: SeverityLevel, message: &str, context: &LogContext) -> Result<()> {
        (**self).log(severity, message, context)
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn log(&self, severity: SeverityLevel, message: &str, context: &LogContext) -> Result<()> {
        (**self).log(severity, message, context)
    }
}

impl<S: LogSink + ?Sized> LogSink for &S {
    fn log(&self, severity: SeverityLevel, message: &str, context: &LogContext) -> Result<()> {
        (**self).log(severity, message, context)
    }
}

/// One delivered entry, as kept by [`MemorySink`] and written by [`StreamSink`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "level")]
    pub severity: SeverityLevel,
    pub message: String,
    pub context: LogContext,
}

impl LogEntry {
    pub fn new(severity: SeverityLevel, message: impl Into<String>, context: LogContext) -> Self {
        Self {
            severity,
            message: message.into(),
            context,
        }
    }
}
