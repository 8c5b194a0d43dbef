//! Severity floor decorator

use super::LogSink;
use crate::errors::Result;
use faultline_core_types::{LogContext, SeverityLevel};

/// Forwards entries at or above `floor` to the wrapped sink and drops the rest
///
/// Cheap enough to build per call; the floor is fixed at construction.
#[derive(Debug, Clone)]
pub struct SeverityRangeFilter<S> {
    inner: S,
    floor: SeverityLevel,
}

impl<S: LogSink> SeverityRangeFilter<S> {
    pub fn new(inner: S, floor: SeverityLevel) -> Self {
        Self { inner, floor }
    }

    pub fn floor(&self) -> SeverityLevel {
        self.floor
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: LogSink> LogSink for SeverityRangeFilter<S> {
    fn log(&self, severity: SeverityLevel, message: &str, context: &LogContext) -> Result<()> {
        if !severity.reaches(self.floor) {
            return Ok(());
        }
        self.inner.log(severity, message, context)
    }
}
