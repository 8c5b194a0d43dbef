//! Bridge from captured entries into `tracing`

use super::LogSink;
use crate::errors::Result;
use faultline_core_types::{LogContext, SeverityLevel};

/// Emits each entry as a `tracing` event under the `faultline::capture` target
///
/// `tracing` has five levels, so `notice` shares INFO and everything from
/// `error` upward shares ERROR; the exact severity is kept in the `severity`
/// field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, severity: SeverityLevel, message: &str, context: &LogContext) -> Result<()> {
        let context = serde_json::Value::Object(context.clone()).to_string();
        let severity_name = severity.as_str();
        match severity {
            SeverityLevel::Debug => {
                tracing::debug!(target: "faultline::capture", severity = severity_name, context = %context, "{}", message)
            }
            SeverityLevel::Info | SeverityLevel::Notice => {
                tracing::info!(target: "faultline::capture", severity = severity_name, context = %context, "{}", message)
            }
            SeverityLevel::Warning => {
                tracing::warn!(target: "faultline::capture", severity = severity_name, context = %context, "{}", message)
            }
            SeverityLevel::Error
            | SeverityLevel::Critical
            | SeverityLevel::Alert
            | SeverityLevel::Emergency => {
                tracing::error!(target: "faultline::capture", severity = severity_name, context = %context, "{}", message)
            }
        }
        Ok(())
    }
}
