//! Fan-out sink

use super::{LogSink, SharedSink};
use crate::errors::Result;
use faultline_core_types::{LogContext, SeverityLevel};
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// Sink that forwards every entry to each registered sink in registration order
///
/// Registration is append-only and not deduplicated: adding the same sink
/// twice delivers every entry to it twice. The first sink error stops the
/// fan-out and is returned to the caller; later sinks do not see the entry.
#[derive(Default)]
pub struct CompositeSink {
    sinks: RwLock<Vec<SharedSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sink
    pub fn add(&self, sink: SharedSink) {
        self.sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    /// Number of registered sinks
    pub fn len(&self) -> usize {
        self.sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registered sink
    pub fn clear(&self) {
        self.sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn snapshot(&self) -> Vec<SharedSink> {
        self.sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LogSink for CompositeSink {
    fn log(&self, severity: SeverityLevel, message: &str, context: &LogContext) -> Result<()> {
        // Deliver from a snapshot so a sink may register further sinks without deadlocking.
        for sink in self.snapshot() {
            sink.log(severity, message, context)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CompositeSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeSink")
            .field("sinks", &self.len())
            .finish()
    }
}
