//! In-memory sink

use super::{LogEntry, LogSink};
use crate::errors::Result;
use faultline_core_types::{LogContext, SeverityLevel};
use std::sync::{Arc, Mutex, PoisonError};

/// Keeps every delivered entry in order
///
/// Clones share the same buffer, so a test can register one clone and
/// inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every entry delivered so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LogSink for MemorySink {
    fn log(&self, severity: SeverityLevel, message: &str, context: &LogContext) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry::new(severity, message, context.clone()));
        Ok(())
    }
}
