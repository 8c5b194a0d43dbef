//! JSON-lines sink over any writer

use super::{LogEntry, LogSink};
use crate::errors::{FaultlineError, Result};
use faultline_core_types::{LogContext, SeverityLevel};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Writes one JSON object per entry: `{"level":..,"message":..,"context":..}`
///
/// Each entry is flushed before `log` returns, so entries written before a
/// process exit survive it.
#[derive(Debug)]
pub struct StreamSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl StreamSink<File> {
    /// Open `path` for appending, creating it if needed
    ///
    /// # Errors
    ///
    /// [`FaultlineError::Io`] when the file cannot be opened.
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| FaultlineError::io("open_stream_sink", e))?;
        Ok(Self::new(file))
    }
}

impl<W: Write + Send> LogSink for StreamSink<W> {
    fn log(&self, severity: SeverityLevel, message: &str, context: &LogContext) -> Result<()> {
        let entry = LogEntry::new(severity, message, context.clone());
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer
            .write_all(&line)
            .and_then(|_| writer.flush())
            .map_err(|e| FaultlineError::io("stream_sink", e))
    }
}
