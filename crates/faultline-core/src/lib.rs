//! Faultline Core - runtime fault capture
//!
//! Captures faults that escape normal handling and routes them, as structured
//! records, to pluggable log sinks:
//! - Four capture pathways (escalation, assertion, fatal, uncaught) installed
//!   into a [`capture::HostRuntime`]
//! - Composite fan-out and severity range filtering of sinks
//! - Bounded, serializable fault records with a stripped fallback
//! - A human-readable fault dump for last-resort diagnostics
//!
//! ```no_run
//! use std::sync::Arc;
//! use faultline_core::capture::{FaultCaptureRegistry, ProcessHost};
//! use faultline_core::sink::StreamSink;
//! use faultline_core::SeverityLevel;
//!
//! # fn main() -> faultline_core::Result<()> {
//! let host = ProcessHost::global();
//! let _exit = host.exit_guard();
//! let registry = FaultCaptureRegistry::new(host.clone());
//! let sink = Arc::new(StreamSink::append("faults.log")?);
//! registry.register_uncaught_sink(sink.clone());
//! registry.register_assertion_sink(sink, SeverityLevel::Error);
//!
//! // Panics that unwind out of `run` go to the uncaught pathway.
//! host.run(|| {
//!     // application body
//! });
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod errors;
pub mod fault;
pub mod logging_facility;
pub mod record;
pub mod render;
pub mod sink;

pub use faultline_core_types::schema;

// Re-export commonly used types
pub use capture::{FaultCaptureRegistry, Pathway};
pub use config::CaptureConfig;
pub use errors::{ExError, ExErrorKind, FaultlineError, Result};
pub use fault::Fault;
pub use faultline_core_types::{LogContext, SeverityLevel};
pub use record::{FaultRecord, RecordBuilder};
pub use sink::{CompositeSink, LogSink, SeverityRangeFilter};
