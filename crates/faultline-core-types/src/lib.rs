//! Core types shared across the faultline crates
//!
//! - **Severity**: the ordered [`SeverityLevel`] used for tags and filter floors
//! - **Context**: the [`LogContext`] map handed to every sink
//! - **Schema constants**: canonical context keys, event and pathway names

pub mod context;
pub mod schema;
pub mod severity;

pub use context::LogContext;
pub use severity::{ParseSeverityError, SeverityLevel};
