//! Structured logging facility for faultline
//!
//! - Single initialization point via `init(profile)`
//! - `log_capture!` / `log_capture_failure!` for pathway events
//! - Test capture mode for deterministic assertions
//!
//! These events describe the capture machinery itself (installs, captures,
//! swallowed sink failures). Captured faults travel through registered
//! [`crate::sink::LogSink`]s, not through this facility.
//!
//! # Usage
//!
//! ```rust
//! use faultline_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
