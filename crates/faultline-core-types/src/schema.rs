//! Canonical schema constants for captured records and structured logs
//!
//! These constants keep context keys and event names consistent between the
//! capture pathways, the sinks and the tests that inspect them.

// Context keys attached to delivered log entries
pub const CTX_FILE: &str = "file";
pub const CTX_LINE: &str = "line";
pub const CTX_MESSAGE: &str = "message";
pub const CTX_TYPE: &str = "type";
pub const CTX_EXCEPTION: &str = "exception";

// Field keys for the facility's own tracing events
pub const FIELD_PATHWAY: &str = "pathway";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_SINKS: &str = "sinks";

// Canonical event names
pub const EVENT_INSTALL: &str = "install";
pub const EVENT_REGISTER: &str = "register";
pub const EVENT_CAPTURE: &str = "capture";
pub const EVENT_SINK_FAILED: &str = "sink_failed";

// Pathway names
pub const PATHWAY_ESCALATION: &str = "escalation";
pub const PATHWAY_ASSERTION: &str = "assertion";
pub const PATHWAY_FATAL: &str = "fatal";
pub const PATHWAY_UNCAUGHT: &str = "uncaught";
