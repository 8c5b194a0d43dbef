#![allow(dead_code)]

use faultline_core::capture::{FaultCaptureRegistry, RecordingHost};
use faultline_core::errors::{FaultlineError, Result};
use faultline_core::fault::{Fault, FrameArg, StackFrame};
use faultline_core::{CaptureConfig, LogContext, LogSink, SeverityLevel};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Registry wired to a fresh recording host
pub fn recording_registry() -> (Arc<RecordingHost>, FaultCaptureRegistry) {
    recording_registry_with(CaptureConfig::default())
}

pub fn recording_registry_with(config: CaptureConfig) -> (Arc<RecordingHost>, FaultCaptureRegistry) {
    let host = Arc::new(RecordingHost::new());
    let registry = FaultCaptureRegistry::with_config(host.clone(), config);
    (host, registry)
}

/// Fault with `depth` causal predecessors, innermost first
pub fn chain(depth: usize) -> Fault {
    let mut fault = Fault::new("Root", "root cause").with_origin("src/root.rs", 1);
    for i in 0..depth {
        fault = Fault::new("Wrapped", format!("layer {}", i))
            .with_origin("src/layer.rs", i as u32 + 2)
            .with_previous(fault);
    }
    fault
}

/// Error whose `source()` chain is `depth` links long
#[derive(Debug)]
pub struct LinkedError {
    index: usize,
    next: Option<Box<LinkedError>>,
}

impl LinkedError {
    pub fn chain(depth: usize) -> LinkedError {
        let mut err = LinkedError {
            index: depth,
            next: None,
        };
        for index in (0..depth).rev() {
            err = LinkedError {
                index,
                next: Some(Box::new(err)),
            };
        }
        err
    }
}

impl fmt::Display for LinkedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link {}", self.index)
    }
}

impl Error for LinkedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.next.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

/// Fault whose structured trace cannot be serialized
pub fn fault_with_resource_arg(message: &str) -> Fault {
    Fault::new("Panic", message)
        .with_origin("src/net.rs", 40)
        .with_frame(
            StackFrame::at("src/net.rs", 40)
                .with_owning_type("app::net::Conn")
                .with_call_kind("::")
                .with_function("send")
                .with_args(vec![FrameArg::Resource("socket".to_string())]),
        )
}

/// Sink that rejects every entry
pub struct RejectingSink;

impl LogSink for RejectingSink {
    fn log(&self, _: SeverityLevel, _: &str, _: &LogContext) -> Result<()> {
        Err(FaultlineError::SinkFailed {
            sink: "rejecting".to_string(),
            reason: "closed".to_string(),
        })
    }
}
