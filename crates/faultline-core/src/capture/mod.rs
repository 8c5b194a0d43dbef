//! Fault capture pathways and the host runtime they are installed into

pub mod host;
pub mod process_host;
pub mod recording_host;
pub mod registry;

pub use host::{
    AssertionHandler, ConditionHandler, ConditionKind, ConditionMask, ConditionOutcome,
    EscalatedFault, ExitHook, HostRuntime, RuntimeCondition, UncaughtHandler,
};
pub use process_host::{ExitGuard, ProcessHost, FATAL_EXIT_STATUS, UNCAUGHT_EXIT_STATUS};
pub use recording_host::RecordingHost;
pub use registry::{FaultCaptureRegistry, Pathway, UNCAUGHT_INTRO};
