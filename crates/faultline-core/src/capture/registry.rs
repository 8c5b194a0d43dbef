//! The four capture pathways
//!
//! Each pathway starts uninitialized. Its first registration creates the
//! pathway's [`CompositeSink`] and installs one callback with the host; later
//! registrations only append sinks. [`FaultCaptureRegistry::reset`] returns
//! every pathway to uninitialized.
//!
//! Installed callbacks hold a weak reference to the host and a strong one to
//! their pathway's sinks and active flag. A reset retires those, so a callback
//! the host still holds from before the reset returns without logging,
//! dumping or terminating.

use super::host::{
    ConditionMask, ConditionOutcome, EscalatedFault, HostRuntime, RuntimeCondition,
};
use crate::config::CaptureConfig;
use crate::fault::Fault;
use crate::record::RecordBuilder;
use crate::render::write_fault;
use crate::sink::{CompositeSink, LogSink, SeverityRangeFilter, SharedSink};
use crate::{log_capture, log_capture_failure};
use faultline_core_types::schema::{
    CTX_EXCEPTION, CTX_FILE, CTX_LINE, CTX_MESSAGE, CTX_TYPE, EVENT_CAPTURE, EVENT_INSTALL,
    EVENT_REGISTER, PATHWAY_ASSERTION, PATHWAY_ESCALATION, PATHWAY_FATAL, PATHWAY_UNCAUGHT,
};
use faultline_core_types::{LogContext, SeverityLevel};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Intro of the diagnostic dump written before the uncaught pathway terminates
pub const UNCAUGHT_INTRO: &str = "Fatal error: Uncaught: ";

/// One of the four capture mechanisms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pathway {
    Escalation,
    Assertion,
    Fatal,
    Uncaught,
}

impl Pathway {
    pub const ALL: [Pathway; 4] = [
        Pathway::Escalation,
        Pathway::Assertion,
        Pathway::Fatal,
        Pathway::Uncaught,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pathway::Escalation => PATHWAY_ESCALATION,
            Pathway::Assertion => PATHWAY_ASSERTION,
            Pathway::Fatal => PATHWAY_FATAL,
            Pathway::Uncaught => PATHWAY_UNCAUGHT,
        }
    }
}

impl fmt::Display for Pathway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the pathway state of one host runtime
pub struct FaultCaptureRegistry {
    host: Arc<dyn HostRuntime>,
    config: CaptureConfig,
    escalation: Mutex<Option<Arc<AtomicU32>>>,
    assertion: PathwaySlot,
    fatal: PathwaySlot,
    uncaught: PathwaySlot,
}

type PathwaySlot = Mutex<Option<Arc<InstalledPathway>>>;

/// Sinks of an installed pathway and whether its host callback still delivers
#[derive(Debug)]
struct InstalledPathway {
    sinks: CompositeSink,
    active: AtomicBool,
}

impl InstalledPathway {
    fn new() -> Self {
        Self {
            sinks: CompositeSink::new(),
            active: AtomicBool::new(true),
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn retire(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.sinks.clear();
    }
}

impl FaultCaptureRegistry {
    pub fn new(host: Arc<dyn HostRuntime>) -> Self {
        Self::with_config(host, CaptureConfig::default())
    }

    pub fn with_config(host: Arc<dyn HostRuntime>, config: CaptureConfig) -> Self {
        Self {
            host,
            config,
            escalation: Mutex::new(None),
            assertion: Mutex::new(None),
            fatal: Mutex::new(None),
            uncaught: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Turn non-fatal conditions whose kind is in `mask` into [`EscalatedFault`]s
    ///
    /// The condition handler is installed on the first call; later calls
    /// replace the mask. Nothing is escalated while host reporting is
    /// suppressed.
    pub fn enable_escalation(&self, mask: ConditionMask) {
        let mut slot = lock(&self.escalation);
        if let Some(current) = slot.as_ref() {
            current.store(mask.bits(), Ordering::SeqCst);
            return;
        }

        let shared_mask = Arc::new(AtomicU32::new(mask.bits()));
        let handler_mask = Arc::clone(&shared_mask);
        let host = Arc::downgrade(&self.host);
        self.host.install_condition_handler(Arc::new(move |condition: &RuntimeCondition| {
            escalate(&host, &handler_mask, condition)
        }));
        *slot = Some(shared_mask);
        log_capture!(PATHWAY_ESCALATION, EVENT_INSTALL, mask = mask.bits());
    }

    /// Log assertion failures to `sink` at `severity`
    ///
    /// The severity of the call that installs the pathway is used for every
    /// later assertion failure.
    pub fn register_assertion_sink(&self, sink: SharedSink, severity: SeverityLevel) {
        self.register(Pathway::Assertion, &self.assertion, sink, |pathway| {
            self.host.install_assertion_handler(Arc::new(move |fault: &Fault| {
                if pathway.is_active() {
                    capture_assertion(&pathway.sinks, severity, fault)
                }
            }));
        });
    }

    /// Log the last fatal runtime condition to `sink` when the process exits
    pub fn register_fatal_sink(&self, sink: SharedSink) {
        let severity = self.config.fatal_severity;
        let floor = self.config.fatal_floor;
        self.register(Pathway::Fatal, &self.fatal, sink, |pathway| {
            let host = Arc::downgrade(&self.host);
            self.host.install_exit_hook(Arc::new(move || {
                if pathway.is_active() {
                    capture_fatal(&host, &pathway.sinks, severity, floor)
                }
            }));
        });
    }

    /// Log faults that escaped every other handler, dump them, then terminate
    pub fn register_uncaught_sink(&self, sink: SharedSink) {
        let settings = UncaughtSettings {
            builder: RecordBuilder::new(self.config.max_chain_depth),
            severity: self.config.uncaught_severity,
            floor: self.config.uncaught_floor,
            exit_status: self.config.exit_status,
        };
        self.register(Pathway::Uncaught, &self.uncaught, sink, |pathway| {
            let host = Arc::downgrade(&self.host);
            self.host.install_uncaught_handler(Arc::new(move |fault: &Fault| {
                if pathway.is_active() {
                    capture_uncaught(&host, &pathway.sinks, &settings, fault)
                }
            }));
        });
    }

    /// True once the pathway's host callback is installed
    pub fn is_installed(&self, pathway: Pathway) -> bool {
        match self.sinks_slot(pathway) {
            Some(slot) => lock(slot).is_some(),
            None => lock(&self.escalation).is_some(),
        }
    }

    /// Sinks registered on the pathway; always 0 for escalation
    pub fn sink_count(&self, pathway: Pathway) -> usize {
        self.sinks_slot(pathway).map_or(0, |slot| {
            lock(slot)
                .as_ref()
                .map_or(0, |pathway| pathway.sinks.len())
        })
    }

    /// Return every pathway to uninitialized
    ///
    /// Previously installed callbacks stay with the host but become inert:
    /// escalation matches no kind, and the other pathways neither log, dump
    /// nor terminate.
    pub fn reset(&self) {
        if let Some(mask) = lock(&self.escalation).take() {
            mask.store(ConditionMask::NONE.bits(), Ordering::SeqCst);
        }
        for slot in [&self.assertion, &self.fatal, &self.uncaught] {
            if let Some(pathway) = lock(slot).take() {
                pathway.retire();
            }
        }
    }

    /// Slot of a sink-backed pathway
    fn sinks_slot(&self, pathway: Pathway) -> Option<&PathwaySlot> {
        match pathway {
            Pathway::Escalation => None,
            Pathway::Assertion => Some(&self.assertion),
            Pathway::Fatal => Some(&self.fatal),
            Pathway::Uncaught => Some(&self.uncaught),
        }
    }

    fn register(
        &self,
        pathway: Pathway,
        slot: &PathwaySlot,
        sink: SharedSink,
        install: impl FnOnce(Arc<InstalledPathway>),
    ) {
        let mut slot = lock(slot);
        let installed = match slot.as_ref() {
            Some(installed) => Arc::clone(installed),
            None => {
                let installed = Arc::new(InstalledPathway::new());
                install(Arc::clone(&installed));
                *slot = Some(Arc::clone(&installed));
                log_capture!(pathway.as_str(), EVENT_INSTALL);
                installed
            }
        };
        installed.sinks.add(sink);
        log_capture!(pathway.as_str(), EVENT_REGISTER, sinks = installed.sinks.len());
    }
}

impl fmt::Debug for FaultCaptureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("FaultCaptureRegistry");
        for pathway in Pathway::ALL {
            s.field(pathway.as_str(), &self.is_installed(pathway));
        }
        s.finish()
    }
}

#[derive(Debug, Clone, Copy)]
struct UncaughtSettings {
    builder: RecordBuilder,
    severity: SeverityLevel,
    floor: SeverityLevel,
    exit_status: i32,
}

fn escalate(
    host: &Weak<dyn HostRuntime>,
    mask: &AtomicU32,
    condition: &RuntimeCondition,
) -> Result<ConditionOutcome, EscalatedFault> {
    let reporting = host.upgrade().is_some_and(|host| host.reporting_active());
    if !reporting || !ConditionMask::from_bits(mask.load(Ordering::SeqCst)).contains(condition.kind)
    {
        return Ok(ConditionOutcome::Proceed);
    }
    log_capture!(PATHWAY_ESCALATION, EVENT_CAPTURE, kind = condition.kind.as_str());
    Err(EscalatedFault::from_condition(condition))
}

fn capture_assertion(composite: &CompositeSink, severity: SeverityLevel, fault: &Fault) {
    let mut context = LogContext::new();
    context.insert(CTX_MESSAGE.to_string(), json!(fault.message()));
    context.insert(CTX_FILE.to_string(), json!(fault.origin().file));
    context.insert(CTX_LINE.to_string(), json!(fault.origin().line));

    log_capture!(PATHWAY_ASSERTION, EVENT_CAPTURE, severity = severity.as_str());
    if let Err(err) = composite.log(severity, fault.message(), &context) {
        log_capture_failure!(PATHWAY_ASSERTION, err);
    }
}

fn capture_fatal(
    host: &Weak<dyn HostRuntime>,
    composite: &CompositeSink,
    severity: SeverityLevel,
    floor: SeverityLevel,
) {
    let condition = match host.upgrade().and_then(|host| host.last_condition()) {
        Some(condition) if condition.kind.is_fatal() => condition,
        _ => return,
    };

    log_capture!(PATHWAY_FATAL, EVENT_CAPTURE, kind = condition.kind.as_str());
    let filter = SeverityRangeFilter::new(composite, floor);
    if let Err(err) = filter.log(severity, &condition.message, &condition.to_context()) {
        log_capture_failure!(PATHWAY_FATAL, err);
    }
}

fn capture_uncaught(
    host: &Weak<dyn HostRuntime>,
    composite: &CompositeSink,
    settings: &UncaughtSettings,
    fault: &Fault,
) {
    let host = match host.upgrade() {
        Some(host) => host,
        None => return,
    };

    let mut context = LogContext::new();
    context.insert(CTX_EXCEPTION.to_string(), exception_value(&settings.builder, fault));
    context.insert(CTX_TYPE.to_string(), json!(fault.kind()));

    log_capture!(PATHWAY_UNCAUGHT, EVENT_CAPTURE, kind = fault.kind());
    let filter = SeverityRangeFilter::new(composite, settings.floor);
    if let Err(err) = filter.log(settings.severity, fault.message(), &context) {
        log_capture_failure!(PATHWAY_UNCAUGHT, err);
    }

    let mut stream = host.diagnostic_stream();
    let max_depth = settings.builder.max_depth();
    if let Err(err) = write_fault(fault, UNCAUGHT_INTRO, max_depth, &mut stream) {
        tracing::error!(pathway = PATHWAY_UNCAUGHT, "diagnostic dump failed: {}", err);
    }
    let _ = stream.flush();
    drop(stream);

    host.terminate(settings.exit_status);
}

/// Structured record of `fault`, or its stripped form when that cannot be built
fn exception_value(builder: &RecordBuilder, fault: &Fault) -> Value {
    let record = match builder.build(Some(fault), true, true) {
        Ok(Some(record)) => record,
        Ok(None) => builder.build_stripped(fault),
        Err(err) => {
            tracing::warn!(
                pathway = PATHWAY_UNCAUGHT,
                "structured record failed, using stripped form: {}",
                err
            );
            builder.build_stripped(fault)
        }
    };
    record
        .to_value()
        .or_else(|_| builder.build_stripped(fault).to_value())
        .unwrap_or_else(|_| stripped_fallback(fault))
}

fn stripped_fallback(fault: &Fault) -> Value {
    json!({
        "message": fault.message(),
        "file": fault.origin().file,
        "line": fault.origin().line,
    })
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
