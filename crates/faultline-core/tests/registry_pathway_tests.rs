#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{fault_with_resource_arg, recording_registry, recording_registry_with, RejectingSink};
use faultline_core::capture::{
    ConditionKind, ConditionMask, ConditionOutcome, Pathway, RuntimeCondition, UNCAUGHT_INTRO,
};
use faultline_core::fault::Fault;
use faultline_core::schema::{CTX_EXCEPTION, CTX_FILE, CTX_LINE, CTX_MESSAGE, CTX_TYPE};
use faultline_core::sink::MemorySink;
use faultline_core::{CaptureConfig, SeverityLevel};
use serde_json::json;
use std::sync::Arc;

// ---------- installation ----------

#[test]
fn test_each_pathway_installs_once() {
    let (host, registry) = recording_registry();
    for _ in 0..3 {
        registry.enable_escalation(ConditionMask::ALL);
        registry.register_assertion_sink(Arc::new(MemorySink::new()), SeverityLevel::Error);
        registry.register_fatal_sink(Arc::new(MemorySink::new()));
        registry.register_uncaught_sink(Arc::new(MemorySink::new()));
    }
    for pathway in Pathway::ALL {
        assert_eq!(host.install_count(pathway), 1, "{} reinstalled", pathway);
        assert!(registry.is_installed(pathway));
    }
    assert_eq!(registry.sink_count(Pathway::Uncaught), 3);
}

#[test]
fn test_every_registered_sink_receives_each_event() {
    let (host, registry) = recording_registry();
    let sinks: Vec<MemorySink> = (0..4).map(|_| MemorySink::new()).collect();
    for sink in &sinks {
        registry.register_assertion_sink(Arc::new(sink.clone()), SeverityLevel::Error);
    }

    host.trigger_assertion(&Fault::new("Panic", "assertion failed: a").with_origin("a.rs", 1));
    host.trigger_assertion(&Fault::new("Panic", "assertion failed: b").with_origin("b.rs", 2));

    for sink in &sinks {
        assert_eq!(sink.len(), 2);
    }
}

#[test]
fn test_pathways_are_independent() {
    let (host, registry) = recording_registry();
    let assertion = MemorySink::new();
    registry.register_assertion_sink(Arc::new(assertion.clone()), SeverityLevel::Error);

    assert!(!host.trigger_uncaught(&Fault::new("Panic", "nobody listens")));
    assert!(!registry.is_installed(Pathway::Uncaught));
    assert!(assertion.is_empty());
}

// ---------- escalation ----------

#[test]
fn test_escalation_raises_for_kinds_in_mask() {
    let (host, registry) = recording_registry();
    registry.enable_escalation(ConditionMask::ALL.without(ConditionKind::Deprecated));

    let warning = RuntimeCondition::new(ConditionKind::Warning, "division by zero", "calc.rs", 7);
    let fault = host.trigger_condition(&warning).unwrap().unwrap_err();
    assert_eq!(fault.kind, ConditionKind::Warning);
    assert_eq!(fault.message, "division by zero");
    assert_eq!((fault.file.as_str(), fault.line), ("calc.rs", 7));

    let deprecated = RuntimeCondition::new(ConditionKind::Deprecated, "old api", "calc.rs", 9);
    assert_eq!(
        host.trigger_condition(&deprecated),
        Some(Ok(ConditionOutcome::Proceed))
    );
}

#[test]
fn test_escalation_silent_while_reporting_suppressed() {
    let (host, registry) = recording_registry();
    registry.enable_escalation(ConditionMask::ALL);
    host.set_reporting(false);

    let notice = RuntimeCondition::new(ConditionKind::Notice, "undefined index", "a.rs", 3);
    assert_eq!(
        host.trigger_condition(&notice),
        Some(Ok(ConditionOutcome::Proceed))
    );
}

#[test]
fn test_escalated_fault_adapts_into_fault() {
    let (host, registry) = recording_registry();
    registry.enable_escalation(ConditionKind::UserWarning.into());

    let cond = RuntimeCondition::new(ConditionKind::UserWarning, "careful", "w.rs", 11);
    let escalated = host.trigger_condition(&cond).unwrap().unwrap_err();
    let fault = escalated.to_fault();
    assert_eq!(fault.message(), "careful");
    assert_eq!(fault.origin().file, "w.rs");
    assert_eq!(escalated.to_string(), "careful");
}

// ---------- assertion ----------

#[test]
fn test_assertion_logs_file_and_line_without_terminating() {
    let (host, registry) = recording_registry();
    let sink = MemorySink::new();
    registry.register_assertion_sink(Arc::new(sink.clone()), SeverityLevel::Error);

    let fault = Fault::new("Panic", "assertion failed: 1 == 2").with_origin("tests/check.rs", 42);
    assert!(host.trigger_assertion(&fault));

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.severity, SeverityLevel::Error);
    assert_eq!(entry.message, "assertion failed: 1 == 2");
    assert_eq!(entry.context[CTX_FILE], json!("tests/check.rs"));
    assert_eq!(entry.context[CTX_LINE], json!(42));
    assert_eq!(entry.context[CTX_MESSAGE], json!("assertion failed: 1 == 2"));
    assert!(host.terminations().is_empty());
}

#[test]
fn test_assertion_severity_fixed_by_first_registration() {
    let (host, registry) = recording_registry();
    let sink = MemorySink::new();
    registry.register_assertion_sink(Arc::new(sink.clone()), SeverityLevel::Warning);
    registry.register_assertion_sink(Arc::new(MemorySink::new()), SeverityLevel::Emergency);

    host.trigger_assertion(&Fault::new("Panic", "assertion failed: x"));
    assert_eq!(sink.entries()[0].severity, SeverityLevel::Warning);
}

// ---------- fatal ----------

#[test]
fn test_fatal_condition_logged_at_alert_on_exit() {
    let (host, registry) = recording_registry();
    let sink = MemorySink::new();
    registry.register_fatal_sink(Arc::new(sink.clone()));

    host.set_last_condition(Some(RuntimeCondition::new(
        ConditionKind::Error,
        "Call to undefined function nonExistingFunctionForFatalTest()",
        "src/bin/probe.rs",
        30,
    )));
    host.run_exit_hooks();

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, SeverityLevel::Alert);
    assert!(entries[0].message.contains("nonExistingFunctionForFatalTest"));
    assert_eq!(entries[0].context[CTX_TYPE], json!("error"));
    assert_eq!(entries[0].context[CTX_LINE], json!(30));
}

#[test]
fn test_fatal_ignores_non_fatal_or_absent_condition() {
    let (host, registry) = recording_registry();
    let sink = MemorySink::new();
    registry.register_fatal_sink(Arc::new(sink.clone()));

    host.run_exit_hooks();
    host.set_last_condition(Some(RuntimeCondition::new(
        ConditionKind::Warning,
        "just a warning",
        "a.rs",
        1,
    )));
    host.run_exit_hooks();

    assert!(sink.is_empty());
}

#[test]
fn test_fatal_below_configured_floor_is_dropped() {
    let config = CaptureConfig {
        fatal_severity: SeverityLevel::Warning,
        ..CaptureConfig::default()
    };
    let (host, registry) = recording_registry_with(config);
    let sink = MemorySink::new();
    registry.register_fatal_sink(Arc::new(sink.clone()));

    host.set_last_condition(Some(RuntimeCondition::new(
        ConditionKind::CoreError,
        "core failure",
        "a.rs",
        1,
    )));
    host.run_exit_hooks();
    assert!(sink.is_empty());
}

#[test]
fn test_fatal_sink_failure_is_swallowed() {
    let (host, registry) = recording_registry();
    registry.register_fatal_sink(Arc::new(RejectingSink));
    host.set_last_condition(Some(RuntimeCondition::new(
        ConditionKind::Parse,
        "unexpected token",
        "a.rs",
        1,
    )));
    host.run_exit_hooks();
}

// ---------- uncaught ----------

#[test]
fn test_uncaught_logs_dumps_and_terminates() {
    let (host, registry) = recording_registry();
    let sink = MemorySink::new();
    registry.register_uncaught_sink(Arc::new(sink.clone()));

    let fault = Fault::new("Panic", "boom")
        .with_origin("src/main.rs", 12)
        .with_previous(Fault::new("Io", "disk full"));
    assert!(host.trigger_uncaught(&fault));

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.severity, SeverityLevel::Critical);
    assert_eq!(entry.message, "boom");
    assert_eq!(entry.context[CTX_TYPE], json!("Panic"));
    let exception = &entry.context[CTX_EXCEPTION];
    assert_eq!(exception["message"], json!("boom"));
    assert_eq!(exception["file"], json!("src/main.rs"));
    assert_eq!(exception["previous"]["message"], json!("disk full"));
    assert!(exception["trace"].is_array());

    let dump = host.diagnostics();
    assert!(dump.starts_with(&format!("{}[Panic] boom\n", UNCAUGHT_INTRO)));
    assert!(dump.contains("Previous: [Io] disk full"));
    assert_eq!(host.terminations(), vec![1]);
}

#[test]
fn test_uncaught_falls_back_to_stripped_record() {
    let (host, registry) = recording_registry();
    let sink = MemorySink::new();
    registry.register_uncaught_sink(Arc::new(sink.clone()));

    let fault = fault_with_resource_arg("socket closed").with_previous(Fault::new("Io", "reset"));
    host.trigger_uncaught(&fault);

    let exception = &sink.entries()[0].context[CTX_EXCEPTION];
    assert_eq!(exception["message"], json!("socket closed"));
    assert!(exception["trace"].is_string());
    assert!(exception["previous"].is_null());
    assert_eq!(host.terminations(), vec![1]);
}

#[test]
fn test_uncaught_sink_failure_still_dumps_and_terminates() {
    let (host, registry) = recording_registry();
    let after = MemorySink::new();
    registry.register_uncaught_sink(Arc::new(RejectingSink));
    registry.register_uncaught_sink(Arc::new(after.clone()));

    host.trigger_uncaught(&Fault::new("Panic", "boom"));

    assert!(after.is_empty());
    assert!(host.diagnostics().contains("[Panic] boom"));
    assert_eq!(host.terminations(), vec![1]);
}

#[test]
fn test_uncaught_uses_configured_exit_status_and_severity() {
    let config = CaptureConfig {
        uncaught_severity: SeverityLevel::Emergency,
        exit_status: 70,
        ..CaptureConfig::default()
    };
    let (host, registry) = recording_registry_with(config);
    let sink = MemorySink::new();
    registry.register_uncaught_sink(Arc::new(sink.clone()));

    host.trigger_uncaught(&Fault::new("Panic", "boom"));
    assert_eq!(sink.entries()[0].severity, SeverityLevel::Emergency);
    assert_eq!(host.terminations(), vec![70]);
}

// ---------- reset ----------

#[test]
fn test_reset_isolates_registrations() {
    let (host, registry) = recording_registry();
    let first = MemorySink::new();
    registry.register_uncaught_sink(Arc::new(first.clone()));
    registry.enable_escalation(ConditionMask::ALL);
    registry.reset();

    for pathway in Pathway::ALL {
        assert!(!registry.is_installed(pathway));
        assert_eq!(registry.sink_count(pathway), 0);
    }

    host.trigger_uncaught(&Fault::new("Panic", "after reset"));
    assert!(first.is_empty());
    assert!(host.terminations().is_empty());
    assert!(host.diagnostics().is_empty());

    let notice = RuntimeCondition::new(ConditionKind::Notice, "n", "a.rs", 1);
    assert_eq!(
        host.trigger_condition(&notice),
        Some(Ok(ConditionOutcome::Proceed))
    );
}

#[test]
fn test_reset_silences_stale_assertion_and_fatal_callbacks() {
    let (host, registry) = recording_registry();
    let sink = MemorySink::new();
    registry.register_assertion_sink(Arc::new(sink.clone()), SeverityLevel::Error);
    registry.register_fatal_sink(Arc::new(sink.clone()));
    registry.reset();

    host.trigger_assertion(&Fault::new("Panic", "assertion failed: x"));
    host.set_last_condition(Some(RuntimeCondition::new(
        ConditionKind::Error,
        "fatal",
        "a.rs",
        1,
    )));
    host.run_exit_hooks();

    assert!(sink.is_empty());
}
