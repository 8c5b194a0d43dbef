//! Host runtime driven by hand
//!
//! `RecordingHost` keeps whatever the registry installs and lets a test fire
//! each pathway directly. Diagnostic output is collected in memory and
//! `terminate` only records the requested status, so "log, then die" can be
//! observed without leaving the test process.

use super::host::{
    AssertionHandler, ConditionHandler, ConditionOutcome, EscalatedFault, ExitHook, HostRuntime,
    RuntimeCondition, UncaughtHandler,
};
use super::Pathway;
use crate::fault::Fault;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// In-memory [`HostRuntime`] for tests and embedding
pub struct RecordingHost {
    condition_handler: RwLock<Option<ConditionHandler>>,
    assertion_handler: RwLock<Option<AssertionHandler>>,
    uncaught_handler: RwLock<Option<UncaughtHandler>>,
    exit_hooks: Mutex<Vec<ExitHook>>,
    installs: Mutex<HashMap<Pathway, usize>>,
    last_condition: Mutex<Option<RuntimeCondition>>,
    reporting: AtomicBool,
    diagnostics: Arc<Mutex<Vec<u8>>>,
    terminations: Mutex<Vec<i32>>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            condition_handler: RwLock::new(None),
            assertion_handler: RwLock::new(None),
            uncaught_handler: RwLock::new(None),
            exit_hooks: Mutex::new(Vec::new()),
            installs: Mutex::new(HashMap::new()),
            last_condition: Mutex::new(None),
            reporting: AtomicBool::new(true),
            diagnostics: Arc::new(Mutex::new(Vec::new())),
            terminations: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times a callback was installed for `pathway`
    pub fn install_count(&self, pathway: Pathway) -> usize {
        lock(&self.installs).get(&pathway).copied().unwrap_or(0)
    }

    /// Fire the condition handler; `None` when nothing is installed
    pub fn trigger_condition(
        &self,
        condition: &RuntimeCondition,
    ) -> Option<Result<ConditionOutcome, EscalatedFault>> {
        let handler = read(&self.condition_handler)?;
        Some(handler(condition))
    }

    /// Fire the assertion handler; false when nothing is installed
    pub fn trigger_assertion(&self, fault: &Fault) -> bool {
        match read(&self.assertion_handler) {
            Some(handler) => {
                handler(fault);
                true
            }
            None => false,
        }
    }

    /// Fire the uncaught handler; false when nothing is installed
    pub fn trigger_uncaught(&self, fault: &Fault) -> bool {
        match read(&self.uncaught_handler) {
            Some(handler) => {
                handler(fault);
                true
            }
            None => false,
        }
    }

    /// Run every installed exit hook in installation order
    ///
    /// Unlike a real process exit, hooks stay installed and can run again.
    pub fn run_exit_hooks(&self) {
        let hooks = lock(&self.exit_hooks).clone();
        for hook in hooks {
            hook();
        }
    }

    pub fn set_reporting(&self, active: bool) {
        self.reporting.store(active, Ordering::SeqCst);
    }

    pub fn set_last_condition(&self, condition: Option<RuntimeCondition>) {
        *lock(&self.last_condition) = condition;
    }

    /// Everything written to the diagnostic stream so far
    pub fn diagnostics(&self) -> String {
        String::from_utf8_lossy(&lock(&self.diagnostics)).into_owned()
    }

    /// Statuses passed to `terminate`, in call order
    pub fn terminations(&self) -> Vec<i32> {
        lock(&self.terminations).clone()
    }

    fn count_install(&self, pathway: Pathway) {
        *lock(&self.installs).entry(pathway).or_insert(0) += 1;
    }
}

impl HostRuntime for RecordingHost {
    fn install_condition_handler(&self, handler: ConditionHandler) {
        *self
            .condition_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
        self.count_install(Pathway::Escalation);
    }

    fn install_assertion_handler(&self, handler: AssertionHandler) {
        *self
            .assertion_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
        self.count_install(Pathway::Assertion);
    }

    fn install_exit_hook(&self, hook: ExitHook) {
        lock(&self.exit_hooks).push(hook);
        self.count_install(Pathway::Fatal);
    }

    fn install_uncaught_handler(&self, handler: UncaughtHandler) {
        *self
            .uncaught_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
        self.count_install(Pathway::Uncaught);
    }

    fn reporting_active(&self) -> bool {
        self.reporting.load(Ordering::SeqCst)
    }

    fn last_condition(&self) -> Option<RuntimeCondition> {
        lock(&self.last_condition).clone()
    }

    fn diagnostic_stream(&self) -> Box<dyn Write + Send> {
        Box::new(SharedBuffer(Arc::clone(&self.diagnostics)))
    }

    fn terminate(&self, status: i32) {
        lock(&self.terminations).push(status);
    }
}

struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T: Clone>(slot: &RwLock<Option<T>>) -> Option<T> {
    slot.read().unwrap_or_else(PoisonError::into_inner).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::host::ConditionKind;

    #[test]
    fn test_triggers_without_handlers() {
        let host = RecordingHost::new();
        let cond = RuntimeCondition::new(ConditionKind::Warning, "w", "a.rs", 1);
        assert!(host.trigger_condition(&cond).is_none());
        assert!(!host.trigger_assertion(&Fault::new("Panic", "x")));
        assert!(!host.trigger_uncaught(&Fault::new("Panic", "x")));
    }

    #[test]
    fn test_diagnostic_stream_is_captured() {
        let host = RecordingHost::new();
        let mut stream = host.diagnostic_stream();
        stream.write_all(b"dump").unwrap();
        drop(stream);
        assert_eq!(host.diagnostics(), "dump");
    }

    #[test]
    fn test_terminate_is_recorded() {
        let host = RecordingHost::new();
        host.terminate(3);
        assert_eq!(host.terminations(), vec![3]);
    }

    #[test]
    fn test_install_counts() {
        let host = RecordingHost::new();
        host.install_exit_hook(Arc::new(|| {}));
        host.install_exit_hook(Arc::new(|| {}));
        assert_eq!(host.install_count(Pathway::Fatal), 2);
        assert_eq!(host.install_count(Pathway::Uncaught), 0);
    }
}
