//! Host runtime for a real Rust process
//!
//! - Uncaught faults are panics that unwind out of [`ProcessHost::run`] and
//!   errors handed to [`ProcessHost::report_uncaught`], typically from `main`.
//! - Assertion failures are panics raised by the std assertion macros.
//! - Runtime conditions are reported explicitly with
//!   [`ProcessHost::report_condition`]; fatal kinds end the process.
//! - Exit hooks run once, from [`ProcessHost::exit`] or when an [`ExitGuard`]
//!   is dropped at the end of `main`.
//!
//! The panic hook is process-global, so there is exactly one host per
//! process: [`ProcessHost::global`].
//!
//! The hook runs before unwinding starts, when nobody knows yet whether the
//! panic will be caught. It only records the fault and its backtrace for the
//! panicking thread. The uncaught handler runs once the panic has unwound out
//! of `run`; a panic caught with `catch_unwind`, or one a `JoinHandle`
//! reports, never reaches it.

use super::host::{
    AssertionHandler, ConditionHandler, ConditionOutcome, EscalatedFault, ExitHook, HostRuntime,
    RuntimeCondition, UncaughtHandler,
};
use crate::fault::adapt::{panic_message, PANIC_KIND};
use crate::fault::Fault;
use crate::record::DEFAULT_MAX_CHAIN_DEPTH;
use crate::render::write_fault;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once, OnceLock, PoisonError, RwLock};

/// Exit status after a fatal runtime condition
pub const FATAL_EXIT_STATUS: i32 = 255;

/// Exit status used when an uncaught error is reported without a handler
pub const UNCAUGHT_EXIT_STATUS: i32 = 1;

/// Intro of the dump written when no uncaught handler is installed
const DEFAULT_UNCAUGHT_INTRO: &str = "Uncaught: ";

static GLOBAL_HOST: OnceLock<Arc<ProcessHost>> = OnceLock::new();

thread_local! {
    /// Nesting depth of `ProcessHost::run` on this thread
    static RUN_DEPTH: Cell<usize> = const { Cell::new(0) };
    /// Fault of the latest panic on this thread inside `run`
    static PENDING_PANIC: RefCell<Option<Fault>> = const { RefCell::new(None) };
}

/// The host runtime of the current process
pub struct ProcessHost {
    condition_handler: RwLock<Option<ConditionHandler>>,
    assertion_handler: RwLock<Option<AssertionHandler>>,
    uncaught_handler: RwLock<Option<UncaughtHandler>>,
    exit_hooks: Mutex<Vec<ExitHook>>,
    last_condition: Mutex<Option<RuntimeCondition>>,
    reporting: AtomicBool,
    panic_hook: Once,
}

impl ProcessHost {
    fn new() -> Self {
        Self {
            condition_handler: RwLock::new(None),
            assertion_handler: RwLock::new(None),
            uncaught_handler: RwLock::new(None),
            exit_hooks: Mutex::new(Vec::new()),
            last_condition: Mutex::new(None),
            reporting: AtomicBool::new(true),
            panic_hook: Once::new(),
        }
    }

    /// The process-wide host
    pub fn global() -> Arc<ProcessHost> {
        GLOBAL_HOST.get_or_init(|| Arc::new(ProcessHost::new())).clone()
    }

    /// Guard that runs the exit hooks when dropped
    pub fn exit_guard(self: &Arc<Self>) -> ExitGuard {
        ExitGuard {
            host: Arc::clone(self),
        }
    }

    /// Suppress (`false`) or restore (`true`) condition reporting
    pub fn set_reporting(&self, active: bool) {
        self.reporting.store(active, Ordering::SeqCst);
    }

    /// Surface a runtime condition
    ///
    /// A non-fatal condition goes to the installed condition handler first,
    /// which may escalate it into an [`EscalatedFault`] or mark it handled.
    /// Otherwise the condition is recorded as the last condition. Fatal kinds
    /// never reach the handler: they are recorded and the process exits with
    /// [`FATAL_EXIT_STATUS`].
    ///
    /// # Errors
    ///
    /// Returns the fault raised by the escalation handler.
    pub fn report_condition(
        &self,
        condition: RuntimeCondition,
    ) -> Result<ConditionOutcome, EscalatedFault> {
        let fatal = condition.kind.is_fatal();
        if !fatal {
            if let Some(handler) = read_slot(&self.condition_handler) {
                if handler(&condition)? == ConditionOutcome::Handled {
                    return Ok(ConditionOutcome::Handled);
                }
            }
        }

        if self.reporting_active() {
            tracing::warn!(
                kind = condition.kind.as_str(),
                file = %condition.file,
                line = condition.line,
                "{}",
                condition.message
            );
        }
        *self
            .last_condition
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(condition);
        if fatal {
            self.exit(FATAL_EXIT_STATUS);
        }
        Ok(ConditionOutcome::Proceed)
    }

    /// Run `body`, handing a panic that unwinds out of it to the uncaught
    /// handler
    ///
    /// The handler normally terminates the process. When none is installed,
    /// or it returns, the panic resumes unwinding. Nested calls leave the
    /// panic to the outermost one.
    pub fn run<R>(&self, body: impl FnOnce() -> R) -> R {
        RUN_DEPTH.with(|depth| depth.set(depth.get() + 1));
        let outcome = panic::catch_unwind(AssertUnwindSafe(body));
        let outer = RUN_DEPTH.with(|depth| {
            depth.set(depth.get() - 1);
            depth.get() == 0
        });

        match outcome {
            Ok(value) => value,
            Err(payload) => {
                if outer {
                    let pending = PENDING_PANIC.with(|slot| slot.borrow_mut().take());
                    if let Some(handler) = read_slot(&self.uncaught_handler) {
                        let fault = pending.unwrap_or_else(|| {
                            Fault::new(PANIC_KIND, panic_message(payload.as_ref()))
                        });
                        handler(&fault);
                    }
                }
                panic::resume_unwind(payload)
            }
        }
    }

    /// Hand an error that escaped `main` to the uncaught handler, then exit
    #[track_caller]
    pub fn report_uncaught<E: Error + ?Sized + 'static>(&self, err: &E) -> ! {
        let fault = Fault::from_error(err);
        match read_slot(&self.uncaught_handler) {
            Some(handler) => handler(&fault),
            None => {
                let _ = write_fault(
                    &fault,
                    DEFAULT_UNCAUGHT_INTRO,
                    DEFAULT_MAX_CHAIN_DEPTH,
                    &mut std::io::stderr(),
                );
            }
        }
        self.exit(UNCAUGHT_EXIT_STATUS)
    }

    /// Run the exit hooks (once per process) in registration order
    pub fn run_exit_hooks(&self) {
        let hooks = std::mem::take(
            &mut *self
                .exit_hooks
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for hook in hooks {
            hook();
        }
    }

    /// Run the exit hooks, then end the process
    pub fn exit(&self, status: i32) -> ! {
        self.run_exit_hooks();
        std::process::exit(status)
    }

    fn ensure_panic_hook(&self) {
        self.panic_hook.call_once(|| {
            let previous = panic::take_hook();
            panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
                if !ProcessHost::global().observe_panic(info) {
                    previous(info);
                }
            }));
        });
    }

    /// Deliver an assertion failure, or record the panic for `run`
    ///
    /// Returns true when the assertion handler took the panic.
    fn observe_panic(&self, info: &PanicHookInfo<'_>) -> bool {
        if is_assertion_failure(&panic_message(info.payload())) {
            if let Some(handler) = read_slot(&self.assertion_handler) {
                handler(&Fault::from_panic(info, &Backtrace::capture()));
                return true;
            }
        }

        let inside_run = RUN_DEPTH.try_with(Cell::get).unwrap_or(0) > 0;
        if inside_run && read_slot(&self.uncaught_handler).is_some() {
            let fault = Fault::from_panic(info, &Backtrace::force_capture());
            let _ = PENDING_PANIC.try_with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    *slot = Some(fault);
                }
            });
        }
        false
    }
}

impl HostRuntime for ProcessHost {
    fn install_condition_handler(&self, handler: ConditionHandler) {
        write_slot(&self.condition_handler, handler);
    }

    fn install_assertion_handler(&self, handler: AssertionHandler) {
        write_slot(&self.assertion_handler, handler);
        self.ensure_panic_hook();
    }

    fn install_exit_hook(&self, hook: ExitHook) {
        self.exit_hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }

    fn install_uncaught_handler(&self, handler: UncaughtHandler) {
        write_slot(&self.uncaught_handler, handler);
        self.ensure_panic_hook();
    }

    fn reporting_active(&self) -> bool {
        self.reporting.load(Ordering::SeqCst)
    }

    fn last_condition(&self) -> Option<RuntimeCondition> {
        self.last_condition
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn diagnostic_stream(&self) -> Box<dyn Write + Send> {
        Box::new(std::io::stderr())
    }

    fn terminate(&self, status: i32) {
        self.exit(status)
    }
}

/// Runs the host's exit hooks when dropped
#[must_use = "exit hooks run when the guard is dropped"]
pub struct ExitGuard {
    host: Arc<ProcessHost>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.host.run_exit_hooks();
    }
}

/// True for messages produced by `assert!`, `assert_eq!` and `assert_ne!`
/// without a custom message
pub fn is_assertion_failure(message: &str) -> bool {
    message.starts_with("assertion failed") || message.starts_with("assertion `")
}

fn read_slot<T: Clone>(slot: &RwLock<Option<T>>) -> Option<T> {
    slot.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn write_slot<T>(slot: &RwLock<Option<T>>, value: T) {
    *slot.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
}
