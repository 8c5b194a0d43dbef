//! Boundary between the capture registry and the host runtime
//!
//! The registry never reaches into process machinery itself. It asks a
//! [`HostRuntime`] to install one callback per pathway and to answer a few
//! queries; [`super::ProcessHost`] is the implementation for a real Rust
//! process and [`super::RecordingHost`] drives pathways by hand in tests.

use crate::errors::FaultlineError;
use crate::fault::Fault;
use faultline_core_types::schema::{CTX_FILE, CTX_LINE, CTX_MESSAGE, CTX_TYPE};
use faultline_core_types::LogContext;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::io::Write;
use std::ops::BitOr;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Category of a non-fatal or fatal runtime condition reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Error,
    Warning,
    Parse,
    Notice,
    CoreError,
    CoreWarning,
    CompileError,
    CompileWarning,
    UserError,
    UserWarning,
    UserNotice,
    Strict,
    RecoverableError,
    Deprecated,
    UserDeprecated,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 15] = [
        ConditionKind::Error,
        ConditionKind::Warning,
        ConditionKind::Parse,
        ConditionKind::Notice,
        ConditionKind::CoreError,
        ConditionKind::CoreWarning,
        ConditionKind::CompileError,
        ConditionKind::CompileWarning,
        ConditionKind::UserError,
        ConditionKind::UserWarning,
        ConditionKind::UserNotice,
        ConditionKind::Strict,
        ConditionKind::RecoverableError,
        ConditionKind::Deprecated,
        ConditionKind::UserDeprecated,
    ];

    /// Single-bit value of this kind inside a [`ConditionMask`]
    pub fn bit(&self) -> u32 {
        1 << (*self as u32)
    }

    /// Kinds that end the process
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConditionKind::Error
                | ConditionKind::Parse
                | ConditionKind::CoreError
                | ConditionKind::CompileError
                | ConditionKind::UserError
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::Error => "error",
            ConditionKind::Warning => "warning",
            ConditionKind::Parse => "parse",
            ConditionKind::Notice => "notice",
            ConditionKind::CoreError => "core_error",
            ConditionKind::CoreWarning => "core_warning",
            ConditionKind::CompileError => "compile_error",
            ConditionKind::CompileWarning => "compile_warning",
            ConditionKind::UserError => "user_error",
            ConditionKind::UserWarning => "user_warning",
            ConditionKind::UserNotice => "user_notice",
            ConditionKind::Strict => "strict",
            ConditionKind::RecoverableError => "recoverable_error",
            ConditionKind::Deprecated => "deprecated",
            ConditionKind::UserDeprecated => "user_deprecated",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionKind {
    type Err = FaultlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FaultlineError::UnknownConditionKind {
                value: s.to_string(),
            })
    }
}

/// Set of condition kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConditionMask(u32);

impl ConditionMask {
    pub const NONE: ConditionMask = ConditionMask(0);
    pub const ALL: ConditionMask = ConditionMask((1 << 15) - 1);

    pub fn from_bits(bits: u32) -> Self {
        ConditionMask(bits & Self::ALL.0)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, kind: ConditionKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn with(self, kind: ConditionKind) -> Self {
        ConditionMask(self.0 | kind.bit())
    }

    pub fn without(self, kind: ConditionKind) -> Self {
        ConditionMask(self.0 & !kind.bit())
    }
}

impl BitOr for ConditionMask {
    type Output = ConditionMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        ConditionMask(self.0 | rhs.0)
    }
}

impl From<ConditionKind> for ConditionMask {
    fn from(kind: ConditionKind) -> Self {
        ConditionMask(kind.bit())
    }
}

impl FromIterator<ConditionKind> for ConditionMask {
    fn from_iter<I: IntoIterator<Item = ConditionKind>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ConditionMask::NONE, |mask, kind| mask.with(kind))
    }
}

/// A runtime condition as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeCondition {
    pub kind: ConditionKind,
    pub message: String,
    pub file: String,
    pub line: u32,
}

impl RuntimeCondition {
    pub fn new(
        kind: ConditionKind,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            file: file.into(),
            line,
        }
    }

    /// Raw condition payload as log context
    pub fn to_context(&self) -> LogContext {
        let mut ctx = LogContext::new();
        ctx.insert(CTX_TYPE.to_string(), json!(self.kind.as_str()));
        ctx.insert(CTX_MESSAGE.to_string(), json!(self.message));
        ctx.insert(CTX_FILE.to_string(), json!(self.file));
        ctx.insert(CTX_LINE.to_string(), json!(self.line));
        ctx
    }
}

/// What the host should do after a condition handler returns normally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOutcome {
    /// The handler dealt with the condition; skip default handling
    Handled,
    /// Continue with the host's default handling
    Proceed,
}

/// Fault raised in place of a runtime condition by the escalation pathway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EscalatedFault {
    pub kind: ConditionKind,
    pub message: String,
    pub file: String,
    pub line: u32,
}

impl EscalatedFault {
    /// Kind name carried by the adapted [`Fault`]
    pub const FAULT_KIND: &'static str = "EscalatedFault";

    pub fn from_condition(condition: &RuntimeCondition) -> Self {
        Self {
            kind: condition.kind,
            message: condition.message.clone(),
            file: condition.file.clone(),
            line: condition.line,
        }
    }

    pub fn to_fault(&self) -> Fault {
        Fault::new(Self::FAULT_KIND, self.message.clone())
            .with_code(self.kind.as_str())
            .with_origin(self.file.clone(), self.line)
    }
}

pub type ConditionHandler =
    Arc<dyn Fn(&RuntimeCondition) -> Result<ConditionOutcome, EscalatedFault> + Send + Sync>;
pub type AssertionHandler = Arc<dyn Fn(&Fault) + Send + Sync>;
pub type UncaughtHandler = Arc<dyn Fn(&Fault) + Send + Sync>;
pub type ExitHook = Arc<dyn Fn() + Send + Sync>;

/// Registration API and queries a host runtime exposes to the registry
pub trait HostRuntime: Send + Sync {
    /// Replace the handler for non-fatal runtime conditions
    fn install_condition_handler(&self, handler: ConditionHandler);

    /// Replace the handler for assertion failures
    fn install_assertion_handler(&self, handler: AssertionHandler);

    /// Append a hook run once when the process exits
    fn install_exit_hook(&self, hook: ExitHook);

    /// Replace the fallback handler for faults that escaped every other handler
    fn install_uncaught_handler(&self, handler: UncaughtHandler);

    /// False while condition reporting is fully suppressed
    fn reporting_active(&self) -> bool;

    /// Most recent condition that reached default handling
    fn last_condition(&self) -> Option<RuntimeCondition>;

    /// Stream for last-resort diagnostics, independent of any sink
    fn diagnostic_stream(&self) -> Box<dyn Write + Send>;

    /// End the process with `status`
    fn terminate(&self, status: i32);
}
