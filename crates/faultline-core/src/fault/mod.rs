//! Fault abstraction
//!
//! Every host-specific failure (a panic, an error returned out of `main`, an
//! escalated runtime condition) is adapted into a [`Fault`] at the boundary.
//! The rest of the crate only ever sees this one shape.

pub mod adapt;
pub mod frame;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use adapt::parse_backtrace;
pub use frame::{FrameArg, FrameRecord, StackFrame, ANONYMOUS_FUNCTION, UNKNOWN_FILE};

/// Numeric or symbolic fault code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FaultCode {
    Int(i64),
    Text(String),
}

impl Default for FaultCode {
    fn default() -> Self {
        FaultCode::Int(0)
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultCode::Int(i) => write!(f, "{}", i),
            FaultCode::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FaultCode {
    fn from(code: i64) -> Self {
        FaultCode::Int(code)
    }
}

impl From<&str> for FaultCode {
    fn from(code: &str) -> Self {
        FaultCode::Text(code.to_string())
    }
}

/// Where a fault was raised
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origin {
    pub file: String,
    pub line: u32,
}

impl Origin {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

/// A raised fault and its causal predecessors
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    kind: String,
    message: String,
    code: FaultCode,
    origin: Origin,
    trace: Vec<StackFrame>,
    previous: Option<Box<Fault>>,
    chain_truncated: bool,
}

impl Fault {
    /// `kind` is the concrete variant name shown in diagnostic dumps
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            code: FaultCode::default(),
            origin: Origin::default(),
            trace: Vec::new(),
            previous: None,
            chain_truncated: false,
        }
    }

    pub fn with_code(mut self, code: impl Into<FaultCode>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_origin(mut self, file: impl Into<String>, line: u32) -> Self {
        self.origin = Origin::new(file, line);
        self
    }

    pub fn with_frame(mut self, frame: StackFrame) -> Self {
        self.trace.push(frame);
        self
    }

    pub fn with_frames(mut self, frames: Vec<StackFrame>) -> Self {
        self.trace = frames;
        self
    }

    pub fn with_previous(mut self, previous: Fault) -> Self {
        self.previous = Some(Box::new(previous));
        self
    }

    /// Mark that predecessors below this fault existed but were not adapted
    pub fn with_chain_truncated(mut self) -> Self {
        self.chain_truncated = true;
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> &FaultCode {
        &self.code
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn trace(&self) -> &[StackFrame] {
        &self.trace
    }

    pub fn previous(&self) -> Option<&Fault> {
        self.previous.as_deref()
    }

    pub fn is_chain_truncated(&self) -> bool {
        self.chain_truncated
    }

    /// Number of causal predecessors
    pub fn chain_depth(&self) -> usize {
        std::iter::successors(self.previous(), |f| f.previous()).count()
    }

    /// Flat text form of the backtrace, one `#i file(line): call` line per
    /// frame followed by a closing `#n {main}` line
    pub fn rendered_trace(&self) -> String {
        let mut out = String::new();
        for (idx, frame) in self.trace.iter().enumerate() {
            out.push_str(&format!(
                "#{} {}({})",
                idx,
                frame.file.as_deref().unwrap_or(UNKNOWN_FILE),
                frame.line.unwrap_or(0)
            ));
            if let Some(signature) = frame.call_signature() {
                out.push_str(": ");
                out.push_str(&signature);
            }
            out.push('\n');
        }
        out.push_str(&format!("#{} {{main}}", self.trace.len()));
        out
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
