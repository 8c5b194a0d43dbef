//! Flat, serializable records of faults
//!
//! [`RecordBuilder::build`] converts a live [`Fault`] into a [`FaultRecord`]
//! that can be placed in a log context. Two flags control cost and risk:
//!
//! - `include_trace` keeps structured frames (arguments included); when
//!   `false` the trace is the pre-rendered string form, which cannot fail.
//! - `include_previous` recurses into the causal chain with the same flags;
//!   when `false` the record's `previous` is always `None`.
//!
//! Recursion is bounded by the builder's maximum depth. A chain cut at the
//! bound, or cut earlier when the fault was adapted, marks its last kept
//! record with `truncated: true`.

use crate::errors::{FaultlineError, Result};
use crate::fault::{Fault, FaultCode, FrameRecord, StackFrame};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default bound on causal-chain recursion
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 64;

/// Serializable form of a fault
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultRecord {
    pub message: String,
    pub code: FaultCode,
    pub file: String,
    pub line: u32,
    pub trace: RecordTrace,
    pub previous: Option<Box<FaultRecord>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

/// Structured frames or the rendered text of a backtrace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordTrace {
    Frames(Vec<FrameRecord>),
    Rendered(String),
}

impl FaultRecord {
    /// Number of records below this one in the `previous` chain
    pub fn depth(&self) -> usize {
        std::iter::successors(self.previous.as_deref(), |r| r.previous.as_deref()).count()
    }

    /// JSON form for a log context
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Builds [`FaultRecord`]s with a bounded chain depth
#[derive(Debug, Clone, Copy)]
pub struct RecordBuilder {
    max_depth: usize,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHAIN_DEPTH)
    }
}

impl RecordBuilder {
    /// `max_depth` is the number of predecessors kept below the head record
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Build a record, or `None` when `fault` is absent
    ///
    /// # Errors
    ///
    /// With `include_trace` set, fails with
    /// [`FaultlineError::UnserializableArgument`] when a frame argument has no
    /// JSON form. Never fails when `include_trace` is `false`.
    pub fn build(
        &self,
        fault: Option<&Fault>,
        include_previous: bool,
        include_trace: bool,
    ) -> Result<Option<FaultRecord>> {
        self.build_at(fault, include_previous, include_trace, 0)
    }

    /// Build the stripped form: rendered trace, no predecessors
    pub fn build_stripped(&self, fault: &Fault) -> FaultRecord {
        FaultRecord {
            message: fault.message().to_string(),
            code: fault.code().clone(),
            file: fault.origin().file.clone(),
            line: fault.origin().line,
            trace: RecordTrace::Rendered(fault.rendered_trace()),
            previous: None,
            truncated: false,
        }
    }

    fn build_at(
        &self,
        fault: Option<&Fault>,
        include_previous: bool,
        include_trace: bool,
        depth: usize,
    ) -> Result<Option<FaultRecord>> {
        let fault = match fault {
            Some(fault) => fault,
            None => return Ok(None),
        };

        let trace = if include_trace {
            RecordTrace::Frames(frame_records(fault.trace())?)
        } else {
            RecordTrace::Rendered(fault.rendered_trace())
        };

        let mut truncated = include_previous && fault.is_chain_truncated();
        let previous = if !include_previous {
            None
        } else if depth >= self.max_depth {
            truncated |= fault.previous().is_some();
            None
        } else {
            self.build_at(fault.previous(), include_previous, include_trace, depth + 1)?
                .map(Box::new)
        };

        Ok(Some(FaultRecord {
            message: fault.message().to_string(),
            code: fault.code().clone(),
            file: fault.origin().file.clone(),
            line: fault.origin().line,
            trace,
            previous,
            truncated,
        }))
    }
}

fn frame_records(frames: &[StackFrame]) -> Result<Vec<FrameRecord>> {
    frames
        .iter()
        .enumerate()
        .map(|(frame_idx, frame)| {
            let args = frame
                .args
                .iter()
                .enumerate()
                .map(|(arg_idx, arg)| {
                    arg.to_value()
                        .map_err(|reason| FaultlineError::UnserializableArgument {
                            frame: frame_idx,
                            index: arg_idx,
                            reason,
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(FrameRecord {
                file: frame.file.clone(),
                line: frame.line,
                owning_type: frame.owning_type.clone(),
                call_kind: frame.call_kind.clone(),
                function: frame.function.clone(),
                args,
            })
        })
        .collect()
}
