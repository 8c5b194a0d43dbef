//! Capture configuration
//!
//! Loaded from TOML; every field has a default, so an empty document is a
//! valid configuration:
//!
//! ```toml
//! escalation_mask = ["warning", "notice", "user_warning"]
//! assertion_severity = "error"
//! uncaught_severity = "critical"
//! uncaught_floor = "error"
//! fatal_severity = "alert"
//! fatal_floor = "error"
//! max_chain_depth = 64
//! exit_status = 1
//! ```

use crate::capture::{ConditionKind, ConditionMask};
use crate::errors::{FaultlineError, Result};
use crate::record::DEFAULT_MAX_CHAIN_DEPTH;
use faultline_core_types::SeverityLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Condition kinds the escalation pathway turns into faults
    pub escalation_mask: Vec<ConditionKind>,
    /// Severity used by the probe and by callers without their own preference
    pub assertion_severity: SeverityLevel,
    pub uncaught_severity: SeverityLevel,
    pub uncaught_floor: SeverityLevel,
    pub fatal_severity: SeverityLevel,
    pub fatal_floor: SeverityLevel,
    pub max_chain_depth: usize,
    /// Status the uncaught pathway terminates with, in `1..=255`
    pub exit_status: i32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            escalation_mask: ConditionKind::ALL.to_vec(),
            assertion_severity: SeverityLevel::Error,
            uncaught_severity: SeverityLevel::Critical,
            uncaught_floor: SeverityLevel::Error,
            fatal_severity: SeverityLevel::Alert,
            fatal_floor: SeverityLevel::Error,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            exit_status: 1,
        }
    }
}

impl CaptureConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// [`FaultlineError::Config`] for malformed TOML, unknown keys, unknown
    /// severity or condition names, and values rejected by [`Self::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CaptureConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    ///
    /// [`FaultlineError::Io`] when the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| FaultlineError::io("read_config", e))?;
        Self::from_toml_str(&text)
    }

    /// Reject values the pathways cannot honor
    ///
    /// # Errors
    ///
    /// [`FaultlineError::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        // Exit statuses are truncated to 8 bits, so 256 would read as success.
        if !(1..=255).contains(&self.exit_status) {
            return Err(FaultlineError::Config {
                reason: format!("exit_status must be in 1..=255, got {}", self.exit_status),
            });
        }
        if self.max_chain_depth == 0 {
            return Err(FaultlineError::Config {
                reason: "max_chain_depth must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn escalation_mask(&self) -> ConditionMask {
        self.escalation_mask.iter().copied().collect()
    }
}
