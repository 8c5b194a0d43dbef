//! Severity levels for captured faults
//!
//! Levels follow the eight syslog-style tiers and are totally ordered, so a
//! level can serve both as the tag on a log entry and as the floor of a
//! range filter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Ordered severity of a log entry
///
/// Variant order defines the ordering: `Debug` is the lowest, `Emergency`
/// the highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl SeverityLevel {
    /// Every level, lowest first
    pub const ALL: [SeverityLevel; 8] = [
        SeverityLevel::Debug,
        SeverityLevel::Info,
        SeverityLevel::Notice,
        SeverityLevel::Warning,
        SeverityLevel::Error,
        SeverityLevel::Critical,
        SeverityLevel::Alert,
        SeverityLevel::Emergency,
    ];

    /// Lowercase canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::Debug => "debug",
            SeverityLevel::Info => "info",
            SeverityLevel::Notice => "notice",
            SeverityLevel::Warning => "warning",
            SeverityLevel::Error => "error",
            SeverityLevel::Critical => "critical",
            SeverityLevel::Alert => "alert",
            SeverityLevel::Emergency => "emergency",
        }
    }

    /// True when `self` is at or above `floor`
    pub fn reaches(&self, floor: SeverityLevel) -> bool {
        *self >= floor
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a severity level
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown severity level: {value}")]
pub struct ParseSeverityError {
    pub value: String,
}

impl FromStr for SeverityLevel {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SeverityLevel::ALL
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseSeverityError {
                value: s.to_string(),
            })
    }
}
