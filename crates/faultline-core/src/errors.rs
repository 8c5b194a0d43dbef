use faultline_core_types::ParseSeverityError;
use thiserror::Error;

/// Result type alias using FaultlineError
pub type Result<T> = std::result::Result<T, FaultlineError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling
/// and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    InvalidInput,
    Serialization,
    Sink,
    Io,
    Config,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Sink => "ERR_SINK",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Config => "ERR_CONFIG",
        }
    }
}

/// Canonical structured error type
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for fault capture operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FaultlineError {
    /// A stack frame argument cannot be represented in a serializable record
    #[error("Frame #{frame} argument {index} is not serializable: {reason}")]
    UnserializableArgument {
        frame: usize,
        index: usize,
        reason: String,
    },

    /// A sink rejected an entry
    #[error("Sink '{sink}' failed: {reason}")]
    SinkFailed { sink: String, reason: String },

    /// I/O failure while writing an entry or a diagnostic dump
    #[error("I/O error during {op}: {message}")]
    Io { op: String, message: String },

    /// Configuration could not be parsed or holds invalid values
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    /// A string did not name a severity level
    #[error("Unknown severity level: {value}")]
    UnknownSeverity { value: String },

    /// A string did not name a runtime condition kind
    #[error("Unknown condition kind: {value}")]
    UnknownConditionKind { value: String },

    /// JSON encoding failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl FaultlineError {
    /// Wrap an I/O error with the operation that hit it
    pub fn io(op: impl Into<String>, err: std::io::Error) -> Self {
        FaultlineError::Io {
            op: op.into(),
            message: err.to_string(),
        }
    }
}

impl From<FaultlineError> for ExError {
    fn from(err: FaultlineError) -> Self {
        let message = err.to_string();
        match err {
            FaultlineError::UnserializableArgument { .. } => {
                ExError::new(ExErrorKind::Serialization)
                    .with_op("build_record")
                    .with_message(message)
            }
            FaultlineError::SinkFailed { .. } => ExError::new(ExErrorKind::Sink)
                .with_op("log")
                .with_message(message),
            FaultlineError::Io { op, .. } => ExError::new(ExErrorKind::Io)
                .with_op(op)
                .with_message(message),
            FaultlineError::Config { .. } => ExError::new(ExErrorKind::Config)
                .with_op("load_config")
                .with_message(message),
            FaultlineError::UnknownSeverity { .. }
            | FaultlineError::UnknownConditionKind { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }
            FaultlineError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<ParseSeverityError> for FaultlineError {
    fn from(err: ParseSeverityError) -> Self {
        FaultlineError::UnknownSeverity { value: err.value }
    }
}

impl From<serde_json::Error> for FaultlineError {
    fn from(err: serde_json::Error) -> Self {
        FaultlineError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for FaultlineError {
    fn from(err: toml::de::Error) -> Self {
        FaultlineError::Config {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::InvalidInput, "ERR_INVALID_INPUT"),
            (ExErrorKind::Serialization, "ERR_SERIALIZATION"),
            (ExErrorKind::Sink, "ERR_SINK"),
            (ExErrorKind::Io, "ERR_IO"),
            (ExErrorKind::Config, "ERR_CONFIG"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_unserializable_argument_maps_to_serialization() {
        let err = FaultlineError::UnserializableArgument {
            frame: 2,
            index: 0,
            reason: "resource handle".to_string(),
        };
        let ex: ExError = err.into();
        assert_eq!(ex.kind(), ExErrorKind::Serialization);
        assert_eq!(ex.op(), Some("build_record"));
        assert!(ex.message().contains("Frame #2"));
    }

    #[test]
    fn test_io_keeps_operation() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let ex: ExError = FaultlineError::io("stream_sink", io).into();
        assert_eq!(ex.kind(), ExErrorKind::Io);
        assert_eq!(ex.op(), Some("stream_sink"));
        assert!(ex.to_string().starts_with("[ERR_IO] in operation 'stream_sink'"));
    }

    #[test]
    fn test_ex_error_source_chain() {
        let inner = ExError::new(ExErrorKind::Io).with_message("disk full");
        let outer = ExError::new(ExErrorKind::Sink).with_source(inner);
        let source = outer.source_error().expect("source should be set");
        assert_eq!(source.message(), "disk full");
        assert!(std::error::Error::source(&outer).is_some());
    }

    #[test]
    fn test_parse_severity_error_converts() {
        let err: FaultlineError = ParseSeverityError {
            value: "loud".to_string(),
        }
        .into();
        assert_eq!(
            err,
            FaultlineError::UnknownSeverity {
                value: "loud".to_string()
            }
        );
    }
}
