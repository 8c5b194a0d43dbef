//! Canonical logging macros for capture pathways

/// Log a pathway event at debug level
///
/// # Example
///
/// ```
/// # use faultline_core::log_capture;
/// use faultline_core::schema::{EVENT_INSTALL, PATHWAY_FATAL};
///
/// log_capture!(PATHWAY_FATAL, EVENT_INSTALL);
/// log_capture!(PATHWAY_FATAL, EVENT_INSTALL, sinks = 2);
/// ```
#[macro_export]
macro_rules! log_capture {
    ($pathway:expr, $event:expr) => {
        tracing::debug!(
            component = module_path!(),
            pathway = $pathway,
            event = $event,
        );
    };
    ($pathway:expr, $event:expr, $($field:tt)*) => {
        tracing::debug!(
            component = module_path!(),
            pathway = $pathway,
            event = $event,
            $($field)*
        );
    };
}

/// Log a failure the pathway swallowed, with its stable error code
///
/// # Example
///
/// ```
/// # use faultline_core::log_capture_failure;
/// use faultline_core::errors::FaultlineError;
/// use faultline_core::schema::PATHWAY_FATAL;
///
/// let err = FaultlineError::SinkFailed { sink: "file".into(), reason: "closed".into() };
/// log_capture_failure!(PATHWAY_FATAL, err);
/// ```
#[macro_export]
macro_rules! log_capture_failure {
    ($pathway:expr, $err:expr) => {{
        use $crate::errors::ExError;
        let ex_err: ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            pathway = $pathway,
            event = $crate::schema::EVENT_SINK_FAILED,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            "{}",
            ex_err.message()
        );
    }};
}
