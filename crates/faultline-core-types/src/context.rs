//! Structured context carried alongside every log entry

use serde_json::{Map, Value};

/// Key/value context passed to sinks with each entry
pub type LogContext = Map<String, Value>;

/// Build a context from `(key, value)` pairs
///
/// # Example
///
/// ```
/// use faultline_core_types::context::context_from;
/// use serde_json::json;
///
/// let ctx = context_from([("file", json!("main.rs")), ("line", json!(7))]);
/// assert_eq!(ctx["line"], json!(7));
/// ```
pub fn context_from<K, I>(pairs: I) -> LogContext
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
