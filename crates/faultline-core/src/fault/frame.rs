//! Stack frame descriptors
//!
//! Every field is optional: what a host can introspect differs between
//! runtimes, and formatting and record building degrade to placeholders.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder rendered for a frame without a file
pub const UNKNOWN_FILE: &str = "unknown";

/// Marker that replaces the raw name of an anonymous function body
pub const ANONYMOUS_FUNCTION: &str = "{closure}";

/// One entry of a fault's backtrace; index 0 is the innermost frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackFrame {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub owning_type: Option<String>,
    pub call_kind: Option<String>,
    pub function: Option<String>,
    pub args: Vec<FrameArg>,
}

impl StackFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: Some(file.into()),
            line: Some(line),
            ..Self::default()
        }
    }

    pub fn with_owning_type(mut self, owning_type: impl Into<String>) -> Self {
        self.owning_type = Some(owning_type.into());
        self
    }

    pub fn with_call_kind(mut self, call_kind: impl Into<String>) -> Self {
        self.call_kind = Some(call_kind.into());
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_args(mut self, args: Vec<FrameArg>) -> Self {
        self.args = args;
        self
    }

    /// True when the frame names a calling type or a function
    pub fn has_call_site(&self) -> bool {
        self.owning_type.is_some() || self.function.is_some()
    }

    /// Function name as it should be displayed
    ///
    /// Anonymous bodies inside a named type collapse to [`ANONYMOUS_FUNCTION`].
    pub fn display_function(&self) -> &str {
        match self.function.as_deref() {
            Some(f) if self.owning_type.is_some() && is_anonymous(f) => ANONYMOUS_FUNCTION,
            Some(f) => f,
            None => "",
        }
    }

    /// `type<kind>function(summary)`, or `None` when there is no call site
    pub fn call_signature(&self) -> Option<String> {
        if !self.has_call_site() {
            return None;
        }
        let params: Vec<String> = self.args.iter().map(FrameArg::summary).collect();
        Some(format!(
            "{}{}{}({})",
            self.owning_type.as_deref().unwrap_or(""),
            self.call_kind.as_deref().unwrap_or(""),
            self.display_function(),
            params.join(", ")
        ))
    }
}

fn is_anonymous(function: &str) -> bool {
    function.contains(ANONYMOUS_FUNCTION)
}

/// Opaque argument value captured with a frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameArg {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<FrameArg>),
    Object {
        type_name: String,
        fields: Option<Value>,
    },
    /// Live handle (file descriptor, socket, lock); never serializable
    Resource(String),
}

impl FrameArg {
    /// Short type summary used in call signatures
    pub fn summary(&self) -> String {
        match self {
            FrameArg::Array(items) => format!("array{}", items.len()),
            FrameArg::Object { type_name, .. } => type_name.clone(),
            other => other.type_name().to_string(),
        }
    }

    /// Primitive type name
    pub fn type_name(&self) -> &str {
        match self {
            FrameArg::Null => "null",
            FrameArg::Bool(_) => "bool",
            FrameArg::Int(_) => "int",
            FrameArg::Float(_) => "float",
            FrameArg::Str(_) => "string",
            FrameArg::Array(_) => "array",
            FrameArg::Object { type_name, .. } => type_name,
            FrameArg::Resource(_) => "resource",
        }
    }

    /// JSON form, or the reason the value cannot be represented
    pub fn to_value(&self) -> Result<Value, String> {
        match self {
            FrameArg::Null => Ok(Value::Null),
            FrameArg::Bool(b) => Ok(Value::Bool(*b)),
            FrameArg::Int(i) => Ok(Value::from(*i)),
            FrameArg::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| format!("non-finite float {}", f)),
            FrameArg::Str(s) => Ok(Value::String(s.clone())),
            FrameArg::Array(items) => items
                .iter()
                .map(FrameArg::to_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            FrameArg::Object { type_name, fields } => {
                let mut map = serde_json::Map::new();
                map.insert("type".to_string(), Value::String(type_name.clone()));
                if let Some(fields) = fields {
                    map.insert("fields".to_string(), fields.clone());
                }
                Ok(Value::Object(map))
            }
            FrameArg::Resource(label) => Err(format!("resource handle '{}'", label)),
        }
    }
}

/// Serializable frame as stored in a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
    pub owning_type: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub call_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default)]
    pub args: Vec<Value>,
}
