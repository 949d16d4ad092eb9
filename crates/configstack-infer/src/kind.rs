//! Value kinds and inference modes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoerceError;

/// The kind of a configuration value before it went through the command line.
///
/// This is the type witness used to pick a coercion rule for the string the
/// command line supplies in its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Integer,
    Float,
    String,
    /// A sequence, with the element kind when every non-null element shares one.
    Sequence(Option<Box<ValueKind>>),
    Mapping,
    Null,
}

impl ValueKind {
    /// Derive the kind of an existing value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(n) if n.is_f64() => ValueKind::Float,
            Value::Number(_) => ValueKind::Integer,
            Value::String(_) => ValueKind::String,
            Value::Array(items) => ValueKind::Sequence(Self::element_kind(items).map(Box::new)),
            Value::Object(_) => ValueKind::Mapping,
        }
    }

    fn element_kind(items: &[Value]) -> Option<ValueKind> {
        let mut kinds = items.iter().filter(|v| !v.is_null()).map(ValueKind::of);
        let first = kinds.next()?;
        kinds.all(|k| k == first).then_some(first)
    }

    /// Short name used in flag help and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Boolean => "bool",
            ValueKind::Integer => "int",
            ValueKind::Float => "float",
            ValueKind::String => "str",
            ValueKind::Sequence(_) => "list",
            ValueKind::Mapping => "mapping",
            ValueKind::Null => "none",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Sequence(Some(inner)) => write!(f, "list[{}]", inner),
            other => f.write_str(other.name()),
        }
    }
}

/// How command-line strings are turned back into typed values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferMode {
    /// Cast with the runtime type of the existing value.
    ///
    /// A boolean default turns any non-empty string into `true`, so
    /// `--flag False` yields `true` in this mode.
    Disabled,
    /// Type-directed inference; unrecognised input stays a string.
    #[default]
    Lenient,
    /// Type-directed inference; unrecognised input is an error.
    Strict,
}

impl InferMode {
    pub fn is_strict(self) -> bool {
        self == InferMode::Strict
    }
}

impl fmt::Display for InferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferMode::Disabled => write!(f, "disabled"),
            InferMode::Lenient => write!(f, "lenient"),
            InferMode::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for InferMode {
    type Err = CoerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "false" | "disabled" => Ok(InferMode::Disabled),
            "lenient" | "fuzzy" | "true" => Ok(InferMode::Lenient),
            "strict" => Ok(InferMode::Strict),
            _ => Err(CoerceError::UnknownMode(s.to_string())),
        }
    }
}
