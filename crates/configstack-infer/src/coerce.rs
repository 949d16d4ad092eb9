//! String to value coercion.
//!
//! One function per value kind. Each takes the raw string and a strictness
//! flag: strict inference fails on input it does not recognise, lenient
//! inference hands the raw string back instead.

use serde_json::{Number, Value};

use crate::error::CoerceError;
use crate::kind::{InferMode, ValueKind};
use crate::literal::parse_literal;

/// Coercion rule for one command-line flag.
///
/// Built once per flag from the kind of the value the flag overrides, then
/// applied to every string parsed for that flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Coercer {
    kind: ValueKind,
    mode: InferMode,
}

impl Coercer {
    pub fn new(kind: ValueKind, mode: InferMode) -> Self {
        Self { kind, mode }
    }

    /// Coercer for a flag whose current value is `existing`.
    pub fn for_value(existing: &Value, mode: InferMode) -> Self {
        Self::new(ValueKind::of(existing), mode)
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn mode(&self) -> InferMode {
        self.mode
    }

    pub fn coerce(&self, raw: &str) -> Result<Value, CoerceError> {
        match self.mode {
            InferMode::Disabled => native_cast(&self.kind, raw),
            InferMode::Lenient | InferMode::Strict => infer(&self.kind, raw, self.mode.is_strict()),
        }
    }
}

fn infer(kind: &ValueKind, raw: &str, strict: bool) -> Result<Value, CoerceError> {
    match kind {
        ValueKind::Boolean => infer_boolean(raw, strict),
        ValueKind::Integer | ValueKind::Float => infer_numeric(raw, strict),
        ValueKind::Sequence(inner) => infer_iterable(raw, inner.as_deref(), strict),
        ValueKind::Mapping => infer_iterable(raw, None, strict),
        ValueKind::String => infer_string(raw, strict),
        ValueKind::Null => infer_string(raw, false),
    }
}

fn fallback(raw: &str, strict: bool, err: CoerceError) -> Result<Value, CoerceError> {
    if strict {
        return Err(err);
    }
    tracing::debug!("keeping '{}' as a string: {}", raw, err);
    Ok(Value::String(raw.to_string()))
}

/// `true`/`false` in any case, `none` for null.
pub fn infer_boolean(raw: &str, strict: bool) -> Result<Value, CoerceError> {
    match raw.to_lowercase().as_str() {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        "none" => Ok(Value::Null),
        _ => fallback(raw, strict, CoerceError::InvalidBoolean(raw.to_string())),
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Digits become an integer, `digits.digits` a float, `none` null.
///
/// Digits too large for a 64-bit integer become the nearest float.
///
/// There is no sign handling: `-3` is not a number here. Strict inference
/// rejects it and lenient inference keeps the string `"-3"`.
pub fn infer_numeric(raw: &str, strict: bool) -> Result<Value, CoerceError> {
    if raw.eq_ignore_ascii_case("none") {
        return Ok(Value::Null);
    }

    let parsed = if is_digits(raw) {
        raw.parse::<i64>()
            .map(Number::from)
            .or_else(|_| raw.parse::<u64>().map(Number::from))
            .ok()
            .or_else(|| raw.parse::<f64>().ok().and_then(Number::from_f64))
    } else {
        match raw.split_once('.') {
            Some((int_part, frac_part)) if is_digits(int_part) && is_digits(frac_part) => {
                raw.parse::<f64>().ok().and_then(Number::from_f64)
            }
            _ => None,
        }
    };

    match parsed {
        Some(n) => Ok(Value::Number(n)),
        None => fallback(raw, strict, CoerceError::InvalidNumber(raw.to_string())),
    }
}

/// Identity, except that lenient inference reads `None` as null.
pub fn infer_string(raw: &str, strict: bool) -> Result<Value, CoerceError> {
    if !strict && raw == "None" {
        return Ok(Value::Null);
    }
    Ok(Value::String(raw.to_string()))
}

/// Parse a literal, then coerce string elements with the element kind.
pub fn infer_iterable(
    raw: &str,
    element: Option<&ValueKind>,
    strict: bool,
) -> Result<Value, CoerceError> {
    let parsed = match parse_literal(raw) {
        Ok(v) => v,
        Err(err) => return fallback(raw, strict, err),
    };

    match (parsed, element) {
        (Value::Array(items), Some(kind)) => items
            .into_iter()
            .map(|item| coerce_element(item, kind, strict))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (parsed, _) => Ok(parsed),
    }
}

fn coerce_element(item: Value, kind: &ValueKind, strict: bool) -> Result<Value, CoerceError> {
    match (item, kind) {
        (Value::String(s), kind) => infer(kind, &s, strict),
        (Value::Number(n), ValueKind::Float) if !n.is_f64() => Ok(n
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Number(n))),
        (Value::Array(items), ValueKind::Sequence(Some(inner))) => items
            .into_iter()
            .map(|item| coerce_element(item, inner, strict))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (item, _) => Ok(item),
    }
}

/// Cast with the runtime type of the existing value, no inference.
///
/// Booleans are true for any non-empty string; sequences split the string
/// into one-character strings. Mappings cannot be cast from a string.
pub fn native_cast(kind: &ValueKind, raw: &str) -> Result<Value, CoerceError> {
    let cast_error = || CoerceError::NativeCast {
        input: raw.to_string(),
        kind: kind.clone(),
    };

    match kind {
        ValueKind::Boolean => Ok(Value::Bool(!raw.is_empty())),
        ValueKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(|i| Value::Number(i.into()))
            .map_err(|_| cast_error()),
        ValueKind::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(cast_error),
        ValueKind::String | ValueKind::Null => Ok(Value::String(raw.to_string())),
        ValueKind::Sequence(_) => Ok(Value::Array(
            raw.chars().map(|c| Value::String(c.to_string())).collect(),
        )),
        ValueKind::Mapping => Err(cast_error()),
    }
}
