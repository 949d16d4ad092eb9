//! The configuration tree

use std::fmt;
use std::ops::Index;

use serde::Serialize;
use serde_json::{Map, Value};

use super::flatten::{flatten, unflatten_set, SEPARATOR};
use super::merge::merge_into;

/// Errors from building or editing a configuration tree
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration root must be a mapping, found {0}")]
    InvalidRoot(&'static str),

    #[error("cannot set '{key}': no key '{segment}'")]
    MissingKey { key: String, segment: String },

    #[error("cannot set '{key}': '{segment}' is not a mapping")]
    NotAMapping { key: String, segment: String },
}

/// A nested, string-keyed configuration.
///
/// Values are scalars, sequences or nested mappings. Keys keep the order in
/// which they were first inserted.
///
/// Use [`Config::merge`] to layer one configuration over another: mappings
/// merge key by key, anything else replaces what was there.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Config(Map<String, Value>);

static NULL: Value = Value::Null;

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// The literal strings `None` and `none` stand for null in loaded mappings.
fn normalize(map: &mut Map<String, Value>) {
    for value in map.values_mut() {
        normalize_value(value);
    }
}

/// Apply the `None` sentinel to one value and any mappings inside it.
/// Strings inside sequences are left alone.
pub(crate) fn normalize_value(value: &mut Value) {
    match value {
        Value::Object(inner) => normalize(inner),
        Value::String(s) if s == "None" || s == "none" => *value = Value::Null,
        _ => {}
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from a parsed document.
    ///
    /// The root must be a mapping. String values `"None"` and `"none"` in any
    /// nested mapping become null; strings inside sequences are left alone.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(map) => Ok(Self::from(map)),
            other => Err(ConfigError::InvalidRoot(kind_name(&other))),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Get a value by dotted path, e.g. `data.batch_size`
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split(SEPARATOR);
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a top-level key, keeping the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Layer `overlay` over this configuration.
    ///
    /// Where both sides hold a mapping the merge recurses, so sibling keys
    /// the overlay does not mention survive. Anything else in the overlay
    /// replaces the existing value, including a scalar replacing a whole
    /// nested mapping.
    pub fn merge(&mut self, overlay: Config) {
        merge_into(&mut self.0, overlay.0);
    }

    /// Builder-style [`Config::merge`].
    pub fn merged(mut self, overlay: Config) -> Self {
        self.merge(overlay);
        self
    }

    /// Dotted `(key, value)` pairs for every leaf, see [`flatten`].
    pub fn flatten(&self, include_intermediate: bool) -> Vec<(String, Value)> {
        flatten(&self.0, SEPARATOR, include_intermediate)
    }

    /// Assign a value by dotted path, see [`unflatten_set`].
    pub fn set_path(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        unflatten_set(&mut self.0, key, value, SEPARATOR)
    }
}

impl From<Map<String, Value>> for Config {
    fn from(mut map: Map<String, Value>) -> Self {
        normalize(&mut map);
        Self(map)
    }
}

impl TryFrom<Value> for Config {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Config> for Value {
    fn from(config: Config) -> Self {
        config.into_value()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map: Map<String, Value> = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self::from(map)
    }
}

/// Missing keys index to null, like `serde_json::Value`.
impl Index<&str> for Config {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL)
    }
}

/// Render a leaf for `key=value` listings; strings are written bare.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// One `key=value` line per flattened leaf.
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.flatten(false) {
            writeln!(f, "{}={}", key, render_value(&value))?;
        }
        Ok(())
    }
}
