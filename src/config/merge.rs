//! Configuration merge logic
//!
//! Merge semantics shared by every layer:
//! - Mappings: deep-merge by key
//! - Sequences: REPLACE (last wins)
//! - Scalars and null: override (last wins)
//! - A non-mapping overlay retires the whole subtree underneath it

use serde_json::{Map, Value};

/// Deep merge two JSON values.
///
/// Merge semantics:
/// - Objects: deep-merge by key (recursive)
/// - Arrays: REPLACE (second wins entirely)
/// - Scalars: override (second wins)
/// - Null: override (null can override any value)
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        // Both objects: deep merge
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            merge_into(&mut base_map, overlay_map);
            Value::Object(base_map)
        }

        // Scalars, arrays and any other case: overlay wins
        (_, overlay) => overlay,
    }
}

/// Merge `overlay` into `base` in place.
///
/// Keys keep their position in `base`; keys only present in `overlay` are
/// appended in overlay order.
pub fn merge_into(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, overlay_value) in overlay {
        match overlay_value {
            Value::Object(overlay_map) => {
                if let Some(Value::Object(base_map)) = base.get_mut(&key) {
                    merge_into(base_map, overlay_map);
                } else {
                    base.insert(key, Value::Object(overlay_map));
                }
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}

/// Merge multiple config layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}
