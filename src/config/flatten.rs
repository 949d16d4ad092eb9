//! Flattened (dotted) keys
//!
//! `{"data": {"batch_size": 12}}` flattens to `[("data.batch_size", 12)]`.
//! An empty mapping has no leaves of its own, so it is kept as a leaf value;
//! that way flattening and unflattening always give back the same tree.

use serde_json::{Map, Value};

use super::tree::ConfigError;

/// Default separator between key segments.
pub const SEPARATOR: &str = ".";

/// Depth-first `(dotted key, value)` pairs, in key order.
///
/// With `include_intermediate`, every non-empty nested mapping is also
/// yielded under its own prefix, right before its descendants. A caller can
/// then address a whole subtree with one key.
pub fn flatten(
    map: &Map<String, Value>,
    separator: &str,
    include_intermediate: bool,
) -> Vec<(String, Value)> {
    let mut entries = Vec::new();
    flatten_into(map, None, separator, include_intermediate, &mut entries);
    entries
}

fn flatten_into(
    map: &Map<String, Value>,
    prefix: Option<&str>,
    separator: &str,
    include_intermediate: bool,
    entries: &mut Vec<(String, Value)>,
) {
    for (key, value) in map {
        let full_key = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, separator, key),
            None => key.clone(),
        };

        match value {
            Value::Object(inner) if !inner.is_empty() => {
                if include_intermediate {
                    entries.push((full_key.clone(), value.clone()));
                }
                flatten_into(inner, Some(&full_key), separator, include_intermediate, entries);
            }
            _ => entries.push((full_key, value.clone())),
        }
    }
}

/// Assign `value` at `key` inside an existing nested mapping.
///
/// Every segment before the last must already exist and hold a mapping.
/// The last segment is created or replaced.
pub fn unflatten_set(
    map: &mut Map<String, Value>,
    key: &str,
    value: Value,
    separator: &str,
) -> Result<(), ConfigError> {
    if separator.is_empty() {
        map.insert(key.to_string(), value);
        return Ok(());
    }

    let mut current = map;
    let mut rest = key;
    let mut walked = String::new();

    while let Some((head, tail)) = rest.split_once(separator) {
        if !walked.is_empty() {
            walked.push_str(separator);
        }
        walked.push_str(head);

        current = match current.get_mut(head) {
            Some(Value::Object(next)) => next,
            Some(_) => {
                return Err(ConfigError::NotAMapping {
                    key: key.to_string(),
                    segment: walked,
                })
            }
            None => {
                return Err(ConfigError::MissingKey {
                    key: key.to_string(),
                    segment: walked,
                })
            }
        };
        rest = tail;
    }

    current.insert(rest.to_string(), value);
    Ok(())
}

/// Rebuild a nested mapping from flattened entries, creating intermediate
/// mappings as needed.
pub fn unflatten<I>(entries: I, separator: &str) -> Result<Map<String, Value>, ConfigError>
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut root = Map::new();

    for (key, value) in entries {
        let mut current = &mut root;
        let mut rest = key.as_str();
        let mut walked = String::new();

        while let Some((head, tail)) = rest.split_once(separator).filter(|_| !separator.is_empty()) {
            if !walked.is_empty() {
                walked.push_str(separator);
            }
            walked.push_str(head);

            let slot = current
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match slot {
                Value::Object(next) => next,
                _ => {
                    return Err(ConfigError::NotAMapping {
                        key: key.clone(),
                        segment: walked,
                    })
                }
            };
            rest = tail;
        }

        current.insert(rest.to_string(), value);
    }

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_flatten_nested() {
        let nested = map(json!({"a": {"b": 3, "c": {"d": "e", "f": 5}, "g": 5}}));
        let flat = flatten(&nested, SEPARATOR, false);

        assert_eq!(
            flat,
            vec![
                ("a.b".to_string(), json!(3)),
                ("a.c.d".to_string(), json!("e")),
                ("a.c.f".to_string(), json!(5)),
                ("a.g".to_string(), json!(5)),
            ]
        );
    }

    #[test]
    fn test_flatten_flat_mapping_is_unchanged() {
        let flat_input = map(json!({"a": 2, "b": 3, "c": 4}));
        let flat = flatten(&flat_input, SEPARATOR, false);
        let rebuilt: Map<String, Value> = flat.into_iter().collect();
        assert_eq!(rebuilt, flat_input);
    }

    #[test]
    fn test_flatten_with_intermediate() {
        let nested = map(json!({"data": {"batch_size": 12}, "seed": 1}));
        let flat = flatten(&nested, SEPARATOR, true);

        assert_eq!(
            flat,
            vec![
                ("data".to_string(), json!({"batch_size": 12})),
                ("data.batch_size".to_string(), json!(12)),
                ("seed".to_string(), json!(1)),
            ]
        );
    }

    #[test]
    fn test_flatten_custom_separator_and_empty_mapping() {
        let nested = map(json!({"a": {"b": 1, "empty": {}}}));
        let flat = flatten(&nested, "/", false);

        assert_eq!(
            flat,
            vec![("a/b".to_string(), json!(1)), ("a/empty".to_string(), json!({}))]
        );
    }

    #[test]
    fn test_unflatten_set() {
        let mut nested = map(json!({"a": {"b": 3, "c": {"d": "e", "f": 5}, "g": 5}}));

        unflatten_set(&mut nested, "a.c.f", json!(8), SEPARATOR).unwrap();
        assert_eq!(nested["a"]["c"]["f"], 8);

        unflatten_set(&mut nested, "g", json!("cool"), SEPARATOR).unwrap();
        assert_eq!(nested["g"], "cool");

        // New leaf under an existing mapping
        unflatten_set(&mut nested, "a.c.h", json!(null), SEPARATOR).unwrap();
        assert!(nested["a"]["c"]["h"].is_null());
    }

    #[test]
    fn test_unflatten_set_missing_intermediate() {
        let mut nested = map(json!({"a": {"b": 3}}));
        let err = unflatten_set(&mut nested, "a.x.y", json!(1), SEPARATOR).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::MissingKey { ref segment, .. } if segment == "a.x"
        ));
    }

    #[test]
    fn test_unflatten_set_through_scalar() {
        let mut nested = map(json!({"a": {"b": 3}}));
        let err = unflatten_set(&mut nested, "a.b.c", json!(1), SEPARATOR).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::NotAMapping { ref segment, .. } if segment == "a.b"
        ));
    }

    #[test]
    fn test_unflatten_round_trip() {
        let nested = map(json!({
            "opt": {"optimizer": "adam", "lr": 0.1},
            "data": {"dataset": "ns", "sizes": [16, 32], "extra": {}},
            "seed": null
        }));

        let rebuilt = unflatten(flatten(&nested, SEPARATOR, false), SEPARATOR).unwrap();
        assert_eq!(rebuilt, nested);

        let rebuilt = unflatten(flatten(&nested, SEPARATOR, true), SEPARATOR).unwrap();
        assert_eq!(rebuilt, nested);
    }

    #[test]
    fn test_unflatten_conflicting_entries() {
        let entries = vec![
            ("a".to_string(), json!(1)),
            ("a.b".to_string(), json!(2)),
        ];
        assert!(matches!(
            unflatten(entries, SEPARATOR),
            Err(ConfigError::NotAMapping { .. })
        ));
    }
}
