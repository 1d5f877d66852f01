//! Deep merge and compaction of JSON trees.
//!
//! Request bodies are assembled from many single-branch fragments (one per
//! mapped property), merged together, then compacted so that unset
//! properties never reach the server.

use crate::error::{Error, Result, json_type_name};
use serde_json::{Map, Value};

/// Merge two JSON objects key by key.
///
/// Nested objects present on both sides are merged recursively; on any
/// other collision the value from `b` wins.
///
/// ```
/// use restkit::merge::deep_merge;
/// use serde_json::json;
///
/// let merged = deep_merge(json!({"svm": {"name": "vs0"}}), json!({"svm": {"uuid": "u"}})).unwrap();
/// assert_eq!(merged, json!({"svm": {"name": "vs0", "uuid": "u"}}));
/// ```
pub fn deep_merge(a: Value, b: Value) -> Result<Value> {
    match (a, b) {
        (Value::Object(mut target), Value::Object(source)) => {
            merge_into(&mut target, source);
            Ok(Value::Object(target))
        }
        (Value::Object(_), other) | (other, _) => Err(Error::NotATree {
            found: json_type_name(&other),
        }),
    }
}

fn merge_into(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// Recursively drop `null` values and values that are empty after
/// compaction (`""`, `[]`, `{}`).
///
/// An object that compacts to nothing comes back as `{}`.
///
/// ```
/// use restkit::merge::deep_compact;
/// use serde_json::json;
///
/// assert_eq!(deep_compact(json!({"a": {"b": null, "c": ""}, "d": 1})), json!({"d": 1}));
/// ```
pub fn deep_compact(value: Value) -> Value {
    let was_object = value.is_object();
    match compact(value) {
        Some(value) => value,
        None if was_object => Value::Object(Map::new()),
        None => Value::Null,
    }
}

fn compact(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .filter_map(|(key, value)| compact(value).map(|v| (key, v)))
                .collect();
            (!map.is_empty()).then_some(Value::Object(map))
        }
        Value::Array(items) => {
            let items: Vec<Value> = items.into_iter().filter_map(compact).collect();
            (!items.is_empty()).then_some(Value::Array(items))
        }
        other => Some(other),
    }
}

/// Whether a payload carries nothing: `null`, `""`, `[]` or `{}`.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
