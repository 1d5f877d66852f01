//! Built-in property converters, referenced from manifests by hook name

use restkit::error::json_type_name;
use restkit::{Error, PropertyConverter, path};
use serde_json::{Value, json};

/// Hook names accepted in `mapping = { hook = "..." }`
pub const BUILTIN_HOOKS: &[&str] = &["name_list"];

/// Look up a built-in converter by hook name
///
/// Returns `None` for unknown hooks.
pub fn builtin(hook: &str, property: &str, path: &str) -> Option<NameList> {
    match hook {
        "name_list" => Some(NameList::new(property, path)),
        _ => None,
    }
}

/// A list of names stored remotely as a list of `{ "name": ... }` objects
///
/// `["iqn.a", "iqn.b"]` locally becomes
/// `{"initiators": [{"name": "iqn.a"}, {"name": "iqn.b"}]}` with path
/// `initiators`.
#[derive(Debug, Clone)]
pub struct NameList {
    property: String,
    path: String,
}

impl NameList {
    pub fn new(property: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            path: path.into(),
        }
    }
}

impl PropertyConverter for NameList {
    fn from_json(&self, document: &Value) -> restkit::Result<Option<Value>> {
        let Some(Value::Array(items)) = path::search(&self.path, document)? else {
            return Ok(None);
        };

        let names = items
            .iter()
            .filter_map(|item| item.get("name").cloned())
            .collect();
        Ok(Some(Value::Array(names)))
    }

    fn to_json(&self, value: &Value) -> restkit::Result<Value> {
        let Value::Array(names) = value else {
            return Err(Error::InvalidMapping {
                property: self.property.clone(),
                found: format!("{} value for name_list hook", json_type_name(value)),
            });
        };

        let entries = names.iter().map(|name| json!({ "name": name })).collect();
        path::bury(&self.path, Value::Array(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert!(builtin("name_list", "initiators", "initiators").is_some());
        assert!(builtin("ports", "ports", "ports").is_none());
    }

    #[test]
    fn test_reads_names() {
        let hook = NameList::new("initiators", "initiators");
        let doc = json!({
            "name": "web",
            "initiators": [{"name": "iqn.a", "comment": "x"}, {"name": "iqn.b"}]
        });
        assert_eq!(
            hook.from_json(&doc).unwrap(),
            Some(json!(["iqn.a", "iqn.b"]))
        );
    }

    #[test]
    fn test_missing_list_reads_as_none() {
        let hook = NameList::new("initiators", "initiators");
        assert_eq!(hook.from_json(&json!({"name": "web"})).unwrap(), None);
    }

    #[test]
    fn test_writes_nested_objects() {
        let hook = NameList::new("ports", "spec.ports");
        assert_eq!(
            hook.to_json(&json!(["a", "b"])).unwrap(),
            json!({"spec": {"ports": [{"name": "a"}, {"name": "b"}]}})
        );
    }

    #[test]
    fn test_rejects_non_list() {
        let hook = NameList::new("initiators", "initiators");
        let err = hook.to_json(&json!("iqn.a")).unwrap_err();
        assert!(matches!(err, Error::InvalidMapping { ref property, .. } if property == "initiators"));
    }
}
