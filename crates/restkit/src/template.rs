//! RFC 6570 URI templates (simple string expansion).
//!
//! Resource types describe their endpoints as templates such as
//! `/api/v1/{address}` or `/api/widgets?name={name}&group={group}`. Only
//! level-1 expressions (`{var}`, optionally `{a,b}`) are supported, which is
//! all that identity resolution needs.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("valid expression regex"));

static VARIABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.]*$").expect("valid name regex"));

/// A parsed URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    variables: Vec<String>,
}

impl UriTemplate {
    /// Parse a template, collecting its variables in declaration order.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut variables: Vec<String> = Vec::new();

        for caps in EXPRESSION.captures_iter(raw) {
            let expression = &caps[1];
            if expression.is_empty() {
                return Err(template_error(raw, "empty expression '{}'"));
            }
            for name in expression.split(',') {
                let name = name.trim();
                if !VARIABLE_NAME.is_match(name) {
                    return Err(template_error(
                        raw,
                        format!("unsupported expression '{{{expression}}}'"),
                    ));
                }
                if !variables.iter().any(|v| v == name) {
                    variables.push(name.to_string());
                }
            }
        }

        let literal = EXPRESSION.replace_all(raw, "");
        if literal.contains(['{', '}']) {
            return Err(template_error(raw, "unbalanced braces"));
        }

        Ok(Self {
            raw: raw.to_string(),
            variables,
        })
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Variable names in declaration order, without duplicates.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Portion before the query string or fragment.
    pub fn path(&self) -> &str {
        let end = self.raw.find(['?', '#']).unwrap_or(self.raw.len());
        &self.raw[..end]
    }

    /// Portion after `?` (without any fragment), if present.
    pub fn query(&self) -> Option<&str> {
        self.raw
            .split_once('?')
            .map(|(_, query)| query.split_once('#').map_or(query, |(q, _)| q))
    }

    /// Whether the path portion still contains template expressions.
    pub fn has_path_expressions(&self) -> bool {
        EXPRESSION.is_match(self.path())
    }

    /// Expand the template.
    ///
    /// Values are percent-encoded; undefined variables expand to nothing.
    pub fn expand(&self, vars: &HashMap<String, String>) -> String {
        EXPRESSION
            .replace_all(&self.raw, |caps: &regex::Captures<'_>| {
                caps[1]
                    .split(',')
                    .filter_map(|name| vars.get(name.trim()))
                    .map(|value| encode(value))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .into_owned()
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// String form of a property value for template expansion.
///
/// Scalars render as-is, arrays as comma-joined scalars; `null` and objects
/// are undefined.
pub fn template_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(template_value).collect();
            (!parts.is_empty()).then(|| parts.join(","))
        }
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn template_error(raw: &str, message: impl Into<String>) -> Error {
    Error::Template {
        template: raw.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_variables_in_declaration_order() {
        let template =
            UriTemplate::parse("/api/protocols/san/igroups?name={name}&svm.name={svm}").unwrap();
        assert_eq!(template.variables(), ["name", "svm"]);
        assert_eq!(template.path(), "/api/protocols/san/igroups");
        assert_eq!(template.query(), Some("name={name}&svm.name={svm}"));
        assert!(!template.has_path_expressions());
    }

    #[test]
    fn test_path_expressions() {
        let template = UriTemplate::parse("/api/v1/{address}").unwrap();
        assert_eq!(template.variables(), ["address"]);
        assert!(template.has_path_expressions());
        assert_eq!(template.query(), None);
    }

    #[test]
    fn test_no_variables() {
        let template = UriTemplate::parse("/api/cluster").unwrap();
        assert!(template.variables().is_empty());
        assert_eq!(template.expand(&HashMap::new()), "/api/cluster");
    }

    #[test]
    fn test_expand_percent_encodes() {
        let template = UriTemplate::parse("/api/v1/{address}?svm.name={svm}").unwrap();
        let url = template.expand(&vars(&[("address", "10.0.0.1/24"), ("svm", "vs 0")]));
        assert_eq!(url, "/api/v1/10.0.0.1%2F24?svm.name=vs%200");
    }

    #[test]
    fn test_expand_undefined_is_empty() {
        let template = UriTemplate::parse("/api/things?name={name}").unwrap();
        assert_eq!(template.expand(&HashMap::new()), "/api/things?name=");
    }

    #[test]
    fn test_expand_list_expression() {
        let template = UriTemplate::parse("/api/{a,b}").unwrap();
        assert_eq!(template.variables(), ["a", "b"]);
        assert_eq!(template.expand(&vars(&[("a", "x"), ("b", "y")])), "/api/x,y");
    }

    #[test]
    fn test_parse_errors() {
        assert!(UriTemplate::parse("/api/{}").is_err());
        assert!(UriTemplate::parse("/api/{?name}").is_err());
        assert!(UriTemplate::parse("/api/{name").is_err());
        assert!(UriTemplate::parse("/api/name}").is_err());
    }

    #[test]
    fn test_template_value() {
        assert_eq!(template_value(&json!("x")), Some("x".to_string()));
        assert_eq!(template_value(&json!(7)), Some("7".to_string()));
        assert_eq!(template_value(&json!(true)), Some("true".to_string()));
        assert_eq!(template_value(&json!(["a", "b"])), Some("a,b".to_string()));
        assert_eq!(template_value(&json!(null)), None);
        assert_eq!(template_value(&json!({"a": 1})), None);
    }
}
