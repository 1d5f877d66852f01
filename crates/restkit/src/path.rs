//! Path expressions over JSON documents.
//!
//! A path expression addresses a location in a nested document with dotted
//! field access and bracketed array indexing, e.g. `svm.name` or
//! `records[0].uuid`. Field names containing dots can be quoted:
//! `"svm.name".uuid`.
//!
//! [`search`] reads a value at a path; [`bury`] builds the nested tree that
//! a value at a (dotted) path would live in.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// One step of a parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(i64),
}

/// Evaluate a path expression against a document.
///
/// Returns `Ok(None)` when the path does not exist or resolves to `null`.
/// Negative indices count from the end of an array.
///
/// ```
/// use restkit::path::search;
/// use serde_json::json;
///
/// let doc = json!({"svm": {"name": "vs0"}, "records": [{"uuid": "a"}, {"uuid": "b"}]});
/// assert_eq!(search("svm.name", &doc).unwrap(), Some(json!("vs0")));
/// assert_eq!(search("records[-1].uuid", &doc).unwrap(), Some(json!("b")));
/// assert_eq!(search("svm.missing", &doc).unwrap(), None);
/// ```
pub fn search(expression: &str, document: &Value) -> Result<Option<Value>> {
    let segments = parse(expression)?;
    let mut current = document;

    for segment in &segments {
        let next = match (segment, current) {
            (Segment::Field(name), Value::Object(map)) => map.get(name),
            (Segment::Index(index), Value::Array(items)) => {
                let len = items.len() as i64;
                let resolved = if *index < 0 { len + index } else { *index };
                if (0..len).contains(&resolved) {
                    items.get(resolved as usize)
                } else {
                    None
                }
            }
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }

    if current.is_null() {
        Ok(None)
    } else {
        Ok(Some(current.clone()))
    }
}

/// Build a nested single-branch tree holding `value` at `path`.
///
/// The path is split on `.` only; brackets and quotes are not interpreted.
///
/// ```
/// use restkit::path::bury;
/// use serde_json::json;
///
/// assert_eq!(bury("a.b.c", json!(5)).unwrap(), json!({"a": {"b": {"c": 5}}}));
/// ```
pub fn bury(path: &str, value: Value) -> Result<Value> {
    if path.is_empty() {
        return Err(Error::invalid_path(path, "empty path"));
    }

    path.rsplit('.').try_fold(value, |inner, segment| {
        if segment.is_empty() {
            return Err(Error::invalid_path(path, "empty segment"));
        }
        let mut map = Map::new();
        map.insert(segment.to_string(), inner);
        Ok(Value::Object(map))
    })
}

/// Parse a path expression into segments.
fn parse(expression: &str) -> Result<Vec<Segment>> {
    if expression.trim().is_empty() {
        return Err(Error::invalid_path(expression, "empty expression"));
    }

    let mut segments = Vec::new();
    let mut rest = expression;
    let mut expect_field = true;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('[') {
            let end = after
                .find(']')
                .ok_or_else(|| Error::invalid_path(expression, "unclosed '['"))?;
            let index = after[..end]
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::invalid_path(expression, "array index must be an integer"))?;
            segments.push(Segment::Index(index));
            rest = &after[end + 1..];
            expect_field = false;
            continue;
        }

        if !expect_field {
            rest = rest
                .strip_prefix('.')
                .ok_or_else(|| Error::invalid_path(expression, "expected '.' or '['"))?;
            if rest.is_empty() {
                return Err(Error::invalid_path(expression, "trailing '.'"));
            }
            expect_field = true;
            continue;
        }

        let field = if let Some(after) = rest.strip_prefix('"') {
            let end = after
                .find('"')
                .ok_or_else(|| Error::invalid_path(expression, "unterminated quoted field"))?;
            rest = &after[end + 1..];
            &after[..end]
        } else {
            let end = rest.find(['.', '[']).unwrap_or(rest.len());
            let field = &rest[..end];
            if field.is_empty() {
                return Err(Error::invalid_path(expression, "empty segment"));
            }
            rest = &rest[end..];
            field
        };
        segments.push(Segment::Field(field.to_string()));
        expect_field = false;
    }

    Ok(segments)
}
