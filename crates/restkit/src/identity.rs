//! Identity resolution: which URL template variables identify a resource.
//!
//! Most REST resources identify themselves either by path segments
//! (`/api/v1/{address}`) or by query parameters
//! (`/api/protocols/san/igroups?name={name}&svm.name={svm}`). The identity
//! map is inferred from the document template in those cases; resource types
//! with irregular keys supply an explicit map instead.

use crate::error::{Error, Result};
use crate::schema::ResourceInstance;
use crate::template::{UriTemplate, template_value};
use serde_json::Value;
use std::collections::HashMap;

/// Ordered mapping from identity key (template variable or query parameter
/// name) to resource property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
    entries: Vec<(String, String)>,
}

impl IdentityMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the property for `key`.
    pub fn insert(&mut self, key: impl Into<String>, property: impl Into<String>) {
        let key = key.into();
        let property = property.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = property,
            None => self.entries.push((key, property)),
        }
    }

    /// Property bound to `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, p)| p.as_str())
    }

    /// Iterate `(key, property)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), p.as_str()))
    }

    /// Number of values needed to address one resource instance.
    pub fn arity(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identity key → desired value, skipping unset properties.
    pub fn values<'a>(&'a self, resource: &'a ResourceInstance) -> Vec<(&'a str, &'a Value)> {
        self.iter()
            .filter_map(|(key, property)| resource.get(property).map(|value| (key, value)))
            .collect()
    }

    /// Template variable → string value for URL expansion.
    ///
    /// A variable resolves through the identity key of the same name first,
    /// then through a property of the same name.
    pub fn expansion_vars(
        &self,
        template: &UriTemplate,
        resource: &ResourceInstance,
    ) -> HashMap<String, String> {
        template
            .variables()
            .iter()
            .filter_map(|variable| {
                let property = self.get(variable).unwrap_or(variable);
                resource
                    .get(property)
                    .and_then(template_value)
                    .map(|value| (variable.clone(), value))
            })
            .collect()
    }

    /// Whether `variable` resolves to some property of this map.
    pub fn resolves(&self, variable: &str) -> bool {
        self.get(variable).is_some() || self.iter().any(|(_, property)| property == variable)
    }
}

impl<K: Into<String>, P: Into<String>> FromIterator<(K, P)> for IdentityMap {
    fn from_iter<I: IntoIterator<Item = (K, P)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, property) in iter {
            map.insert(key, property);
        }
        map
    }
}

/// How a document template selects one resource instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// No template variables: a singleton document
    Singleton,
    /// Identity carried in path segments
    Path,
    /// Identity carried in query parameters
    Query,
}

/// Determine the selection mode of a document template.
///
/// A template whose path portion still holds expressions cannot parse as a
/// URI, which marks it as path-based; a literal path with a query string is
/// query-based.
pub fn selection_mode(template: &UriTemplate) -> Result<SelectionMode> {
    if template.variables().is_empty() {
        return Ok(SelectionMode::Singleton);
    }
    if template.has_path_expressions() {
        return Ok(SelectionMode::Path);
    }
    if template.query().is_some_and(|q| !q.is_empty()) {
        return Ok(SelectionMode::Query);
    }
    Err(Error::UnknownSelectionMode {
        template: template.as_str().to_string(),
    })
}

/// Resolve the identity map of a resource type.
///
/// An explicit map is used verbatim. Otherwise the map is inferred from the
/// document template: path variables map to properties of the same name;
/// query parameter names pair positionally with the template variables.
pub fn resolve(explicit: Option<&IdentityMap>, document: &UriTemplate) -> Result<IdentityMap> {
    if let Some(map) = explicit {
        return Ok(map.clone());
    }

    match selection_mode(document)? {
        SelectionMode::Singleton => Ok(IdentityMap::new()),
        SelectionMode::Path => Ok(document
            .variables()
            .iter()
            .map(|variable| (variable.clone(), variable.clone()))
            .collect()),
        SelectionMode::Query => {
            let parameters = query_parameters(document)?;
            // Parameters without a variable at the same position are metadata.
            Ok(parameters
                .into_iter()
                .zip(document.variables())
                .map(|(parameter, variable)| (parameter, variable.clone()))
                .collect())
        }
    }
}

/// Query parameter names in literal order.
fn query_parameters(document: &UriTemplate) -> Result<Vec<String>> {
    let query = document.query().unwrap_or_default();
    let mut names = Vec::new();

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        if value.is_empty() {
            return Err(Error::ExplicitIdentityRequired {
                template: document.as_str().to_string(),
                parameter: name.to_string(),
            });
        }
        names.push(name.to_string());
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(raw: &str) -> UriTemplate {
        UriTemplate::parse(raw).unwrap()
    }

    #[test]
    fn test_path_based_inference() {
        let map = resolve(None, &template("/api/v1/{address}")).unwrap();
        assert_eq!(map.iter().collect::<Vec<_>>(), [("address", "address")]);
        assert_eq!(map.arity(), 1);
    }

    #[test]
    fn test_query_based_inference() {
        let map = resolve(
            None,
            &template("/api/protocols/san/igroups?name={name}&svm.name={svm}"),
        )
        .unwrap();
        assert_eq!(
            map.iter().collect::<Vec<_>>(),
            [("name", "name"), ("svm.name", "svm")]
        );
        assert_eq!(map.arity(), 2);
    }

    #[test]
    fn test_singleton_has_arity_zero() {
        let document = template("/api/cluster");
        assert_eq!(selection_mode(&document).unwrap(), SelectionMode::Singleton);
        let map = resolve(None, &document).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.arity(), 0);
    }

    #[test]
    fn test_explicit_map_wins() {
        let explicit: IdentityMap = [("uuid", "id")].into_iter().collect();
        let map = resolve(Some(&explicit), &template("/api/v1/{uuid}")).unwrap();
        assert_eq!(map, explicit);
    }

    #[test]
    fn test_path_mode_wins_over_query() {
        let document = template("/api/svm/{svm}/things?name={name}");
        assert_eq!(selection_mode(&document).unwrap(), SelectionMode::Path);
        let map = resolve(None, &document).unwrap();
        assert_eq!(map.arity(), 2);
    }

    #[test]
    fn test_query_parameter_without_value_requires_explicit_map() {
        let err = resolve(None, &template("/api/things?name={name}&fields=")).unwrap_err();
        assert!(matches!(
            err,
            Error::ExplicitIdentityRequired { ref parameter, .. } if parameter == "fields"
        ));
    }

    #[test]
    fn test_unknown_selection_mode() {
        let err = resolve(None, &template("/api/things#{section}")).unwrap_err();
        assert!(matches!(err, Error::UnknownSelectionMode { .. }));
    }

    #[test]
    fn test_unpaired_query_parameter_is_skipped() {
        let map = resolve(
            None,
            &template("/api/things?name={name}&return_records=true"),
        )
        .unwrap();
        assert_eq!(map.iter().collect::<Vec<_>>(), [("name", "name")]);
    }

    #[test]
    fn test_expansion_vars_resolve_by_key_then_property() {
        let document = template("/api/protocols/san/igroups?name={name}&svm.name={svm}");
        let map = resolve(None, &document).unwrap();
        let resource: ResourceInstance = [("name", json!("web")), ("svm", json!("vs0"))]
            .into_iter()
            .collect();

        let vars = map.expansion_vars(&document, &resource);
        assert_eq!(
            document.expand(&vars),
            "/api/protocols/san/igroups?name=web&svm.name=vs0"
        );
        assert!(map.resolves("svm"));
        assert!(map.resolves("svm.name"));
        assert!(!map.resolves("uuid"));
    }

    #[test]
    fn test_values_skip_unset_properties() {
        let map: IdentityMap = [("name", "name"), ("svm.name", "svm")].into_iter().collect();
        let resource: ResourceInstance = [("name", json!("web"))].into_iter().collect();
        assert_eq!(map.values(&resource), [("name", &json!("web"))]);
    }
}
