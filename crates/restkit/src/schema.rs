//! Resource type metadata and resource instances.
//!
//! A [`ResourceType`] bundles everything the reconciliation engine needs to
//! know about one kind of remote object: its property schema, URL templates,
//! mapping table, post-only set and identity map. It is built once through
//! [`ResourceTypeBuilder`], which fails fast on inconsistent definitions.

use crate::error::{Error, Result};
use crate::hooks::{DefaultHooks, ResponseHooks};
use crate::identity::{self, IdentityMap};
use crate::mapping::{ConverterRegistry, PropertyConverter};
use crate::template::UriTemplate;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// A declared property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    pub name: String,
    pub required: bool,
    pub default: Option<Value>,
}

impl PropertySpec {
    /// An optional property without default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            default: None,
        }
    }

    /// A required property.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            required: true,
            ..Self::new(name)
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// How a property maps onto the remote JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingInstruction {
    /// Path expression, read with `search` and written with `bury`
    Path(String),
    /// Converter registered for the property
    Hook,
}

/// Property values of one resource instance (desired or current).
///
/// `null` is never stored: setting a property to `null` unsets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceInstance {
    values: Map<String, Value>,
}

impl ResourceInstance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.values.get(property)
    }

    pub fn set(&mut self, property: impl Into<String>, value: Value) {
        let property = property.into();
        if value.is_null() {
            self.values.remove(&property);
        } else {
            self.values.insert(property, value);
        }
    }

    pub fn is_set(&self, property: &str) -> bool {
        self.values.contains_key(property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All values as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ResourceInstance {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut instance = Self::new();
        for (property, value) in iter {
            instance.set(property, value);
        }
        instance
    }
}

/// Everything the engine knows about one kind of REST resource.
pub struct ResourceType {
    name: String,
    collection: UriTemplate,
    document: UriTemplate,
    properties: Vec<PropertySpec>,
    identity_property: String,
    mappings: Vec<(String, MappingInstruction)>,
    post_only: BTreeSet<String>,
    identity: IdentityMap,
    first_element_only: bool,
    converters: ConverterRegistry,
    hooks: Box<dyn ResponseHooks>,
}

impl ResourceType {
    /// Start building a resource type.
    pub fn builder(name: impl Into<String>) -> ResourceTypeBuilder {
        ResourceTypeBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self) -> &UriTemplate {
        &self.collection
    }

    pub fn document(&self) -> &UriTemplate {
        &self.document
    }

    pub fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.property(property).is_some_and(|p| p.required)
    }

    /// Required properties in schema order.
    pub fn required_properties(&self) -> impl Iterator<Item = &PropertySpec> {
        self.properties.iter().filter(|p| p.required)
    }

    /// The property naming a resource instance.
    pub fn identity_property(&self) -> &str {
        &self.identity_property
    }

    /// Mapped properties in declaration order.
    pub fn mappings(&self) -> impl Iterator<Item = (&str, &MappingInstruction)> {
        self.mappings.iter().map(|(p, i)| (p.as_str(), i))
    }

    pub fn instruction(&self, property: &str) -> Option<&MappingInstruction> {
        self.mappings
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, i)| i)
    }

    pub fn is_post_only(&self, property: &str) -> bool {
        self.post_only.contains(property)
    }

    pub fn post_only(&self) -> &BTreeSet<String> {
        &self.post_only
    }

    pub fn identity_map(&self) -> &IdentityMap {
        &self.identity
    }

    /// Number of values needed to address one instance.
    pub fn arity(&self) -> usize {
        self.identity.arity()
    }

    pub fn first_element_only(&self) -> bool {
        self.first_element_only
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn hooks(&self) -> &dyn ResponseHooks {
        self.hooks.as_ref()
    }

    /// Build a desired instance from declared values plus schema defaults.
    pub fn desired<K, I>(&self, values: I) -> Result<ResourceInstance>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut instance = ResourceInstance::new();
        for spec in &self.properties {
            if let Some(default) = &spec.default {
                instance.set(spec.name.clone(), default.clone());
            }
        }
        for (property, value) in values {
            let property = property.into();
            if self.property(&property).is_none() {
                return Err(Error::UnknownProperty {
                    resource: self.name.clone(),
                    property,
                });
            }
            instance.set(property, value);
        }
        Ok(instance)
    }
}

impl fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceType")
            .field("name", &self.name)
            .field("collection", &self.collection.as_str())
            .field("document", &self.document.as_str())
            .field("properties", &self.properties)
            .field("mappings", &self.mappings)
            .field("post_only", &self.post_only)
            .field("identity", &self.identity)
            .field("first_element_only", &self.first_element_only)
            .field("converters", &self.converters)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ResourceType`].
///
/// ```
/// use restkit::{PropertySpec, ResourceType};
///
/// let igroup = ResourceType::builder("igroup")
///     .collection("/api/protocols/san/igroups")
///     .document("/api/protocols/san/igroups?name={name}&svm.name={svm}")
///     .property(PropertySpec::required("name"))
///     .property(PropertySpec::required("svm"))
///     .property(PropertySpec::new("os_type"))
///     .map_path("name", "name")
///     .map_path("svm", "svm.name")
///     .map_path("os_type", "os_type")
///     .post_only("os_type")
///     .build()
///     .unwrap();
///
/// assert_eq!(igroup.arity(), 2);
/// ```
pub struct ResourceTypeBuilder {
    name: String,
    collection: Option<String>,
    document: Option<String>,
    properties: Vec<PropertySpec>,
    identity_property: Option<String>,
    mappings: Vec<(String, MappingInstruction)>,
    post_only: BTreeSet<String>,
    identity: Option<IdentityMap>,
    first_element_only: bool,
    converters: ConverterRegistry,
    hooks: Option<Box<dyn ResponseHooks>>,
}

impl ResourceTypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: None,
            document: None,
            properties: Vec::new(),
            identity_property: None,
            mappings: Vec::new(),
            post_only: BTreeSet::new(),
            identity: None,
            first_element_only: false,
            converters: ConverterRegistry::new(),
            hooks: None,
        }
    }

    /// Collection URL template (listing / creation endpoint).
    pub fn collection(mut self, url: impl Into<String>) -> Self {
        self.collection = Some(url.into());
        self
    }

    /// Document URL template (single-instance endpoint).
    pub fn document(mut self, url: impl Into<String>) -> Self {
        self.document = Some(url.into());
        self
    }

    pub fn property(mut self, spec: PropertySpec) -> Self {
        self.properties.push(spec);
        self
    }

    /// Property naming an instance (defaults to `name`).
    pub fn identity_property(mut self, property: impl Into<String>) -> Self {
        self.identity_property = Some(property.into());
        self
    }

    /// Set the mapping instruction of a property, replacing any earlier one.
    pub fn map(mut self, property: impl Into<String>, instruction: MappingInstruction) -> Self {
        let property = property.into();
        self.mappings.retain(|(p, _)| *p != property);
        self.mappings.push((property, instruction));
        self
    }

    pub fn map_path(self, property: impl Into<String>, path: impl Into<String>) -> Self {
        self.map(property, MappingInstruction::Path(path.into()))
    }

    /// Map a property through a converter.
    pub fn map_hook(
        mut self,
        property: impl Into<String>,
        converter: impl PropertyConverter + 'static,
    ) -> Self {
        let property = property.into();
        self.converters.register(property.clone(), converter);
        self.map(property, MappingInstruction::Hook)
    }

    /// Mark a mapped property as settable at creation only.
    pub fn post_only(mut self, property: impl Into<String>) -> Self {
        self.post_only.insert(property.into());
        self
    }

    /// Explicit identity map, overriding inference from the document template.
    pub fn identity(mut self, map: IdentityMap) -> Self {
        self.identity = Some(map);
        self
    }

    /// Take the first element when the document endpoint answers with a list.
    pub fn first_element_only(mut self, enabled: bool) -> Self {
        self.first_element_only = enabled;
        self
    }

    pub fn hooks(mut self, hooks: impl ResponseHooks + 'static) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    /// Validate the definition and resolve the identity map.
    pub fn build(self) -> Result<ResourceType> {
        let name = self.name;

        let collection = self
            .collection
            .ok_or_else(|| Error::definition(&name, "missing collection URL"))?;
        let document = self
            .document
            .ok_or_else(|| Error::definition(&name, "missing document URL"))?;
        let collection = UriTemplate::parse(&collection)?;
        let document = UriTemplate::parse(&document)?;

        let mut seen = BTreeSet::new();
        for spec in &self.properties {
            if !seen.insert(spec.name.as_str()) {
                return Err(Error::definition(
                    &name,
                    format!("property '{}' declared twice", spec.name),
                ));
            }
        }

        let identity_property = self.identity_property.unwrap_or_else(|| "name".to_string());
        if !seen.contains(identity_property.as_str()) {
            return Err(Error::definition(
                &name,
                format!("identity property '{identity_property}' is not declared"),
            ));
        }

        for (property, _) in &self.mappings {
            if !seen.contains(property.as_str()) {
                return Err(Error::definition(
                    &name,
                    format!("mapped property '{property}' is not declared"),
                ));
            }
        }

        for property in &self.post_only {
            if !self.mappings.iter().any(|(p, _)| p == property) {
                return Err(Error::definition(
                    &name,
                    format!("post-only property '{property}' is not mapped"),
                ));
            }
        }

        let identity = identity::resolve(self.identity.as_ref(), &document)?;
        for (key, property) in identity.iter() {
            if !seen.contains(property) {
                return Err(Error::definition(
                    &name,
                    format!("identity key '{key}' maps to undeclared property '{property}'"),
                ));
            }
        }
        if self.identity.is_some() {
            for variable in document.variables() {
                if !identity.resolves(variable) {
                    return Err(Error::definition(
                        &name,
                        format!("template variable '{variable}' is not in the identity map"),
                    ));
                }
            }
        }

        log::debug!(
            "Built resource type '{}' (arity {}, {} mapped properties)",
            name,
            identity.arity(),
            self.mappings.len()
        );

        Ok(ResourceType {
            name,
            collection,
            document,
            properties: self.properties,
            identity_property,
            mappings: self.mappings,
            post_only: self.post_only,
            identity,
            first_element_only: self.first_element_only,
            converters: self.converters,
            hooks: self.hooks.unwrap_or_else(|| Box::new(DefaultHooks)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> ResourceTypeBuilder {
        ResourceType::builder("igroup")
            .collection("/api/protocols/san/igroups")
            .document("/api/protocols/san/igroups?name={name}&svm.name={svm}")
            .property(PropertySpec::required("name"))
            .property(PropertySpec::required("svm"))
            .property(PropertySpec::new("os_type").with_default(json!("linux")))
            .map_path("name", "name")
            .map_path("svm", "svm.name")
            .map_path("os_type", "os_type")
    }

    #[test]
    fn test_build_infers_identity() {
        let igroup = base().post_only("os_type").build().unwrap();
        assert_eq!(igroup.arity(), 2);
        assert_eq!(igroup.identity_map().get("svm.name"), Some("svm"));
        assert!(igroup.is_post_only("os_type"));
        assert!(igroup.is_required("name"));
        assert!(!igroup.is_required("os_type"));
        assert_eq!(igroup.identity_property(), "name");
    }

    #[test]
    fn test_post_only_must_be_mapped() {
        let err = base()
            .property(PropertySpec::new("comment"))
            .post_only("comment")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("post-only property 'comment'"));
    }

    #[test]
    fn test_mapping_must_name_declared_property() {
        let err = base().map_path("ghost", "ghost").build().unwrap_err();
        assert!(err.to_string().contains("'ghost'"));
    }

    #[test]
    fn test_remapping_replaces_instruction() {
        let igroup = base().map_path("os_type", "os.type").build().unwrap();
        assert_eq!(
            igroup.instruction("os_type"),
            Some(&MappingInstruction::Path("os.type".into()))
        );
        assert_eq!(igroup.mappings().count(), 3);
    }

    #[test]
    fn test_path_variable_must_be_a_property() {
        let err = ResourceType::builder("interface")
            .collection("/api/network/ip/interfaces")
            .document("/api/network/ip/interfaces/{uuid}")
            .property(PropertySpec::required("name"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("undeclared property 'uuid'"));
    }

    #[test]
    fn test_explicit_identity_must_cover_template() {
        let err = base()
            .identity([("name", "name")].into_iter().collect())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("'svm'"));
    }

    #[test]
    fn test_definition_errors_fail_fast() {
        // `fields=` has no variable to pair with, so inference must refuse.
        let err = base()
            .document("/api/protocols/san/igroups?name={name}&fields=")
            .build()
            .unwrap_err();
        assert!(matches!(
            &err,
            Error::ExplicitIdentityRequired { parameter, .. } if parameter == "fields"
        ));
        assert_eq!(err.category(), crate::ErrorCategory::Definition);
    }

    #[test]
    fn test_desired_applies_defaults_and_rejects_unknown() {
        let igroup = base().build().unwrap();
        let desired = igroup
            .desired([("name", json!("web")), ("svm", json!("vs0"))])
            .unwrap();
        assert_eq!(desired.get("os_type"), Some(&json!("linux")));

        let overridden = igroup.desired([("os_type", json!("windows"))]).unwrap();
        assert_eq!(overridden.get("os_type"), Some(&json!("windows")));

        let err = igroup.desired([("color", json!("red"))]).unwrap_err();
        assert!(matches!(err, Error::UnknownProperty { .. }));
    }

    #[test]
    fn test_instance_null_unsets() {
        let mut instance: ResourceInstance = [("a", json!(1))].into_iter().collect();
        assert!(instance.is_set("a"));
        instance.set("a", Value::Null);
        assert!(!instance.is_set("a"));
        assert!(instance.is_empty());
    }
}
