use crate::resource::RestResource;
use crate::resource::converters::{self, BUILTIN_HOOKS};
use anyhow::{Context, Result, anyhow};
use restkit::error::json_type_name;
use restkit::{
    Action, EnvelopeHooks, Error as RestError, HttpTransport, IdentityMap, PropertySpec,
    ResourceType, Transport,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Manifest Schema
// ============================================================================

/// A restsync manifest: where the API lives, what its resources look like,
/// and which resources should exist
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub endpoint: Endpoint,

    /// Resource types keyed by name
    #[serde(default)]
    pub types: BTreeMap<String, TypeDef>,

    /// Desired resources, converged in order
    #[serde(default)]
    pub resources: Vec<ResourceDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Endpoint {
    /// Base URL that collection and document paths are joined onto
    pub base_url: String,

    /// Per-request timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// How one kind of REST object is addressed and mapped
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDef {
    /// URI template listing all objects of the type
    pub collection: String,

    /// URI template addressing one object
    pub document: String,

    #[serde(default)]
    pub identity_property: Option<String>,

    /// Treat a list response from the document URL as its first element
    #[serde(default)]
    pub first_element_only: bool,

    /// Properties that can only be set when the object is created
    #[serde(default)]
    pub post_only: Vec<String>,

    /// Explicit identity map: identity key -> property
    #[serde(default)]
    pub identity: Option<BTreeMap<String, String>>,

    /// Unwrap every response body from this key
    #[serde(default)]
    pub records_key: Option<String>,

    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyDef {
    #[serde(default)]
    pub required: bool,

    /// A path string or a `{ hook = "...", path = "..." }` table
    #[serde(default)]
    pub mapping: Option<Value>,

    #[serde(default)]
    pub default: Option<Value>,
}

/// One desired resource
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceDecl {
    #[serde(rename = "type")]
    pub resource_type: String,

    #[serde(default)]
    pub action: Action,

    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// A parsed `mapping` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingDef {
    Path(String),
    Hook { hook: String, path: String },
}

impl MappingDef {
    /// Parse a `mapping` value declared for `property`
    ///
    /// The hook path defaults to the property name.
    pub fn parse(property: &str, value: &Value) -> restkit::Result<Self> {
        let invalid = |found: String| RestError::InvalidMapping {
            property: property.to_string(),
            found,
        };

        match value {
            Value::String(path) => Ok(Self::Path(path.clone())),
            Value::Object(table) => {
                let hook = match table.get("hook") {
                    Some(Value::String(hook)) => hook.clone(),
                    Some(other) => {
                        return Err(invalid(format!("{} hook name", json_type_name(other))));
                    }
                    None => return Err(invalid("table without `hook`".to_string())),
                };
                let path = match table.get("path") {
                    Some(Value::String(path)) => path.clone(),
                    Some(other) => {
                        return Err(invalid(format!("{} hook path", json_type_name(other))));
                    }
                    None => property.to_string(),
                };
                Ok(Self::Hook { hook, path })
            }
            other => Err(invalid(json_type_name(other).to_string())),
        }
    }
}

impl Manifest {
    /// Load a manifest from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid manifest: {}", path.display()))
    }

    /// Parse manifest TOML
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML format in manifest")
    }

    /// HTTP transport for the endpoint
    pub fn transport(&self) -> HttpTransport {
        match self.endpoint.timeout_secs {
            Some(secs) => {
                HttpTransport::with_timeout(&self.endpoint.base_url, Duration::from_secs(secs))
            }
            None => HttpTransport::new(&self.endpoint.base_url),
        }
    }

    /// Build and validate every resource type
    pub fn build_types(&self) -> Result<BTreeMap<String, Arc<ResourceType>>> {
        self.types
            .iter()
            .map(|(name, def)| {
                let resource_type = def
                    .build(name)
                    .with_context(|| format!("Invalid resource type '{name}'"))?;
                Ok((name.clone(), Arc::new(resource_type)))
            })
            .collect()
    }

    /// Resources bound to the endpoint's HTTP transport
    pub fn resources(&self) -> Result<Vec<RestResource>> {
        self.resources_with(Arc::new(self.transport()))
    }

    /// Resources bound to the given transport
    pub fn resources_with(&self, transport: Arc<dyn Transport>) -> Result<Vec<RestResource>> {
        let types = self.build_types()?;

        self.resources
            .iter()
            .enumerate()
            .map(|(index, decl)| {
                let resource_type = types.get(&decl.resource_type).with_context(|| {
                    format!(
                        "resources[{index}]: unknown type '{}'",
                        decl.resource_type
                    )
                })?;
                RestResource::new(
                    Arc::clone(resource_type),
                    Arc::clone(&transport),
                    decl.properties.clone(),
                    decl.action,
                )
                .with_context(|| format!("resources[{index}] ({})", decl.resource_type))
            })
            .collect()
    }
}

impl TypeDef {
    fn build(&self, name: &str) -> Result<ResourceType> {
        let mut builder = ResourceType::builder(name)
            .collection(self.collection.as_str())
            .document(self.document.as_str())
            .first_element_only(self.first_element_only);

        if let Some(property) = &self.identity_property {
            builder = builder.identity_property(property.as_str());
        }

        for (property, def) in &self.properties {
            let mut spec = if def.required {
                PropertySpec::required(property.as_str())
            } else {
                PropertySpec::new(property.as_str())
            };
            if let Some(default) = &def.default {
                spec = spec.with_default(default.clone());
            }
            builder = builder.property(spec);

            let Some(mapping) = &def.mapping else {
                continue;
            };
            builder = match MappingDef::parse(property, mapping)? {
                MappingDef::Path(path) => builder.map_path(property.as_str(), path),
                MappingDef::Hook { hook, path } => {
                    let converter = converters::builtin(&hook, property, &path).ok_or_else(|| {
                        anyhow!(
                            "property '{property}': unknown hook '{hook}' (available: {})",
                            BUILTIN_HOOKS.join(", ")
                        )
                    })?;
                    builder.map_hook(property.as_str(), converter)
                }
            };
        }

        for property in &self.post_only {
            builder = builder.post_only(property.as_str());
        }

        if let Some(identity) = &self.identity {
            builder = builder.identity(identity.iter().collect::<IdentityMap>());
        }

        if let Some(key) = &self.records_key {
            builder = builder.hooks(EnvelopeHooks::new(key.as_str()));
        }

        Ok(builder.build()?)
    }
}
