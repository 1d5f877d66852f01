//! Bidirectional mapping between resource properties and JSON fragments.

use crate::error::{Error, Result};
use crate::path;
use crate::schema::{MappingInstruction, ResourceType};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Resource-specific conversion for one property.
///
/// Used for properties whose remote representation cannot be expressed as a
/// single path, e.g. a list of names stored as a list of objects.
pub trait PropertyConverter: Send + Sync {
    /// Extract the property value from the whole remote document.
    ///
    /// `Ok(None)` means "nothing found"; the mapper substitutes `{}`.
    fn from_json(&self, document: &Value) -> Result<Option<Value>>;

    /// Build the JSON fragment to merge into a request body.
    fn to_json(&self, value: &Value) -> Result<Value>;
}

/// Converter assembled from two closures.
pub struct FnConverter<R, W> {
    read: R,
    write: W,
}

impl<R, W> FnConverter<R, W>
where
    R: Fn(&Value) -> Result<Option<Value>> + Send + Sync,
    W: Fn(&Value) -> Result<Value> + Send + Sync,
{
    pub fn new(read: R, write: W) -> Self {
        Self { read, write }
    }
}

impl<R, W> PropertyConverter for FnConverter<R, W>
where
    R: Fn(&Value) -> Result<Option<Value>> + Send + Sync,
    W: Fn(&Value) -> Result<Value> + Send + Sync,
{
    fn from_json(&self, document: &Value) -> Result<Option<Value>> {
        (self.read)(document)
    }

    fn to_json(&self, value: &Value) -> Result<Value> {
        (self.write)(value)
    }
}

/// Converters keyed by property name.
#[derive(Default)]
pub struct ConverterRegistry {
    converters: BTreeMap<String, Box<dyn PropertyConverter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        property: impl Into<String>,
        converter: impl PropertyConverter + 'static,
    ) {
        self.converters.insert(property.into(), Box::new(converter));
    }

    pub fn get(&self, property: &str) -> Option<&dyn PropertyConverter> {
        self.converters.get(property).map(|c| &**c)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.converters.contains_key(property)
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.converters.keys()).finish()
    }
}

/// Applies a resource type's mapping instructions.
pub struct PropertyMapper<'a> {
    resource_type: &'a ResourceType,
}

impl<'a> PropertyMapper<'a> {
    pub fn new(resource_type: &'a ResourceType) -> Self {
        Self { resource_type }
    }

    /// Read a property value out of a remote document.
    pub fn json_to_property(
        &self,
        instruction: &MappingInstruction,
        property: &str,
        document: &Value,
    ) -> Result<Option<Value>> {
        match instruction {
            MappingInstruction::Path(expression) => path::search(expression, document),
            MappingInstruction::Hook => {
                let converter = self.converter(property, "from_json")?;
                let value = converter.from_json(document)?;
                Ok(Some(value.unwrap_or_else(|| Value::Object(Map::new()))))
            }
        }
    }

    /// Build the request-body fragment for a property.
    ///
    /// `changed` is the change calculator's verdict. A path instruction always
    /// contributes a fragment (holding `null` when nothing changed, which
    /// compaction removes later); a hook contributes only when there is a
    /// value to write.
    pub fn property_to_json(
        &self,
        property: &str,
        instruction: &MappingInstruction,
        changed: Option<&Value>,
    ) -> Result<Option<Value>> {
        match instruction {
            MappingInstruction::Path(expression) => {
                let value = changed.cloned().unwrap_or(Value::Null);
                path::bury(expression, value).map(Some)
            }
            MappingInstruction::Hook => {
                let converter = self.converter(property, "to_json")?;
                changed.map(|value| converter.to_json(value)).transpose()
            }
        }
    }

    fn converter(&self, property: &str, direction: &str) -> Result<&'a dyn PropertyConverter> {
        self.resource_type
            .converters()
            .get(property)
            .ok_or_else(|| Error::MissingHook {
                resource: self.resource_type.name().to_string(),
                hook: format!("{property}_{direction}"),
            })
    }
}
