//! Reconciliation driver: read, decide, write.
//!
//! One pass walks `START → LOADED → {EXISTS, ABSENT} → {CONFIGURED, DELETED,
//! NOOP}`:
//!
//! 1. Required desired properties are copied onto a fresh current shell.
//! 2. The collection is fetched; empty data means ABSENT.
//! 3. The document is fetched; failures and empty data mean ABSENT.
//! 4. Otherwise every mapped property is read into the current resource.
//! 5. `configure` PATCHes the changed properties of an existing resource, or
//!    POSTs a full body to the collection; `delete` DELETEs an existing one.

use crate::change::ChangeCalculator;
use crate::error::Result;
use crate::mapping::PropertyMapper;
use crate::merge::{deep_compact, deep_merge, is_blank};
use crate::path::bury;
use crate::schema::{ResourceInstance, ResourceType};
use crate::transport::{Method, Response, Transport};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// What the caller wants done with a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Create or update
    #[default]
    Configure,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Configure => f.write_str("configure"),
            Action::Delete => f.write_str("delete"),
        }
    }
}

/// Observed state of one resource after the read phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Current resource. Holds at least the required desired properties.
    pub current: ResourceInstance,
    /// Whether the remote document exists
    pub exists: bool,
    pub collection_url: String,
    pub document_url: String,
}

/// The single write a pass would perform.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedChange {
    /// POST to the collection URL
    Create { url: String, body: Value },
    /// PATCH to the document URL
    Update { url: String, body: Value },
    /// DELETE on the document URL
    Delete { url: String },
    /// Nothing to send
    NoOp { reason: String },
}

impl PlannedChange {
    pub fn method(&self) -> Option<Method> {
        match self {
            PlannedChange::Create { .. } => Some(Method::Post),
            PlannedChange::Update { .. } => Some(Method::Patch),
            PlannedChange::Delete { .. } => Some(Method::Delete),
            PlannedChange::NoOp { .. } => None,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            PlannedChange::Create { body, .. } | PlannedChange::Update { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, PlannedChange::NoOp { .. })
    }
}

impl fmt::Display for PlannedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedChange::Create { url, .. } => write!(f, "POST {url}"),
            PlannedChange::Update { url, .. } => write!(f, "PATCH {url}"),
            PlannedChange::Delete { url } => write!(f, "DELETE {url}"),
            PlannedChange::NoOp { reason } => write!(f, "no change ({reason})"),
        }
    }
}

/// Result of an executed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Deleted,
    NoOp,
}

impl Outcome {
    pub fn changed(&self) -> bool {
        !matches!(self, Outcome::NoOp)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Created => "created",
            Outcome::Updated => "updated",
            Outcome::Deleted => "deleted",
            Outcome::NoOp => "unchanged",
        };
        f.write_str(label)
    }
}

/// Reconciles one desired resource against a REST API.
pub struct Reconciler<'a> {
    transport: &'a dyn Transport,
    resource_type: &'a ResourceType,
    desired: &'a ResourceInstance,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        resource_type: &'a ResourceType,
        desired: &'a ResourceInstance,
    ) -> Self {
        Self {
            transport,
            resource_type,
            desired,
        }
    }

    /// Collection URL, expanded against the desired resource.
    pub fn collection_url(&self) -> String {
        self.expand(self.resource_type.collection())
    }

    /// Document URL, expanded against the desired resource.
    pub fn document_url(&self) -> String {
        self.expand(self.resource_type.document())
    }

    fn expand(&self, template: &crate::template::UriTemplate) -> String {
        let vars = self
            .resource_type
            .identity_map()
            .expansion_vars(template, self.desired);
        template.expand(&vars)
    }

    /// Read phase: fetch collection and document, build the current resource.
    ///
    /// A failing collection read propagates; a failing document read counts
    /// as "does not exist".
    pub fn load(&self) -> Result<Snapshot> {
        let mut snapshot = Snapshot {
            current: self.shell(),
            exists: false,
            collection_url: self.collection_url(),
            document_url: self.document_url(),
        };
        let name = self.resource_type.name();

        let collection = self.read(&snapshot.collection_url)?;
        if is_blank(&collection.data) {
            log::debug!("{name}: collection {} is empty", snapshot.collection_url);
            return Ok(snapshot);
        }

        let document = match self.read(&snapshot.document_url) {
            Ok(response) => response.data,
            Err(err) => {
                log::debug!("{name}: no document at {}: {err}", snapshot.document_url);
                return Ok(snapshot);
            }
        };

        let document = match document {
            Value::Array(items) if self.resource_type.first_element_only() => {
                items.into_iter().next().unwrap_or(Value::Null)
            }
            other => other,
        };
        if is_blank(&document) {
            log::debug!("{name}: document {} is empty", snapshot.document_url);
            return Ok(snapshot);
        }

        let mapper = PropertyMapper::new(self.resource_type);
        for (property, instruction) in self.resource_type.mappings() {
            if let Some(value) = mapper.json_to_property(instruction, property, &document)? {
                snapshot.current.set(property, value);
            }
        }
        snapshot.exists = true;
        log::debug!("{name}: found at {}", snapshot.document_url);

        Ok(snapshot)
    }

    /// Decide phase: compute the one write `action` needs, without sending it.
    pub fn plan(&self, action: Action, snapshot: &Snapshot) -> Result<PlannedChange> {
        let change = match (action, snapshot.exists) {
            (Action::Configure, true) => {
                let body = if self.has_patchable_change(&snapshot.current) {
                    self.update_body(&snapshot.current)?
                } else {
                    Value::Null
                };
                if is_blank(&body) {
                    PlannedChange::NoOp {
                        reason: "up to date".to_string(),
                    }
                } else {
                    PlannedChange::Update {
                        url: snapshot.document_url.clone(),
                        body,
                    }
                }
            }
            (Action::Configure, false) => PlannedChange::Create {
                url: snapshot.collection_url.clone(),
                body: self.create_body()?,
            },
            (Action::Delete, true) => PlannedChange::Delete {
                url: snapshot.document_url.clone(),
            },
            (Action::Delete, false) => PlannedChange::NoOp {
                reason: "does not exist".to_string(),
            },
        };
        Ok(change)
    }

    /// Write phase: send a planned change.
    pub fn execute(&self, change: &PlannedChange) -> Result<Outcome> {
        let name = self.resource_type.name();
        match change {
            PlannedChange::Create { url, body } => {
                self.write(Method::Post, url, body)?;
                log::info!("{name}: created via {url}");
                Ok(Outcome::Created)
            }
            PlannedChange::Update { url, body } => {
                self.write(Method::Patch, url, body)?;
                log::info!("{name}: updated via {url}");
                Ok(Outcome::Updated)
            }
            PlannedChange::Delete { url } => {
                self.write(Method::Delete, url, &Value::Null)?;
                log::info!("{name}: deleted via {url}");
                Ok(Outcome::Deleted)
            }
            PlannedChange::NoOp { reason } => {
                log::info!("{name}: skipped, {reason}");
                Ok(Outcome::NoOp)
            }
        }
    }

    /// Run one full pass.
    pub fn reconcile(&self, action: Action) -> Result<Outcome> {
        let snapshot = self.load()?;
        let change = self.plan(action, &snapshot)?;
        self.execute(&change)
    }

    fn shell(&self) -> ResourceInstance {
        self.resource_type
            .required_properties()
            .filter_map(|spec| {
                self.desired
                    .get(&spec.name)
                    .map(|value| (spec.name.clone(), value.clone()))
            })
            .collect()
    }

    fn read(&self, url: &str) -> Result<Response> {
        let response = self.transport.get(url)?;
        Ok(self.resource_type.hooks().postprocess(response))
    }

    fn write(&self, method: Method, url: &str, body: &Value) -> Result<Response> {
        log::debug!("{}: {method} {url}", self.resource_type.name());
        match self.transport.send(method, url, body) {
            Ok(response) => Ok(self.resource_type.hooks().postprocess(response)),
            Err(err) => self.resource_type.hooks().handle_error(err),
        }
    }

    /// Whether a mapped property that a PATCH may change differs from the server.
    ///
    /// Required properties ride along in the body with their current values,
    /// so on their own they never call for an update.
    fn has_patchable_change(&self, current: &ResourceInstance) -> bool {
        let calc = ChangeCalculator::new(self.resource_type, self.desired, Some(current));
        self.resource_type.mappings().any(|(property, _)| {
            !self.resource_type.is_required(property)
                && !self.resource_type.is_post_only(property)
                && calc.changed_value(property).is_some()
        })
    }

    fn update_body(&self, current: &ResourceInstance) -> Result<Value> {
        let calc = ChangeCalculator::new(self.resource_type, self.desired, Some(current));
        let properties = self
            .resource_type
            .mappings()
            .filter(|(property, _)| !self.resource_type.is_post_only(property));
        let body = self.assemble(&calc, properties)?;
        Ok(deep_compact(body))
    }

    fn create_body(&self) -> Result<Value> {
        let calc = ChangeCalculator::new(self.resource_type, self.desired, None);
        let mut body = self.assemble(&calc, self.resource_type.mappings())?;

        // Identity values travel in the URL template and in the body.
        for (key, value) in self.resource_type.identity_map().values(self.desired) {
            body = deep_merge(body, bury(key, value.clone())?)?;
        }
        Ok(deep_compact(body))
    }

    fn assemble<'p>(
        &self,
        calc: &ChangeCalculator<'_>,
        properties: impl Iterator<Item = (&'p str, &'p crate::schema::MappingInstruction)>,
    ) -> Result<Value> {
        let mapper = PropertyMapper::new(self.resource_type);
        let mut body = Value::Object(Map::new());
        for (property, instruction) in properties {
            if let Some(fragment) =
                mapper.property_to_json(property, instruction, calc.changed_value(property))?
            {
                body = deep_merge(body, fragment)?;
            }
        }
        Ok(body)
    }
}
