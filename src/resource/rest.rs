//! One declared REST object, as a declarative resource

use anyhow::{Context, Result, bail};
use declarative::{ApplyContext, ApplyResult, Resource, ResourceState};
use restkit::template::template_value;
use restkit::{
    Action, Outcome, PlannedChange, Reconciler, ResourceInstance, ResourceType, Snapshot, Transport,
};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex};

/// What a reconciliation pass would observe and do, without writing
#[derive(Debug, Clone)]
pub struct Inspection {
    pub snapshot: Snapshot,
    pub change: PlannedChange,
}

/// A desired REST object of some resource type
pub struct RestResource {
    resource_type: Arc<ResourceType>,
    transport: Arc<dyn Transport>,
    desired: ResourceInstance,
    action: Action,
    id: String,
    /// Change planned by the last state read; the next `apply` sends it.
    planned: Mutex<Option<PlannedChange>>,
}

impl RestResource {
    /// Bind declared property values to a type
    ///
    /// Schema defaults are applied; the identity property must be set.
    pub fn new(
        resource_type: Arc<ResourceType>,
        transport: Arc<dyn Transport>,
        values: Map<String, Value>,
        action: Action,
    ) -> Result<Self> {
        let desired = resource_type.desired(values)?;
        let identity = resource_type.identity_property();
        let Some(id) = desired.get(identity).and_then(template_value) else {
            bail!(
                "{} resource is missing its identity property '{identity}'",
                resource_type.name()
            );
        };

        Ok(Self {
            resource_type,
            transport,
            desired,
            action,
            id,
            planned: Mutex::new(None),
        })
    }

    pub fn type_name(&self) -> &str {
        self.resource_type.name()
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn desired(&self) -> &ResourceInstance {
        &self.desired
    }

    fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(self.transport.as_ref(), &self.resource_type, &self.desired)
    }

    /// Read the remote object and plan the write, sending nothing
    pub fn inspect(&self) -> Result<Inspection> {
        let reconciler = self.reconciler();
        let snapshot = reconciler
            .load()
            .with_context(|| format!("Failed to read {}.{}", self.type_name(), self.id))?;
        let change = reconciler.plan(self.action, &snapshot)?;
        Ok(Inspection { snapshot, change })
    }

    /// Current properties with every patchable desired value applied
    ///
    /// Required and post-only properties keep their current values, since an
    /// update never changes them.
    pub fn after_update(&self, current: &ResourceInstance) -> ResourceInstance {
        let mut after = current.clone();
        for (property, value) in self.desired.iter() {
            let patchable = self.resource_type.instruction(property).is_some()
                && !self.resource_type.is_required(property)
                && !self.resource_type.is_post_only(property);
            if patchable {
                after.set(property.as_str(), value.clone());
            }
        }
        after
    }
}

/// Pretty JSON for display; falls back to compact output
pub fn render(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

impl fmt::Debug for RestResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestResource")
            .field("type", &self.type_name())
            .field("id", &self.id)
            .field("action", &self.action)
            .field("desired", &self.desired)
            .finish_non_exhaustive()
    }
}

impl Resource for RestResource {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn description(&self) -> String {
        format!("{} {} '{}'", self.action, self.type_name(), self.id)
    }

    fn resource_type(&self) -> &str {
        self.type_name()
    }

    fn current_state(&self) -> Result<ResourceState> {
        let Inspection { snapshot, change } = self.inspect()?;
        if let Ok(mut planned) = self.planned.lock() {
            *planned = Some(change.clone());
        }

        let state = match (self.action, change) {
            (Action::Configure, PlannedChange::Create { .. }) => ResourceState::Absent,
            (Action::Configure, PlannedChange::Update { .. }) => ResourceState::Modified {
                from: render(&snapshot.current.to_json()),
                to: render(&self.after_update(&snapshot.current).to_json()),
            },
            (Action::Delete, PlannedChange::Delete { .. }) => {
                ResourceState::Present { details: None }
            }
            (Action::Delete, _) => ResourceState::Absent,
            (Action::Configure, _) => ResourceState::Present { details: None },
        };
        Ok(state)
    }

    fn desired_state(&self) -> ResourceState {
        match self.action {
            Action::Configure => ResourceState::Present { details: None },
            Action::Delete => ResourceState::Absent,
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let planned = self.planned.lock().ok().and_then(|mut slot| slot.take());
        let reconciler = self.reconciler();
        let outcome = match planned {
            Some(change) => reconciler.execute(&change),
            None => reconciler.reconcile(self.action),
        }
        .with_context(|| format!("Failed to {} {}.{}", self.action, self.type_name(), self.id))?;

        Ok(match outcome {
            Outcome::Created => ApplyResult::Created,
            Outcome::Updated => ApplyResult::Modified,
            Outcome::Deleted => ApplyResult::Removed,
            Outcome::NoOp => ApplyResult::NoChange,
        })
    }
}
