//! Per-property change calculation between desired and current state.

use crate::schema::{ResourceInstance, ResourceType};
use serde_json::Value;

/// Decides, property by property, what a write request should carry.
#[derive(Debug, Clone, Copy)]
pub struct ChangeCalculator<'a> {
    resource_type: &'a ResourceType,
    desired: &'a ResourceInstance,
    current: Option<&'a ResourceInstance>,
}

impl<'a> ChangeCalculator<'a> {
    /// `current` is `None` when the resource does not exist yet.
    pub fn new(
        resource_type: &'a ResourceType,
        desired: &'a ResourceInstance,
        current: Option<&'a ResourceInstance>,
    ) -> Self {
        Self {
            resource_type,
            desired,
            current,
        }
    }

    /// Value to write for `property`, or `None` to omit it.
    ///
    /// - no current resource: the desired value
    /// - required property: the *current* value, never the desired one
    /// - otherwise: the desired value if it differs from the current one
    pub fn changed_value(&self, property: &str) -> Option<&'a Value> {
        let desired = self.desired.get(property);
        let Some(current) = self.current else {
            return desired;
        };

        let observed = current.get(property);
        if self.resource_type.is_required(property) {
            return observed;
        }
        if desired == observed { None } else { desired }
    }

    pub fn is_creating(&self) -> bool {
        self.current.is_none()
    }
}
