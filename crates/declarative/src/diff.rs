//! Diff computation for resources

use crate::resource::Resource;
use crate::types::ResourceState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A diff between current and desired state of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Unique identifier of the resource
    pub resource_id: String,
    /// Type of the resource
    pub resource_type: String,
    /// Human-readable description
    pub description: String,
    /// Current state
    pub current: ResourceState,
    /// Desired state
    pub desired: ResourceState,
    /// Why the current state is unknown, if reading it failed
    pub error: Option<String>,
}

impl ResourceDiff {
    /// Create a diff from a resource, returning None if no changes needed
    ///
    /// A failed state read is not an error here: it yields an `Unknown`
    /// current state so the resource is still reported (and applied).
    pub fn from_resource(resource: &dyn Resource) -> Option<Self> {
        let (current, error) = match resource.current_state() {
            Ok(state) => (state, None),
            Err(e) => (ResourceState::Unknown, Some(format!("{e:#}"))),
        };
        let desired = resource.desired_state();

        if current == desired {
            return None;
        }

        Some(Self {
            resource_id: resource.id(),
            resource_type: resource.resource_type().to_string(),
            description: resource.description(),
            current,
            desired,
            error,
        })
    }

    /// Check if this diff represents an addition
    pub fn is_addition(&self) -> bool {
        matches!(
            (&self.current, &self.desired),
            (ResourceState::Absent, ResourceState::Present { .. })
        )
    }

    /// Check if this diff represents a removal
    pub fn is_removal(&self) -> bool {
        matches!(
            (&self.current, &self.desired),
            (ResourceState::Present { .. }, ResourceState::Absent)
        )
    }

    /// Check if this diff represents a modification
    pub fn is_modification(&self) -> bool {
        matches!(self.current, ResourceState::Modified { .. })
    }

    /// Check if the current state could not be read
    pub fn is_unknown(&self) -> bool {
        matches!(self.current, ResourceState::Unknown)
    }
}

/// Compute diffs for a list of resources
///
/// Returns one entry per resource, in order: `None` where current and
/// desired state already agree. Each resource's state is read exactly once.
pub fn compute_diffs(resources: &[Box<dyn Resource>]) -> Vec<Option<ResourceDiff>> {
    resources
        .iter()
        .map(|r| ResourceDiff::from_resource(r.as_ref()))
        .collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// Number of resources to add
    pub additions: usize,
    /// Number of resources to remove
    pub removals: usize,
    /// Number of resources to modify
    pub modifications: usize,
    /// Number of resources whose state could not be read
    pub unknown: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            if diff.is_addition() {
                summary.additions += 1;
            } else if diff.is_removal() {
                summary.removals += 1;
            } else if diff.is_unknown() {
                summary.unknown += 1;
            } else {
                summary.modifications += 1;
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications + self.unknown
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by resource type, in type order
pub fn group_by_type(diffs: &[ResourceDiff]) -> BTreeMap<String, Vec<&ResourceDiff>> {
    let mut groups: BTreeMap<String, Vec<&ResourceDiff>> = BTreeMap::new();
    for diff in diffs {
        groups
            .entry(diff.resource_type.clone())
            .or_default()
            .push(diff);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ApplyContext;
    use crate::types::ApplyResult;
    use anyhow::Result;

    #[derive(Debug)]
    struct Fixed {
        id: &'static str,
        current: Option<ResourceState>,
        desired: ResourceState,
    }

    impl Resource for Fixed {
        fn id(&self) -> String {
            self.id.to_string()
        }

        fn description(&self) -> String {
            format!("fixed {}", self.id)
        }

        fn resource_type(&self) -> &str {
            "fixed"
        }

        fn current_state(&self) -> Result<ResourceState> {
            self.current
                .clone()
                .ok_or_else(|| anyhow::anyhow!("HTTP 503: unavailable"))
        }

        fn desired_state(&self) -> ResourceState {
            self.desired.clone()
        }

        fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
            Ok(ApplyResult::NoChange)
        }
    }

    fn present() -> ResourceState {
        ResourceState::Present { details: None }
    }

    #[test]
    fn test_diff_classification() {
        let resources: Vec<Box<dyn Resource>> = vec![
            Box::new(Fixed {
                id: "same",
                current: Some(present()),
                desired: present(),
            }),
            Box::new(Fixed {
                id: "new",
                current: Some(ResourceState::Absent),
                desired: present(),
            }),
            Box::new(Fixed {
                id: "gone",
                current: Some(present()),
                desired: ResourceState::Absent,
            }),
            Box::new(Fixed {
                id: "changed",
                current: Some(ResourceState::Modified {
                    from: "a".into(),
                    to: "b".into(),
                }),
                desired: present(),
            }),
            Box::new(Fixed {
                id: "broken",
                current: None,
                desired: present(),
            }),
        ];

        let slots = compute_diffs(&resources);
        assert_eq!(slots.len(), 5);
        assert!(slots[0].is_none());
        assert_eq!(slots[1].as_ref().map(|d| d.resource_id.as_str()), Some("new"));

        let diffs: Vec<ResourceDiff> = slots.into_iter().flatten().collect();
        assert_eq!(diffs.len(), 4);

        let summary = DiffSummary::from_diffs(&diffs);
        assert_eq!(
            summary,
            DiffSummary {
                additions: 1,
                removals: 1,
                modifications: 1,
                unknown: 1,
            }
        );

        let broken = diffs.iter().find(|d| d.resource_id == "broken").unwrap();
        assert!(broken.error.as_deref().unwrap().contains("503"));
    }

    #[test]
    fn test_group_by_type() {
        let resources: Vec<Box<dyn Resource>> = vec![Box::new(Fixed {
            id: "new",
            current: Some(ResourceState::Absent),
            desired: present(),
        })];
        let diffs: Vec<ResourceDiff> = compute_diffs(&resources).into_iter().flatten().collect();
        let groups = group_by_type(&diffs);
        assert_eq!(groups["fixed"].len(), 1);
    }
}
