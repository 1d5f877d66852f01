//! Execution planner - builds resource execution plans

use crate::resource::{BoxedResource, Resource};

/// An ordered list of resources to converge
#[derive(Default)]
pub struct ExecutionPlan {
    /// Resources, applied in this order
    pub resources: Vec<BoxedResource>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource to the plan
    pub fn add_resource(&mut self, resource: BoxedResource) {
        self.resources.push(resource);
    }

    /// Total number of resources in the plan
    pub fn total_resources(&self) -> usize {
        self.resources.len()
    }
}

/// Check a resource against an optional "type" or "type.id" target
///
/// `None` matches everything.
pub fn matches_target(resource: &dyn Resource, target: Option<&str>) -> bool {
    match target {
        None => true,
        Some(t) => {
            let (resource_type, id) = parse_target(t);
            matches_filter(resource, resource_type, id)
        }
    }
}

/// Parse a target string like "type.id" into (type, id)
fn parse_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('.') {
        Some((resource_type, id)) => (resource_type, Some(id)),
        None => (target, None),
    }
}

/// Check if a resource matches the filter criteria
fn matches_filter(resource: &dyn Resource, resource_type: &str, id: Option<&str>) -> bool {
    if resource.resource_type() != resource_type {
        return false;
    }

    if let Some(id) = id
        && resource.id() != id
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ApplyContext;
    use crate::types::{ApplyResult, ResourceState};
    use anyhow::Result;

    #[derive(Debug)]
    struct Named(&'static str, &'static str);

    impl Resource for Named {
        fn id(&self) -> String {
            self.1.to_string()
        }

        fn description(&self) -> String {
            format!("{} {}", self.0, self.1)
        }

        fn resource_type(&self) -> &str {
            self.0
        }

        fn current_state(&self) -> Result<ResourceState> {
            Ok(ResourceState::Absent)
        }

        fn desired_state(&self) -> ResourceState {
            ResourceState::Absent
        }

        fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
            Ok(ApplyResult::NoChange)
        }
    }

    fn plan() -> ExecutionPlan {
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(Named("igroup", "web")));
        plan.add_resource(Box::new(Named("igroup", "db")));
        plan.add_resource(Box::new(Named("interface", "10.0.0.1")));
        plan
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("igroup"), ("igroup", None));
        assert_eq!(parse_target("igroup.web"), ("igroup", Some("web")));
        assert_eq!(
            parse_target("interface.10.0.0.1"),
            ("interface", Some("10.0.0.1"))
        );
    }

    fn matching(target: Option<&str>) -> Vec<String> {
        plan()
            .resources
            .iter()
            .filter(|r| matches_target(r.as_ref(), target))
            .map(|r| r.id())
            .collect()
    }

    #[test]
    fn test_target_by_type() {
        assert_eq!(matching(Some("igroup")), ["web", "db"]);
    }

    #[test]
    fn test_target_by_type_and_id() {
        assert_eq!(matching(Some("interface.10.0.0.1")), ["10.0.0.1"]);
        assert_eq!(matching(Some("igroup.db")), ["db"]);
        assert!(matching(Some("interface.10.0.0.2")).is_empty());
    }

    #[test]
    fn test_no_target_keeps_everything() {
        assert_eq!(matching(None).len(), 3);
    }

    #[test]
    fn test_matches_target() {
        let web = Named("igroup", "web");
        assert!(matches_target(&web, None));
        assert!(matches_target(&web, Some("igroup")));
        assert!(matches_target(&web, Some("igroup.web")));
        assert!(!matches_target(&web, Some("igroup.db")));
        assert!(!matches_target(&web, Some("igroups")));
    }
}
