//! Execution engine - applies resources one after another

use crate::context::{ApplyContext, ConfirmCallback, ProgressCallback};
use crate::diff::ResourceDiff;
use crate::planner::ExecutionPlan;
use crate::resource::Resource;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::{Result, ensure};

/// Execute a plan with the given options and callbacks
///
/// `diffs` holds one entry per plan resource, as returned by
/// [`compute_diffs`](crate::diff::compute_diffs). Resources with a `None`
/// entry count as `no_change` and are not read again; the rest are applied
/// in plan order, never concurrently.
pub fn execute<P, C>(
    plan: ExecutionPlan,
    diffs: &[Option<ResourceDiff>],
    opts: ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    ensure!(
        diffs.len() == plan.total_resources(),
        "{} diffs for a plan of {} resources",
        diffs.len(),
        plan.total_resources()
    );

    let pending = diffs.iter().flatten().count();
    let unchanged = plan.total_resources() - pending;

    if pending == 0 {
        return Ok(ExecuteSummary {
            no_change: unchanged,
            ..Default::default()
        });
    }

    if opts.dry_run || !confirm.confirm("Apply changes?")? {
        return Ok(ExecuteSummary {
            skipped: pending,
            no_change: unchanged,
            ..Default::default()
        });
    }

    let mut summary = ExecuteSummary::default();
    progress.on_batch_start(pending);

    for (resource, diff) in plan.resources.iter().zip(diffs) {
        if diff.is_none() {
            summary.add_result(&ApplyResult::NoChange);
            continue;
        }

        let id = resource.id();
        progress.on_resource_start(&id, &resource.description());
        let result = apply_resource(resource.as_ref(), opts.verbose);
        progress.on_resource_complete(&id, &result);
        summary.add_result(&result);
    }

    progress.on_batch_complete();
    Ok(summary)
}

/// Apply a single resource, turning errors into `Failed`
fn apply_resource(resource: &dyn Resource, verbose: bool) -> ApplyResult {
    let mut ctx = ApplyContext::new(false, verbose);

    match resource.apply(&mut ctx) {
        Ok(result) => result,
        Err(e) => ApplyResult::Failed {
            error: format!("{e:#}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoProgress};
    use crate::diff::compute_diffs;
    use crate::types::ResourceState;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestResource {
        id: String,
        should_change: bool,
        fail: bool,
    }

    impl TestResource {
        fn new(id: &str, should_change: bool) -> Self {
            Self {
                id: id.into(),
                should_change,
                fail: false,
            }
        }

        fn failing(id: &str) -> Self {
            Self {
                fail: true,
                ..Self::new(id, true)
            }
        }
    }

    impl Resource for TestResource {
        fn id(&self) -> String {
            self.id.clone()
        }

        fn description(&self) -> String {
            format!("Test resource {}", self.id)
        }

        fn resource_type(&self) -> &str {
            "test"
        }

        fn current_state(&self) -> Result<ResourceState> {
            if self.should_change {
                Ok(ResourceState::Absent)
            } else {
                Ok(ResourceState::Present { details: None })
            }
        }

        fn desired_state(&self) -> ResourceState {
            ResourceState::Present { details: None }
        }

        fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
            if ctx.dry_run {
                return Ok(ApplyResult::Skipped {
                    reason: "Dry run".into(),
                });
            }
            if self.fail {
                anyhow::bail!("HTTP 409: duplicate entry");
            }
            if self.should_change {
                Ok(ApplyResult::Created)
            } else {
                Ok(ApplyResult::NoChange)
            }
        }
    }

    fn run(plan: ExecutionPlan, opts: ExecuteOptions) -> ExecuteSummary {
        let diffs = compute_diffs(&plan.resources);
        execute(plan, &diffs, opts, &mut NoProgress, &mut AutoConfirm).unwrap()
    }

    /// Always absent; counts how often its state is read
    #[derive(Debug)]
    struct Counted(Arc<AtomicUsize>);

    impl Resource for Counted {
        fn id(&self) -> String {
            "counted".into()
        }

        fn description(&self) -> String {
            "Counted resource".into()
        }

        fn resource_type(&self) -> &str {
            "test"
        }

        fn current_state(&self) -> Result<ResourceState> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(ResourceState::Absent)
        }

        fn desired_state(&self) -> ResourceState {
            ResourceState::Present { details: None }
        }

        fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
            Ok(ApplyResult::Created)
        }
    }

    #[test]
    fn test_state_is_read_once_per_run() {
        let reads = Arc::new(AtomicUsize::new(0));
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(Counted(reads.clone())));

        let result = run(plan, ExecuteOptions::default());
        assert_eq!(result.created, 1);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_diffs_must_cover_the_plan() {
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(TestResource::new("test1", true)));

        let err = execute(
            plan,
            &[],
            ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap_err();
        assert!(err.to_string().contains("0 diffs for a plan of 1"));
    }

    #[test]
    fn test_execute_empty_plan() {
        let result = run(ExecutionPlan::new(), ExecuteOptions::default());
        assert_eq!(result.total(), 0);
    }

    #[test]
    fn test_execute_no_changes() {
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(TestResource::new("test1", false)));

        let result = run(plan, ExecuteOptions::default());
        assert_eq!(result.no_change, 1);
        assert_eq!(result.total_changes(), 0);
    }

    #[test]
    fn test_execute_with_changes() {
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(TestResource::new("test1", true)));
        plan.add_resource(Box::new(TestResource::new("test2", false)));

        let result = run(plan, ExecuteOptions::default());
        assert_eq!(result.created, 1);
        assert_eq!(result.no_change, 1);
    }

    #[test]
    fn test_failures_are_counted_not_raised() {
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(TestResource::failing("bad")));
        plan.add_resource(Box::new(TestResource::new("good", true)));

        let result = run(plan, ExecuteOptions::default());
        assert_eq!(result.failed, 1);
        assert_eq!(result.created, 1);
        assert!(!result.is_success());
    }

    #[test]
    fn test_dry_run_applies_nothing() {
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(TestResource::new("test1", true)));

        let opts = ExecuteOptions {
            dry_run: true,
            ..Default::default()
        };
        let result = run(plan, opts);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.total_changes(), 0);
    }

    #[test]
    fn test_declined_confirmation_skips() {
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(TestResource::new("test1", true)));

        let diffs = compute_diffs(&plan.resources);
        let result = execute(
            plan,
            &diffs,
            ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();
        assert_eq!(result.skipped, 1);
    }

    struct Recording(Vec<String>);

    impl ProgressCallback for Recording {
        fn on_batch_start(&mut self, count: usize) {
            self.0.push(format!("start {count}"));
        }
        fn on_resource_start(&mut self, id: &str, _description: &str) {
            self.0.push(format!("begin {id}"));
        }
        fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
            self.0.push(format!("end {id} {result:?}"));
        }
        fn on_batch_complete(&mut self) {
            self.0.push("done".into());
        }
    }

    #[test]
    fn test_progress_only_reports_changed_resources() {
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(TestResource::new("same", false)));
        plan.add_resource(Box::new(TestResource::new("new", true)));

        let diffs = compute_diffs(&plan.resources);
        let mut progress = Recording(Vec::new());
        execute(
            plan,
            &diffs,
            ExecuteOptions::default(),
            &mut progress,
            &mut AutoConfirm,
        )
        .unwrap();
        assert_eq!(
            progress.0,
            ["start 1", "begin new", "end new Created", "done"]
        );
    }
}
