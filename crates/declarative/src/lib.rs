//! # Declarative
//!
//! A framework for declarative resource management.
//!
//! This crate provides the core abstractions for declaring desired state,
//! detecting current state, and converging systems to match the desired state.
//!
//! ## Core Concepts
//!
//! - **Resource**: Something with state that can be managed (a REST object, a setting)
//! - **ResourceState**: The current or desired state of a resource
//! - **ExecutionPlan**: The ordered resources to converge
//! - **Executor**: Applies the resources that differ, one at a time
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{AutoConfirm, ExecutionPlan, ExecuteOptions, NoProgress, compute_diffs, execute};
//!
//! let mut plan = ExecutionPlan::new();
//! plan.add_resource(Box::new(my_resource));
//!
//! let diffs = compute_diffs(&plan.resources);
//! let summary = execute(plan, &diffs, ExecuteOptions::default(), &mut NoProgress, &mut AutoConfirm)?;
//! println!("{} changed", summary.total_changes());
//! ```
//!
//! ## Callback Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This allows the crate to be used without hard dependencies on
//! specific UI frameworks.

pub mod context;
pub mod diff;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback,
};
pub use diff::{DiffSummary, ResourceDiff, compute_diffs, group_by_type};
pub use executor::execute;
pub use planner::{ExecutionPlan, matches_target};
pub use resource::{BoxedResource, Resource};
pub use types::{ApplyResult, ExecuteOptions, ExecuteSummary, ResourceState};
