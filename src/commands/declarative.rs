//! Declarative commands
//!
//! - `status` - Show current state vs desired state
//! - `diff` - Preview the request each resource would send
//! - `apply` - Make current state match desired state

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{ExecutionPlan, Resource, ResourceState, matches_target};
use restkit::PlannedChange;
use std::path::PathBuf;

use crate::Context;
use crate::engine::differ::changed_lines;
use crate::engine::{self, ApplyOptions};
use crate::paths;
use crate::resource::{Inspection, RestResource, render};
use crate::schema::Manifest;
use crate::ui;

// ============================================================================
// Loading
// ============================================================================

/// Load the manifest and keep the resources matching `target`
fn load_resources(ctx: &Context, target: Option<&str>) -> Result<(PathBuf, Vec<RestResource>)> {
    let path = paths::manifest_path(ctx.manifest.as_deref())?;
    log::info!("Loading manifest {}", path.display());

    let manifest = Manifest::load(&path)?;
    let resources: Vec<RestResource> = manifest
        .resources()?
        .into_iter()
        .filter(|r| matches_target(r, target))
        .collect();

    if resources.is_empty() {
        match target {
            Some(t) => ui::warn(&format!("No resources match '{t}'")),
            None => ui::warn("Manifest declares no resources"),
        }
    }

    Ok((path, resources))
}

fn label(resource: &RestResource) -> String {
    format!("{}.{}", resource.type_name(), resource.id())
}

// ============================================================================
// status
// ============================================================================

pub fn status(ctx: &Context, target: Option<&str>) -> Result<()> {
    let (path, resources) = load_resources(ctx, target)?;

    if !ctx.quiet {
        ui::header("restsync status");
        ui::kv("Manifest", &path.display().to_string());
    }

    let mut in_sync = 0;
    let mut pending = 0;
    let mut failed = 0;
    let mut current_type: Option<&str> = None;

    for resource in &resources {
        if current_type != Some(resource.type_name()) {
            ui::section(resource.type_name());
            current_type = Some(resource.type_name());
        }

        let current = match resource.current_state() {
            Ok(state) => state,
            Err(e) => {
                failed += 1;
                println!(
                    "  {} {:<30} {}",
                    "✗".red(),
                    resource.id(),
                    format!("{e:#}").red()
                );
                continue;
            }
        };

        let (symbol, desc) = if current == resource.desired_state() {
            in_sync += 1;
            ("✓".green(), "in sync")
        } else {
            pending += 1;
            match current {
                ResourceState::Absent => ("+".green(), "missing"),
                ResourceState::Present { .. } => ("-".red(), "present, marked for deletion"),
                ResourceState::Modified { .. } => ("~".yellow(), "differs"),
                ResourceState::Unknown => ("?".dimmed(), "unknown"),
            }
        };
        println!("  {} {:<30} {}", symbol, resource.id(), desc.dimmed());

        if ctx.verbose > 0 {
            ui::kv("action", &resource.action().to_string());
            for (property, value) in resource.desired().iter() {
                ui::kv(property, &value.to_string());
            }
        }
    }

    println!();
    println!(
        "  {} in sync, {} pending, {} unreadable",
        in_sync.to_string().green(),
        pending.to_string().yellow(),
        failed.to_string().red()
    );

    if failed > 0 {
        bail!("{failed} resource(s) could not be read");
    }
    Ok(())
}

// ============================================================================
// diff
// ============================================================================

pub fn diff(ctx: &Context, target: Option<&str>) -> Result<()> {
    let (_, resources) = load_resources(ctx, target)?;

    if !ctx.quiet {
        ui::header("restsync diff");
    }

    let mut pending = 0;
    let mut failed = 0;

    for resource in &resources {
        let Inspection { snapshot, change } = match resource.inspect() {
            Ok(inspection) => inspection,
            Err(e) => {
                failed += 1;
                ui::error(&format!("{}: {e:#}", label(resource)));
                continue;
            }
        };

        let symbol = match &change {
            PlannedChange::Create { .. } => "+".green(),
            PlannedChange::Update { .. } => "~".yellow(),
            PlannedChange::Delete { .. } => "-".red(),
            PlannedChange::NoOp { reason } => {
                if ctx.verbose > 0 {
                    println!(
                        "  {} {} {}",
                        "○".dimmed(),
                        label(resource),
                        format!("({reason})").dimmed()
                    );
                }
                continue;
            }
        };

        pending += 1;
        println!();
        println!("  {} {}", symbol, label(resource).bold());
        println!("    {}", change.to_string().cyan());

        if matches!(change, PlannedChange::Update { .. }) {
            let before = render(&snapshot.current.to_json());
            let after = render(&resource.after_update(&snapshot.current).to_json());
            for line in changed_lines(&before, &after) {
                let colored = if line.starts_with('-') {
                    line.red()
                } else {
                    line.green()
                };
                println!("    {colored}");
            }
        }

        if let Some(body) = change.body() {
            ui::dim("body:");
            println!("{}", ui::indent(&render(body), 4));
        }
    }

    println!();
    if pending == 0 && failed == 0 {
        ui::success("No changes needed");
    } else {
        ui::info(&format!("{pending} change(s) pending"));
    }

    if failed > 0 {
        bail!("{failed} resource(s) could not be read");
    }
    Ok(())
}

// ============================================================================
// apply
// ============================================================================

pub fn apply(ctx: &Context, target: Option<&str>, dry_run: bool, yes: bool) -> Result<()> {
    let (_, resources) = load_resources(ctx, target)?;
    if resources.is_empty() {
        return Ok(());
    }

    let mut plan = ExecutionPlan::new();
    for resource in resources {
        plan.add_resource(Box::new(resource));
    }

    let summary = engine::execute(
        plan,
        ApplyOptions {
            dry_run,
            yes,
            verbose: ctx.verbose > 0,
            quiet: ctx.quiet,
        },
    )?;

    if !summary.is_success() {
        bail!("{} resource(s) failed to apply", summary.failed);
    }
    Ok(())
}
