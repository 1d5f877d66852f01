//! Execution engine - restsync executor with UI integration

use anyhow::Result;
use colored::Colorize;
use declarative::{
    ApplyResult, ConfirmCallback, ExecuteOptions, ExecuteSummary, ExecutionPlan, ProgressCallback,
    ResourceDiff, compute_diffs,
};
use indicatif::{ProgressBar, ProgressStyle};

use super::differ::display_diff;
use crate::ui;

/// Options for `apply`
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Verbose output
    pub verbose: bool,
    /// No progress bar
    pub quiet: bool,
}

/// Execute the plan with restsync's UI integration
pub fn execute(plan: ExecutionPlan, opts: ApplyOptions) -> Result<ExecuteSummary> {
    // 1. Show what will change
    let diffs = compute_diffs(&plan.resources);
    let pending: Vec<ResourceDiff> = diffs.iter().flatten().cloned().collect();
    display_diff(&pending);

    if pending.is_empty() {
        return Ok(ExecuteSummary {
            no_change: plan.total_resources(),
            ..Default::default()
        });
    }

    // 2. Confirm, then apply what still differs
    let mut progress = BarProgress::new(opts.quiet);
    let mut confirm = PromptConfirm { yes: opts.yes };
    let summary = declarative::execute(
        plan,
        &diffs,
        ExecuteOptions {
            dry_run: opts.dry_run,
            verbose: opts.verbose,
        },
        &mut progress,
        &mut confirm,
    )?;

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else if summary.skipped > 0 && summary.total_changes() + summary.failed == 0 {
        println!();
        println!("  {} Aborted", "✗".red());
    } else {
        print_summary(&summary);
    }

    Ok(summary)
}

/// Progress bar over the resources being applied
pub struct BarProgress {
    bar: Option<ProgressBar>,
    hidden: bool,
}

impl BarProgress {
    pub fn new(hidden: bool) -> Self {
        Self { bar: None, hidden }
    }
}

impl ProgressCallback for BarProgress {
    fn on_batch_start(&mut self, count: usize) {
        let pb = if self.hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(count as u64)
        };
        match ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            Ok(style) => pb.set_style(style.progress_chars("=>-")),
            Err(e) => log::debug!("Progress template rejected: {e}"),
        }

        if !self.hidden {
            println!();
            println!("  {} Applying {} resources...", "→".cyan(), count);
        }
        self.bar = Some(pb);
    }

    fn on_resource_start(&mut self, _id: &str, description: &str) {
        if let Some(pb) = &self.bar {
            pb.set_message(description.to_string());
        }
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        let Some(pb) = &self.bar else {
            return;
        };
        if let ApplyResult::Failed { error } = result {
            pb.suspend(|| ui::error(&format!("{id}: {error}")));
        }
        pb.inc(1);
    }

    fn on_batch_complete(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}

/// Interactive confirmation, unless `--yes` was given
pub struct PromptConfirm {
    pub yes: bool,
}

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }

        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?;

        Ok(confirmed)
    }
}

/// Print final summary
fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!(
            "  {} Configuration applied successfully!",
            "✓".green().bold()
        );
    } else {
        println!(
            "  {} Configuration applied with errors",
            "⚠".yellow().bold()
        );
    }

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} resources updated", summary.modified);
    }
    if summary.removed > 0 {
        println!("    • {} resources deleted", summary.removed);
    }
    if summary.no_change > 0 {
        println!("    • {} resources unchanged", summary.no_change);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}
