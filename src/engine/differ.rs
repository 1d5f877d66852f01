//! Diff display - restsync-specific UI

use colored::Colorize;
use declarative::{DiffSummary, ResourceDiff, ResourceState, group_by_type};
use similar::{ChangeTag, TextDiff};

/// Display a list of diffs in a user-friendly format
pub fn display_diff(diffs: &[ResourceDiff]) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Configuration Diff".bold()
    );
    println!("│");

    for (resource_type, type_diffs) in group_by_type(diffs) {
        println!("│ {}", resource_type.bold());

        for diff in type_diffs {
            let symbol = match (&diff.current, &diff.desired) {
                (ResourceState::Absent, ResourceState::Present { .. }) => "+".green(),
                (ResourceState::Present { .. }, ResourceState::Absent) => "-".red(),
                (ResourceState::Modified { .. }, _) => "~".yellow(),
                _ => "?".dimmed(),
            };

            let state_desc = match (&diff.current, &diff.desired) {
                (ResourceState::Absent, ResourceState::Present { .. }) => "(will create)",
                (ResourceState::Present { .. }, ResourceState::Absent) => "(will delete)",
                (ResourceState::Modified { .. }, _) => "(will update)",
                _ => "(state unknown)",
            };

            println!(
                "│   {} {:<30} {}",
                symbol,
                diff.resource_id,
                state_desc.dimmed()
            );

            if let ResourceState::Modified { from, to } = &diff.current {
                for line in changed_lines(from, to) {
                    let colored = if line.starts_with('-') {
                        line.red()
                    } else {
                        line.green()
                    };
                    println!("│       {colored}");
                }
            }
            if let Some(error) = &diff.error {
                println!("│       {}", error.red());
            }
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(diffs);
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} create, {} update, {} delete, {} unknown)",
        summary.total().to_string().bold(),
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red(),
        summary.unknown.to_string().dimmed()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Lines that differ between two texts, prefixed with `- ` or `+ `
pub fn changed_lines(from: &str, to: &str) -> Vec<String> {
    let diff = TextDiff::from_lines(from, to);

    diff.iter_all_changes()
        .filter_map(|change| {
            let sign = match change.tag() {
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
                ChangeTag::Equal => return None,
            };
            Some(format!("{sign} {}", change.value().trim_end_matches('\n')))
        })
        .collect()
}
