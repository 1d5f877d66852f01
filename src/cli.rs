use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "restsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Reconcile declared resources against a REST API", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest to load (default: $RESTSYNC_MANIFEST, then the config dir)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show current vs desired state of each resource
    Status(TargetArgs),

    /// Show the request each resource would send
    Diff(TargetArgs),

    /// Converge resources to the manifest
    Apply(ApplyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Declarative commands
// ============================================================================

#[derive(Parser)]
pub struct TargetArgs {
    /// Only these resources: a type (`igroup`) or one resource (`igroup.web`)
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Only these resources: a type (`igroup`) or one resource (`igroup.web`)
    pub target: Option<String>,

    /// Show what would change without sending any write
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}
