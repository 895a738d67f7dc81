//! Command-line interface using clap.

pub mod commands;

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Migrate JIRA projects into GitHub issues.
#[derive(Debug, Parser)]
#[command(name = "jim", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./jim.yaml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write JSON logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Export a project from the source tracker and import it
    Migrate(MigrateArgs),
    /// Export a project and write its checkpoint snapshot only
    Export(ExportArgs),
    /// Import a previously exported project from its checkpoint
    Import(ImportArgs),
    /// Add collaborators to the destination repository
    Collaborators(CollaboratorsArgs),
}

/// Destination repository coordinates and credentials.
#[derive(Debug, Args)]
pub struct DestinationArgs {
    /// Destination account owning the repository
    #[arg(long)]
    pub owner: String,

    /// Destination repository name
    #[arg(long)]
    pub repository: String,

    /// Destination API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Source project key, e.g. COHERENCE
    pub project: String,

    #[command(flatten)]
    pub dest: DestinationArgs,

    /// Login assigned to issues whose assignee is not a collaborator
    #[arg(long)]
    pub default_assignee: String,

    /// First ordinal to migrate (default 1)
    #[arg(long)]
    pub first: Option<u64>,

    /// Last ordinal to migrate (default: discovered from the source)
    #[arg(long)]
    pub last: Option<u64>,

    /// Username mapping file (source identity -> destination login)
    #[arg(long, value_name = "FILE")]
    pub username_map: Option<PathBuf>,

    /// Re-export even when a checkpoint snapshot exists
    #[arg(long)]
    pub fresh: bool,

    /// Override the source tracker base URL
    #[arg(long, value_name = "URL")]
    pub source_url: Option<String>,

    /// Override the export batch size
    #[arg(long)]
    pub batch_size: Option<u64>,

    /// Override the checkpoint state directory
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Source project key, e.g. COHERENCE
    pub project: String,

    /// Destination account owning the migrated repositories (used to
    /// construct cross-issue links)
    #[arg(long)]
    pub owner: String,

    /// First ordinal to export (default 1)
    #[arg(long)]
    pub first: Option<u64>,

    /// Last ordinal to export (default: discovered from the source)
    #[arg(long)]
    pub last: Option<u64>,

    /// Username mapping file (source identity -> destination login)
    #[arg(long, value_name = "FILE")]
    pub username_map: Option<PathBuf>,

    /// Override the source tracker base URL
    #[arg(long, value_name = "URL")]
    pub source_url: Option<String>,

    /// Override the export batch size
    #[arg(long)]
    pub batch_size: Option<u64>,

    /// Override the checkpoint state directory
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Source project key of the checkpoint to import
    pub project: String,

    #[command(flatten)]
    pub dest: DestinationArgs,

    /// Login assigned to issues whose assignee is not a collaborator
    #[arg(long)]
    pub default_assignee: String,

    /// Username mapping file (source identity -> destination login)
    #[arg(long, value_name = "FILE")]
    pub username_map: Option<PathBuf>,

    /// Override the checkpoint state directory
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CollaboratorsArgs {
    #[command(flatten)]
    pub dest: DestinationArgs,

    /// Logins to add as collaborators
    #[arg(required_unless_present = "file")]
    pub logins: Vec<String>,

    /// File with one login per line
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}
