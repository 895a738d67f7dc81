//! Import command implementation: restore a checkpoint and submit it.

use crate::checkpoint;
use crate::cli::ImportArgs;
use crate::config::{self, CliOverrides, MigrationConfig};
use crate::error::{JimError, Result};
use std::path::Path;

/// Execute the import command.
///
/// # Errors
///
/// Returns an error when no checkpoint snapshot exists for the project,
/// or when import setup fails. Individual issue failures are reported
/// but do not fail the command.
pub async fn execute(args: &ImportArgs, config_file: Option<&Path>) -> Result<()> {
    let overrides = CliOverrides {
        state_dir: args.state_dir.clone(),
        ..CliOverrides::default()
    };
    let cfg = MigrationConfig::load(config_file, &overrides)?;
    let username_map = config::load_username_map(args.username_map.as_deref())?;

    let project = checkpoint::load(&cfg.state_dir, &args.project)?.ok_or_else(|| {
        JimError::Config(format!(
            "no checkpoint snapshot for {}; run `jim export` first",
            args.project
        ))
    })?;
    println!(
        "Importing {} issues from the {} checkpoint",
        project.issue_count(),
        args.project
    );

    let report = super::import_project(
        &cfg,
        &project,
        &username_map,
        &args.dest,
        &args.default_assignee,
    )
    .await?;
    super::print_report(&report);
    Ok(())
}
