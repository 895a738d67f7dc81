//! Migrate command implementation: full export-then-import pipeline.

use crate::checkpoint;
use crate::cli::MigrateArgs;
use crate::config::{self, CliOverrides, MigrationConfig};
use crate::error::Result;
use crate::jira::JiraExport;
use std::path::Path;

/// Execute the migrate command.
///
/// A checkpoint snapshot written by a previous run short-circuits the
/// export phase entirely unless `--fresh` was given.
///
/// # Errors
///
/// Returns an error if export, checkpointing, or import setup fails.
/// Individual issue failures are reported but do not fail the command.
pub async fn execute(args: &MigrateArgs, config_file: Option<&Path>) -> Result<()> {
    let overrides = CliOverrides {
        source_base_url: args.source_url.clone(),
        batch_size: args.batch_size,
        state_dir: args.state_dir.clone(),
    };
    let cfg = MigrationConfig::load(config_file, &overrides)?;
    let username_map = config::load_username_map(args.username_map.as_deref())?;

    let restored = if args.fresh {
        None
    } else {
        checkpoint::load(&cfg.state_dir, &args.project)?
    };

    let project = match restored {
        Some(project) => {
            println!(
                "Restored checkpoint for {} ({} issues); skipping export",
                args.project,
                project.issue_count()
            );
            project
        }
        None => {
            let source = JiraExport::new(&cfg.source_base_url, cfg.http_timeout(), &cfg.user_agent)?;
            let project = super::export_project(
                &source,
                &cfg,
                &username_map,
                &args.project,
                &args.dest.owner,
                args.first,
                args.last,
            )
            .await?;
            super::print_discovered(&project);
            checkpoint::save(&cfg.state_dir, &project)?;
            project
        }
    };

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
