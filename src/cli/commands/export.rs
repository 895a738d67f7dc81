//! Export command implementation: fetch, normalize, checkpoint.

use crate::checkpoint;
use crate::cli::ExportArgs;
use crate::config::{self, CliOverrides, MigrationConfig};
use crate::error::Result;
use crate::jira::JiraExport;
use std::path::Path;

/// Execute the export command.
///
/// # Errors
///
/// Returns an error if discovery, normalization, or the checkpoint write
/// fails.
pub async fn execute(args: &ExportArgs, config_file: Option<&Path>) -> Result<()> {
    let overrides = CliOverrides {
        source_base_url: args.source_url.clone(),
        batch_size: args.batch_size,
        state_dir: args.state_dir.clone(),
    };
    let cfg = MigrationConfig::load(config_file, &overrides)?;
    let username_map = config::load_username_map(args.username_map.as_deref())?;

    let source = JiraExport::new(&cfg.source_base_url, cfg.http_timeout(), &cfg.user_agent)?;
    let project = super::export_project(
        &source,
        &cfg,
        &username_map,
        &args.project,
        &args.owner,
        args.first,
        args.last,
    )
    .await?;

    super::print_discovered(&project);
    let path = checkpoint::save(&cfg.state_dir, &project)?;
    println!(
        "Exported {} issues to {}",
        project.issue_count(),
        path.display()
    );
    Ok(())
}
