//! Subcommand implementations and the pipeline helpers they share.

pub mod collaborators;
pub mod export;
pub mod import;
pub mod migrate;

use crate::cli::DestinationArgs;
use crate::config::MigrationConfig;
use crate::error::{JimError, Result};
use crate::github::retry::RetryPolicy;
use crate::github::GithubClient;
use crate::jira::{self, ExportSource, NormalizeContext, normalize_document};
use crate::migrate::{ImportReport, ImportSettings, IssueOutcome, run_import};
use crate::model::Project;
use indicatif::ProgressBar;
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// Run the export phase: discovery, batched retrieval, normalization.
///
/// Returns the populated aggregate, sorted ascending by ordinal.
pub(crate) async fn export_project(
    source: &dyn ExportSource,
    cfg: &MigrationConfig,
    username_map: &HashMap<String, String>,
    project_key: &str,
    dest_owner: &str,
    first: Option<u64>,
    last: Option<u64>,
) -> Result<Project> {
    let stats = source.discover(project_key).await?;
    info!(
        project = project_key,
        total = stats.total,
        last = %stats.last,
        "discovered project"
    );

    let first = first.unwrap_or(1);
    let last = last.unwrap_or(stats.last.ordinal);
    if first == 0 || first > last {
        return Err(JimError::validation(
            "range",
            format!("invalid ordinal range {first}..{last}"),
        ));
    }

    println!("Retrieving issues {project_key}-{first} through {project_key}-{last}");

    let terminal_statuses = cfg.terminal_statuses_lowercase();
    let ctx = NormalizeContext {
        username_map,
        terminal_statuses: &terminal_statuses,
        source_web_url: &cfg.source_base_url,
        dest_web_url: &cfg.dest_web_url,
        dest_owner,
        custom_tag_field: &cfg.custom_tag_field,
    };

    let mut project = Project::new(project_key);
    let bar = ProgressBar::new(last - first + 1);
    for batch in jira::partition(first, last, cfg.batch_size) {
        let documents = jira::fetch_batch(source, project_key, &batch).await;
        for document in &documents {
            normalize_document(document, &mut project, &ctx)?;
            bar.inc(1);
        }
    }
    bar.finish_and_clear();

    project.sort_issues();
    Ok(project)
}

/// Run the import phase against the real destination client.
pub(crate) async fn import_project(
    cfg: &MigrationConfig,
    project: &Project,
    username_map: &HashMap<String, String>,
    dest: &DestinationArgs,
    default_assignee: &str,
) -> Result<ImportReport> {
    let client = GithubClient::new(
        &cfg.dest_api_url,
        &dest.owner,
        &dest.repository,
        &dest.token,
        cfg.http_timeout(),
        &cfg.user_agent,
    )?;
    let settings = import_settings(cfg, default_assignee);
    let policy = RetryPolicy::new(cfg.request_delay());
    run_import(&client, project, username_map, &settings, &policy).await
}

pub(crate) fn import_settings(cfg: &MigrationConfig, default_assignee: &str) -> ImportSettings {
    ImportSettings {
        default_assignee: default_assignee.to_string(),
        source_name: cfg.source_name.clone(),
        body_limit: cfg.body_limit,
        poll_timeout: cfg.poll_timeout(),
        poll_interval: cfg.poll_interval(),
        transient_error_resources: cfg.transient_error_resources.clone(),
        collaborator_permission: cfg.collaborator_permission.clone(),
    }
}

/// Print the metadata discovered during export.
pub(crate) fn print_discovered(project: &Project) {
    let meta = &project.meta;
    println!("Analysed {} issues", project.issue_count());
    println!("Discovered Projects: {}", format_set(&meta.projects));
    println!("Discovered Versions: {}", format_set(&meta.versions));
    println!("Discovered Components: {}", format_set(&meta.components));
    println!("Discovered Assignees: {}", format_set(&meta.assignees));
    println!("Discovered Types: {}", format_set(&meta.types));
    println!("Discovered Statuses: {}", format_set(&meta.statuses));
    println!("Discovered Resolutions: {}", format_set(&meta.resolutions));
    println!("Discovered Priorities: {}", format_set(&meta.priorities));
}

fn format_set(values: &BTreeSet<String>) -> String {
    let joined = values.iter().cloned().collect::<Vec<_>>().join(", ");
    format!("[{joined}]")
}

/// Print per-issue outcomes and a run summary.
pub(crate) fn print_report(report: &ImportReport) {
    for (key, outcome) in &report.outcomes {
        match outcome {
            IssueOutcome::Skipped => println!("{key}: skipped (already exists)"),
            IssueOutcome::Created { number } => println!("{key}: created issue #{number}"),
            IssueOutcome::Failed { reason } => println!("{key}: FAILED ({reason})"),
        }
    }
    println!(
        "Migration complete: {} created, {} skipped, {} failed",
        report.created(),
        report.skipped(),
        report.failed()
    );
}
