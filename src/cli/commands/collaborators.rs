//! Collaborators command implementation.

use crate::cli::CollaboratorsArgs;
use crate::config::{CliOverrides, MigrationConfig};
use crate::error::{JimError, Result};
use crate::github::retry::RetryPolicy;
use crate::github::{Destination, GithubClient};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Execute the collaborators command.
///
/// Adds each login to the destination repository with the configured
/// permission. Logins that already have access count as added; other
/// failures are collected and reported after every login was attempted.
///
/// # Errors
///
/// Returns an error if no logins were supplied or any addition failed.
pub async fn execute(args: &CollaboratorsArgs, config_file: Option<&Path>) -> Result<()> {
    let cfg = MigrationConfig::load(config_file, &CliOverrides::default())?;

    let mut logins = args.logins.clone();
    if let Some(path) = &args.file {
        let contents = fs::read_to_string(path)?;
        logins.extend(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(ToString::to_string),
        );
    }
    if logins.is_empty() {
        return Err(JimError::validation("logins", "no collaborators given"));
    }

    let client = GithubClient::new(
        &cfg.dest_api_url,
        &args.dest.owner,
        &args.dest.repository,
        &args.dest.token,
        cfg.http_timeout(),
        &cfg.user_agent,
    )?;
    let policy = RetryPolicy::new(cfg.request_delay());

    let mut failures = Vec::new();
    for login in &logins {
        policy.pace().await;
        match client
            .add_collaborator(login, &cfg.collaborator_permission)
            .await
        {
            Ok(()) => println!("Added collaborator {login}"),
            Err(err) => {
                warn!(%login, %err, "failed to add collaborator");
                failures.push(format!("{login}: {err}"));
            }
        }
    }

    if failures.is_empty() {
        println!("All {} collaborators added", logins.len());
        Ok(())
    } else {
        Err(JimError::Preparation(failures.join("; ")))
    }
}
