//! Import orchestration against the destination tracker.
//!
//! Given a populated [`Project`], the orchestrator creates prerequisite
//! entities (milestones, labels, collaborators), drains the destination's
//! milestone and collaborator listings into read-only caches, then drives
//! every issue through the asynchronous submit-then-poll import protocol,
//! one issue at a time in ascending ordinal order with a fixed pacing
//! delay. Each issue ends in exactly one of three terminal states:
//! skipped (already present), created, or failed. A single issue failure
//! never aborts the run.

use crate::error::{JimError, Result};
use crate::github::retry::{RetryPolicy, retry_indefinitely};
use crate::github::types::{CommentPayload, ImportJob, ImportSubmission, IssuePayload};
use crate::github::Destination;
use crate::markup;
use crate::model::{Comment, CompositeKey, IssueBundle, Project};
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Import-phase settings, resolved once from configuration.
#[derive(Debug, Clone)]
pub struct ImportSettings {
    /// Login substituted for assignees who are not collaborators.
    pub default_assignee: String,
    /// Human-readable name of the source tracker, used in audit comments.
    pub source_name: String,
    /// Upper bound on body and comment text accepted by the importer.
    pub body_limit: usize,
    /// Per-issue polling budget; exhaustion is a transient failure.
    pub poll_timeout: Duration,
    /// Delay between consecutive polls of one import job.
    pub poll_interval: Duration,
    /// Error resource kinds the destination may report on a failed job
    /// that indicate a transient server condition.
    pub transient_error_resources: Vec<String>,
    /// Permission granted to created collaborators.
    pub collaborator_permission: String,
}

/// Label attached to issues whose text had to be truncated.
pub const LENGTH_ERROR_LABEL: &str = "ERR: Length";

/// Destination state fetched once per run, read-only afterward.
#[derive(Debug, Clone, Default)]
pub struct DestinationCaches {
    /// Milestone title -> milestone number.
    pub milestones: HashMap<String, u64>,
    /// Known collaborator logins.
    pub collaborators: HashSet<String>,
}

/// Terminal state of one issue migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    /// An issue with the mapped identity already existed.
    Skipped,
    /// The import job completed; the destination assigned this number.
    Created { number: u64 },
    /// The import failed permanently for this issue.
    Failed { reason: String },
}

/// Per-issue outcomes for a whole run.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub outcomes: Vec<(CompositeKey, IssueOutcome)>,
}

impl ImportReport {
    #[must_use]
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, IssueOutcome::Created { .. }))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, IssueOutcome::Skipped))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, IssueOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&IssueOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Run the full import phase for a project.
///
/// The project must already be sorted ascending by ordinal; submission
/// order drives the destination's sequential issue numbering.
///
/// # Errors
///
/// Returns an error when prerequisite entity creation or cache draining
/// fails. Per-issue failures are recorded in the report instead.
pub async fn run_import(
    dest: &dyn Destination,
    project: &Project,
    username_map: &HashMap<String, String>,
    settings: &ImportSettings,
    policy: &RetryPolicy,
) -> Result<ImportReport> {
    create_prerequisites(dest, project, username_map, settings, policy).await?;
    let caches = drain_caches(dest, policy).await?;

    let mut report = ImportReport::default();
    for bundle in &project.issues {
        let key = bundle.issue.key.clone();
        policy.pace().await;
        let outcome = migrate_issue(dest, bundle, &caches, settings, policy).await;
        match &outcome {
            IssueOutcome::Skipped => {
                info!(%key, "skipping; an issue with this number already exists");
            }
            IssueOutcome::Created { number } => {
                info!(%key, number, "created destination issue");
            }
            IssueOutcome::Failed { reason } => {
                warn!(%key, %reason, "issue migration failed; continuing");
            }
        }
        report.outcomes.push((key, outcome));
    }
    Ok(report)
}

/// Create milestones, labels, and collaborators ahead of issue submission.
///
/// Entities are created independently: a failure for one is collected and
/// does not stop its siblings, but any collected failure aborts the run
/// before issue submission starts.
pub async fn create_prerequisites(
    dest: &dyn Destination,
    project: &Project,
    username_map: &HashMap<String, String>,
    settings: &ImportSettings,
    policy: &RetryPolicy,
) -> Result<()> {
    let mut failures: Vec<String> = Vec::new();
    let meta = &project.meta;

    for version in &meta.versions {
        policy.pace().await;
        if let Err(err) = dest.create_milestone(version).await {
            warn!(%version, %err, "failed to create milestone");
            failures.push(format!("milestone '{version}': {err}"));
        }
    }

    let labels = meta
        .components
        .iter()
        .map(|c| format!("Component: {c}"))
        .chain(meta.types.iter().map(|t| format!("Type: {t}")))
        .chain(meta.priorities.iter().map(|p| format!("Priority: {p}")));
    for label in labels {
        policy.pace().await;
        if let Err(err) = dest.create_label(&label, &random_color()).await {
            warn!(%label, %err, "failed to create label");
            failures.push(format!("label '{label}': {err}"));
        }
    }

    let logins: BTreeSet<&String> = username_map.values().collect();
    for login in logins {
        policy.pace().await;
        if let Err(err) = dest
            .add_collaborator(login, &settings.collaborator_permission)
            .await
        {
            warn!(%login, %err, "failed to add collaborator");
            failures.push(format!("collaborator '{login}': {err}"));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(JimError::Preparation(failures.join("; ")))
    }
}

/// Drain the paged milestone and collaborator listings into caches.
///
/// # Errors
///
/// Returns an error when a listing page fails permanently.
pub async fn drain_caches(
    dest: &dyn Destination,
    policy: &RetryPolicy,
) -> Result<DestinationCaches> {
    let mut caches = DestinationCaches::default();

    let mut page = 1;
    loop {
        let batch =
            retry_indefinitely(policy, "list milestones", move || dest.list_milestones(page))
                .await?;
        if batch.is_empty() {
            break;
        }
        for milestone in batch {
            caches.milestones.insert(milestone.title, milestone.number);
        }
        page += 1;
    }

    let mut page = 1;
    loop {
        let batch = retry_indefinitely(policy, "list collaborators", move || {
            dest.list_collaborators(page)
        })
        .await?;
        if batch.is_empty() {
            break;
        }
        for collaborator in batch {
            caches.collaborators.insert(collaborator.login);
        }
        page += 1;
    }

    info!(
        milestones = caches.milestones.len(),
        collaborators = caches.collaborators.len(),
        "drained destination caches"
    );
    Ok(caches)
}

/// The destination issue number this source issue is expected to receive.
///
/// Placeholders preserve ordinal continuity and issues are submitted in
/// ascending order into a repository whose numbering starts at one, so the
/// source ordinal doubles as the destination number. Best effort only; the
/// importer assigns numbers independently.
#[must_use]
pub const fn expected_number(key: &CompositeKey) -> u64 {
    key.ordinal
}

async fn migrate_issue(
    dest: &dyn Destination,
    bundle: &IssueBundle,
    caches: &DestinationCaches,
    settings: &ImportSettings,
    policy: &RetryPolicy,
) -> IssueOutcome {
    let key = &bundle.issue.key;
    let number = expected_number(key);

    let existing =
        retry_indefinitely(policy, "idempotency check", move || dest.get_issue(number)).await;
    match existing {
        Ok(Some(_)) => return IssueOutcome::Skipped,
        Ok(None) => {}
        Err(err) => {
            return IssueOutcome::Failed {
                reason: format!("idempotency check: {err}"),
            };
        }
    }

    let submission = prepare_submission(bundle, caches, settings);
    let submission = &submission;

    let result = retry_indefinitely(policy, "submit import", move || async move {
        let job = dest.submit_import(submission).await?;
        let url = job.url.clone().ok_or_else(|| JimError::PermanentImport {
            message: format!("submission for {key} returned no job url"),
        })?;
        debug!(%key, job = job.id, "submitted import job");
        poll_until_complete(dest, &url, settings).await
    })
    .await;

    match result {
        Ok(number) => IssueOutcome::Created { number },
        Err(err) => IssueOutcome::Failed {
            reason: err.to_string(),
        },
    }
}

/// Poll an import job until it reports a terminal status.
///
/// Any status other than `imported` or `failed` counts as pending. The
/// polling budget is independent from the outer submission retry; running
/// it down is a transient failure, so the submission layer retries.
async fn poll_until_complete(
    dest: &dyn Destination,
    url: &str,
    settings: &ImportSettings,
) -> Result<u64> {
    let started = Instant::now();
    loop {
        if started.elapsed() >= settings.poll_timeout {
            return Err(JimError::PollTimeout {
                seconds: settings.poll_timeout.as_secs(),
            });
        }
        match dest.poll_import(url).await {
            Ok(job) => match job.status.as_str() {
                "imported" => {
                    return job.issue_number().ok_or_else(|| JimError::PermanentImport {
                        message: "imported job carried no issue url".to_string(),
                    });
                }
                "failed" => return Err(classify_failure(&job, settings)),
                status => {
                    debug!(status, "import job still pending");
                    tokio::time::sleep(settings.poll_interval).await;
                }
            },
            Err(err) if err.is_transient() => {
                warn!(%err, "poll failed; retrying");
                tokio::time::sleep(settings.poll_interval).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Classify a `failed` job status as transient or permanent.
///
/// Only a failure whose first error resource names a configured transient
/// kind is retried; every other failed job is permanent for that issue.
fn classify_failure(job: &ImportJob, settings: &ImportSettings) -> JimError {
    let resource = job
        .errors
        .as_ref()
        .and_then(|errors| errors.first())
        .and_then(|error| error.resource.clone());

    match resource {
        Some(resource)
            if settings
                .transient_error_resources
                .iter()
                .any(|kind| *kind == resource) =>
        {
            JimError::TransientImport {
                message: format!("destination reported '{resource}'"),
            }
        }
        Some(resource) => JimError::PermanentImport {
            message: format!("destination reported error resource '{resource}'"),
        },
        None => JimError::PermanentImport {
            message: "destination reported failure without error details".to_string(),
        },
    }
}

/// Build the final submission payload for one issue.
///
/// Applies, in order: milestone resolution, substitution of unknown
/// assignees (with a provenance comment), the audit comment, the
/// resolution-summary comment, the body-for-empty-title fallback, size
/// bounding with the length error label, and label deduplication.
#[must_use]
pub fn prepare_submission(
    bundle: &IssueBundle,
    caches: &DestinationCaches,
    settings: &ImportSettings,
) -> ImportSubmission {
    let issue = &bundle.issue;
    let mut labels = issue.labels.clone();
    let mut comments: Vec<Comment> = bundle.comments.clone();
    let mut assignee = issue.assignee.clone();

    let milestone = issue.milestone.or_else(|| {
        issue
            .fix_version
            .as_ref()
            .and_then(|version| caches.milestones.get(version).copied())
    });

    if let Some(login) = assignee.clone() {
        if !login.is_empty() && !caches.collaborators.contains(&login) {
            comments.push(Comment::new(
                issue.created_at,
                format!("Was assigned to {login}"),
            ));
            assignee = Some(settings.default_assignee.clone());
        }
    }

    comments.push(Comment::new(
        Some(Utc::now()),
        format!(
            "This issue was imported from {} {}",
            settings.source_name, issue.key
        ),
    ));

    if issue.closed {
        if let Some(resolution) = &issue.resolution {
            let resolved_at = issue
                .closed_at
                .or(issue.created_at)
                .unwrap_or_else(Utc::now);
            comments.push(Comment::new(
                issue.closed_at,
                format!(
                    "Marked as **{}** on {}",
                    resolution.to_lowercase(),
                    humanize_timestamp(resolved_at)
                ),
            ));
        }
    }

    let body = if issue.body.trim().is_empty() {
        issue.title.clone()
    } else {
        issue.body.clone()
    };

    let mut truncated_any = false;
    let (body, truncated) = markup::bound(&body, settings.body_limit);
    truncated_any |= truncated;

    let comments: Vec<CommentPayload> = comments
        .into_iter()
        .map(|comment| {
            let (text, truncated) = markup::bound(&comment.body, settings.body_limit);
            truncated_any |= truncated;
            CommentPayload {
                created_at: comment.created_at,
                body: text,
            }
        })
        .collect();

    if truncated_any {
        labels.push(LENGTH_ERROR_LABEL.to_string());
    }

    ImportSubmission {
        issue: IssuePayload {
            title: issue.title.clone(),
            body,
            created_at: issue.created_at,
            closed_at: issue.closed_at,
            closed: issue.closed,
            assignee,
            milestone,
            labels: dedup_preserving_order(labels),
        },
        comments,
    }
}

fn dedup_preserving_order(labels: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .into_iter()
        .filter(|label| seen.insert(label.clone()))
        .collect()
}

fn random_color() -> String {
    format!("{:06x}", rand::thread_rng().gen_range(0..=0x00FF_FFFF))
}

/// Render a timestamp the way a human would write it in a comment,
/// e.g. `Monday, January 1st 2018, 10:05:00 am`.
#[must_use]
pub fn humanize_timestamp(at: DateTime<Utc>) -> String {
    let day = at.day();
    format!(
        "{}, {} {day}{} {}, {}",
        at.format("%A"),
        at.format("%B"),
        ordinal_suffix(day),
        at.format("%Y"),
        at.format("%-I:%M:%S %P")
    )
}

const fn ordinal_suffix(day: u32) -> &'static str {
    match day % 100 {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn humanized_timestamps_carry_ordinal_suffixes() {
        let at = Utc.with_ymd_and_hms(2018, 1, 1, 10, 5, 0).unwrap();
        assert_eq!(
            humanize_timestamp(at),
            "Monday, January 1st 2018, 10:05:00 am"
        );

        let at = Utc.with_ymd_and_hms(2018, 3, 22, 14, 0, 9).unwrap();
        assert_eq!(
            humanize_timestamp(at),
            "Thursday, March 22nd 2018, 2:00:09 pm"
        );

        let at = Utc.with_ymd_and_hms(2018, 3, 11, 0, 0, 0).unwrap();
        assert!(humanize_timestamp(at).contains("11th"));
    }

    #[test]
    fn colors_are_six_hex_digits() {
        for _ in 0..32 {
            let color = random_color();
            assert_eq!(color.len(), 6);
            assert!(color.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let labels = vec![
            "Type: Bug".to_string(),
            "net".to_string(),
            "Type: Bug".to_string(),
        ];
        assert_eq!(
            dedup_preserving_order(labels),
            vec!["Type: Bug".to_string(), "net".to_string()]
        );
    }
}
