//! Wire types for the destination's REST and bulk-import endpoints.
//!
//! Only the fields the orchestrator reads are modeled; everything else in
//! the responses is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issue payload for the asynchronous import endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssuePayload {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    pub closed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
    pub labels: Vec<String>,
}

/// Comment payload accompanying an issue submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub body: String,
}

/// One submission: the issue and its ordered comments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportSubmission {
    pub issue: IssuePayload,
    pub comments: Vec<CommentPayload>,
}

/// State of an asynchronous import job, as submitted and as polled.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ImportJob {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    pub status: String,
    #[serde(default)]
    pub issue_url: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<ImportJobError>>,
}

impl ImportJob {
    /// Destination issue number, parsed from the imported issue URL.
    #[must_use]
    pub fn issue_number(&self) -> Option<u64> {
        self.issue_url
            .as_ref()?
            .rsplit('/')
            .next()?
            .parse()
            .ok()
    }
}

/// Error detail attached to a failed import job.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ImportJobError {
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
}

/// A milestone known to the destination repository.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Milestone {
    pub number: u64,
    pub title: String,
}

/// A collaborator on the destination repository.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Collaborator {
    pub login: String,
}

/// The identity marker returned by the idempotency lookup.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ExistingIssue {
    pub number: u64,
}
