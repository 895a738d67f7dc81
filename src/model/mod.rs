//! Data types for the migration pipeline.
//!
//! A [`Project`] is the canonical in-memory aggregate built by the export
//! phase and consumed by the import phase. It is serializable so a run can
//! checkpoint after export and resume without re-fetching.

use crate::error::{JimError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Composite issue identity shared by both trackers: `"{project}-{ordinal}"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompositeKey {
    pub project: String,
    pub ordinal: u64,
}

impl CompositeKey {
    /// Build a key, rejecting a zero ordinal or empty project.
    ///
    /// # Errors
    ///
    /// Returns a validation error if either component is invalid.
    pub fn new(project: impl Into<String>, ordinal: u64) -> Result<Self> {
        let project = project.into();
        if project.is_empty() {
            return Err(JimError::validation("key", "project key cannot be empty"));
        }
        if ordinal == 0 {
            return Err(JimError::validation("key", "ordinal must be positive"));
        }
        Ok(Self { project, ordinal })
    }

    /// Parse a textual key by splitting on the last hyphen.
    ///
    /// Project keys may themselves contain hyphens; the ordinal never does.
    ///
    /// # Errors
    ///
    /// Returns a validation error when there is no hyphen, the project part
    /// is empty, or the ordinal part is not a positive integer.
    pub fn parse(text: &str) -> Result<Self> {
        let (project, ordinal) = text
            .rsplit_once('-')
            .ok_or_else(|| JimError::validation("key", format!("missing hyphen in '{text}'")))?;
        let ordinal: u64 = ordinal
            .parse()
            .map_err(|_| JimError::validation("key", format!("non-numeric ordinal in '{text}'")))?;
        Self::new(project, ordinal)
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.project, self.ordinal)
    }
}

/// A single comment attached to an issue, in synthesis order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub created_at: Option<DateTime<Utc>>,
    pub body: String,
    /// Destination login of the author, when one could be resolved.
    pub author: Option<String>,
}

impl Comment {
    #[must_use]
    pub fn new(created_at: Option<DateTime<Utc>>, body: impl Into<String>) -> Self {
        Self {
            created_at,
            body: body.into(),
            author: None,
        }
    }
}

/// A normalized issue ready for submission.
///
/// Mutated by the orchestrator only to attach the milestone number and to
/// rewrite an assignee who is not a known destination collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub key: CompositeKey,
    pub title: String,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed: bool,
    pub resolution: Option<String>,
    /// `None` means the source issue was unassigned.
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    /// First fix version only; becomes a milestone reference.
    pub fix_version: Option<String>,
    pub labels: Vec<String>,
    /// Destination milestone number, populated during import preparation.
    pub milestone: Option<u64>,
}

impl Issue {
    /// A placeholder for an issue that could not be retrieved, preserving
    /// ordinal continuity at the destination.
    #[must_use]
    pub fn unavailable(project: &str, ordinal: u64) -> Self {
        Self {
            key: CompositeKey {
                project: project.to_string(),
                ordinal,
            },
            title: "Unavailable".to_string(),
            body: String::new(),
            created_at: None,
            closed_at: None,
            closed: true,
            resolution: None,
            assignee: None,
            reporter: None,
            fix_version: None,
            labels: Vec::new(),
            milestone: None,
        }
    }
}

/// An issue together with its ordered comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueBundle {
    pub issue: Issue,
    pub comments: Vec<Comment>,
}

/// Project-wide metadata sets accumulated during normalization.
///
/// Sets keep unique values in a stable order, which fixes milestone and
/// label creation order at the destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub versions: BTreeSet<String>,
    pub components: BTreeSet<String>,
    pub assignees: BTreeSet<String>,
    pub types: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub resolutions: BTreeSet<String>,
    pub priorities: BTreeSet<String>,
    /// Other projects referenced by sub-tasks, parents, or links.
    pub projects: BTreeSet<String>,
}

impl ProjectMeta {
    /// Drop the sentinel values that must not become destination entities.
    pub fn prune_sentinels(&mut self) {
        self.assignees.remove("Unassigned");
        self.types.remove("Epic");
    }
}

/// The accumulated in-memory model of one source project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Source project key, e.g. `"COHERENCE"`.
    pub name: String,
    pub meta: ProjectMeta,
    pub issues: Vec<IssueBundle>,
}

impl Project {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Order issues ascending by ordinal.
    ///
    /// Submission order drives the destination's sequential numbering, so
    /// this must run before import.
    pub fn sort_issues(&mut self) {
        self.issues
            .sort_by_key(|bundle| bundle.issue.key.ordinal);
    }

    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }
}
