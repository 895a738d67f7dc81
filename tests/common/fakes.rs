#![allow(dead_code)]

//! In-memory fakes for the two network seams.
//!
//! `FakeSource` serves canned export documents; `FakeDest` records every
//! write and replays scripted poll sequences so orchestrator behavior can
//! be tested without HTTP.

use async_trait::async_trait;
use jim_rust::error::{JimError, Result};
use jim_rust::github::Destination;
use jim_rust::github::types::{
    Collaborator, ExistingIssue, ImportJob, ImportJobError, ImportSubmission, Milestone,
};
use jim_rust::jira::{ExportSource, ExportStats};
use jim_rust::model::CompositeKey;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use super::fixtures;

/// Export source serving generated documents, with optional failures.
pub struct FakeSource {
    pub project: String,
    pub last: u64,
    pub total: u64,
    pub failing: HashSet<u64>,
    pub fetched: Mutex<Vec<u64>>,
}

impl FakeSource {
    pub fn new(project: &str, last: u64) -> Self {
        Self {
            project: project.to_string(),
            last,
            total: last,
            failing: HashSet::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_failing(mut self, ordinals: impl IntoIterator<Item = u64>) -> Self {
        self.failing.extend(ordinals);
        self
    }

    pub fn fetched_ordinals(&self) -> Vec<u64> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExportSource for FakeSource {
    async fn discover(&self, project: &str) -> Result<ExportStats> {
        Ok(ExportStats {
            total: self.total,
            last: CompositeKey::new(project, self.last)?,
        })
    }

    async fn fetch_issue(&self, project: &str, ordinal: u64) -> Result<String> {
        self.fetched.lock().unwrap().push(ordinal);
        if self.failing.contains(&ordinal) {
            return Err(JimError::Api {
                status: 500,
                message: "synthetic outage".to_string(),
            });
        }
        Ok(fixtures::issue_xml(project, ordinal))
    }
}

/// One step of a scripted poll sequence.
#[derive(Debug, Clone)]
pub enum PollStep {
    /// Job reports a non-terminal status.
    Pending,
    /// The poll request itself fails with a retryable server error.
    TransientError,
    /// Job completes; the fake assigns the next sequential issue number.
    Imported,
    /// Job fails with the given error resource (None = no error details).
    Failed(Option<&'static str>),
}

#[derive(Default)]
struct DestState {
    existing: HashSet<u64>,
    created_milestones: Vec<String>,
    created_labels: Vec<(String, String)>,
    added_collaborators: Vec<(String, String)>,
    listed_milestones: Vec<Milestone>,
    listed_collaborators: Vec<Collaborator>,
    failing_milestones: HashSet<String>,
    submissions: Vec<ImportSubmission>,
    scripts: HashMap<String, VecDeque<Vec<PollStep>>>,
    jobs: HashMap<u64, VecDeque<PollStep>>,
    next_job: u64,
    created: u64,
}

/// Scriptable in-memory destination.
///
/// Poll behavior is keyed by issue title: each scripted entry covers one
/// submission attempt, and attempts beyond the script (or unscripted
/// titles) follow the default pending-then-imported sequence.
#[derive(Default)]
pub struct FakeDest {
    state: Mutex<DestState>,
}

impl FakeDest {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_existing(self, numbers: impl IntoIterator<Item = u64>) -> Self {
        self.state.lock().unwrap().existing.extend(numbers);
        self
    }

    #[must_use]
    pub fn with_milestone_listing(self, title: &str, number: u64) -> Self {
        self.state.lock().unwrap().listed_milestones.push(Milestone {
            number,
            title: title.to_string(),
        });
        self
    }

    #[must_use]
    pub fn with_collaborator_listing(self, login: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .listed_collaborators
            .push(Collaborator {
                login: login.to_string(),
            });
        self
    }

    #[must_use]
    pub fn with_script(self, title: &str, attempts: Vec<Vec<PollStep>>) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(title.to_string(), attempts.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_failing_milestone(self, title: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_milestones
            .insert(title.to_string());
        self
    }

    pub fn submissions(&self) -> Vec<ImportSubmission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn submission_count(&self) -> usize {
        self.state.lock().unwrap().submissions.len()
    }

    pub fn created_count(&self) -> u64 {
        self.state.lock().unwrap().created
    }

    pub fn created_milestones(&self) -> Vec<String> {
        self.state.lock().unwrap().created_milestones.clone()
    }

    pub fn created_labels(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().created_labels.clone()
    }

    pub fn added_collaborators(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().added_collaborators.clone()
    }
}

#[async_trait]
impl Destination for FakeDest {
    async fn get_issue(&self, number: u64) -> Result<Option<ExistingIssue>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .existing
            .contains(&number)
            .then_some(ExistingIssue { number }))
    }

    async fn create_milestone(&self, title: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_milestones.contains(title) {
            return Err(JimError::Api {
                status: 403,
                message: "forbidden".to_string(),
            });
        }
        state.created_milestones.push(title.to_string());
        Ok(())
    }

    async fn create_label(&self, name: &str, color: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .created_labels
            .push((name.to_string(), color.to_string()));
        Ok(())
    }

    async fn add_collaborator(&self, login: &str, permission: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .added_collaborators
            .push((login.to_string(), permission.to_string()));
        Ok(())
    }

    async fn list_milestones(&self, page: u32) -> Result<Vec<Milestone>> {
        let state = self.state.lock().unwrap();
        if page == 1 {
            Ok(state.listed_milestones.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn list_collaborators(&self, page: u32) -> Result<Vec<Collaborator>> {
        let state = self.state.lock().unwrap();
        if page == 1 {
            Ok(state.listed_collaborators.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn submit_import(&self, submission: &ImportSubmission) -> Result<ImportJob> {
        let mut state = self.state.lock().unwrap();
        state.submissions.push(submission.clone());

        let steps = state
            .scripts
            .get_mut(&submission.issue.title)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| vec![PollStep::Pending, PollStep::Imported]);

        state.next_job += 1;
        let id = state.next_job;
        state.jobs.insert(id, steps.into_iter().collect());

        Ok(ImportJob {
            id: Some(id),
            url: Some(format!("https://dest.example/jobs/{id}")),
            status: "pending".to_string(),
            issue_url: None,
            errors: None,
        })
    }

    async fn poll_import(&self, url: &str) -> Result<ImportJob> {
        let id: u64 = url
            .rsplit('/')
            .next()
            .and_then(|tail| tail.parse().ok())
            .ok_or_else(|| JimError::PermanentImport {
                message: format!("unknown job url {url}"),
            })?;

        let mut state = self.state.lock().unwrap();
        let step = state
            .jobs
            .get_mut(&id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(PollStep::Imported);

        match step {
            PollStep::Pending => Ok(ImportJob {
                id: Some(id),
                url: Some(url.to_string()),
                status: "pending".to_string(),
                issue_url: None,
                errors: None,
            }),
            PollStep::TransientError => Err(JimError::Api {
                status: 503,
                message: "synthetic outage".to_string(),
            }),
            PollStep::Imported => {
                state.created += 1;
                let number = state.created;
                state.existing.insert(number);
                Ok(ImportJob {
                    id: Some(id),
                    url: Some(url.to_string()),
                    status: "imported".to_string(),
                    issue_url: Some(format!("https://dest.example/repos/o/r/issues/{number}")),
                    errors: None,
                })
            }
            PollStep::Failed(resource) => Ok(ImportJob {
                id: Some(id),
                url: Some(url.to_string()),
                status: "failed".to_string(),
                issue_url: None,
                errors: Some(vec![ImportJobError {
                    resource: resource.map(ToString::to_string),
                    code: None,
                    field: None,
                }]),
            }),
        }
    }
}
