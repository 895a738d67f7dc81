//! Destination tracker client.
//!
//! The destination is driven through three families of calls: entity
//! creation (milestones, labels, collaborators), read-side listings used
//! to build the idempotency caches, and the asynchronous submit-then-poll
//! import protocol. [`Destination`] is the seam the orchestrator runs
//! against; [`GithubClient`] is the `reqwest`-backed implementation.

pub mod retry;
pub mod types;

pub use retry::{RetryPolicy, retry_indefinitely};
pub use types::{
    Collaborator, ExistingIssue, ImportJob, ImportJobError, ImportSubmission, Milestone,
};

use crate::error::{JimError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tracing::debug;

/// Media type gating the bulk-import preview endpoints.
const IMPORT_ACCEPT: &str = "application/vnd.github.golden-comet-preview+json";

/// Page size used when draining listings.
const PAGE_SIZE: u32 = 100;

/// Write and read operations the orchestrator needs from the destination.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Look up an issue by number; `None` when it does not exist.
    async fn get_issue(&self, number: u64) -> Result<Option<ExistingIssue>>;

    /// Create a milestone; an "already exists" response is success.
    async fn create_milestone(&self, title: &str) -> Result<()>;

    /// Create a label; an "already exists" response is success.
    async fn create_label(&self, name: &str, color: &str) -> Result<()>;

    /// Add a collaborator; an "already exists" response is success.
    async fn add_collaborator(&self, login: &str, permission: &str) -> Result<()>;

    /// One page of the milestone listing (1-based; empty page ends it).
    async fn list_milestones(&self, page: u32) -> Result<Vec<Milestone>>;

    /// One page of the collaborator listing (1-based; empty page ends it).
    async fn list_collaborators(&self, page: u32) -> Result<Vec<Collaborator>>;

    /// Submit an issue to the asynchronous import endpoint.
    async fn submit_import(&self, submission: &ImportSubmission) -> Result<ImportJob>;

    /// Poll a previously submitted import job.
    async fn poll_import(&self, url: &str) -> Result<ImportJob>;
}

/// `reqwest`-backed destination client for one repository.
pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    token: String,
}

impl GithubClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        api_base: &str,
        owner: &str,
        repo: &str,
        token: &str,
        timeout: std::time::Duration,
        user_agent: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{path}",
            self.api_base, self.owner, self.repo
        )
    }

    fn auth(&self) -> String {
        format!("token {}", self.token)
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(JimError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Treat an "already exists" validation response as success.
    async fn conflict_is_success(response: reqwest::Response, entity: &str) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        if status == StatusCode::UNPROCESSABLE_ENTITY && message.contains("already_exists") {
            debug!(entity, "already exists; continuing");
            return Ok(());
        }
        Err(JimError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl Destination for GithubClient {
    async fn get_issue(&self, number: u64) -> Result<Option<ExistingIssue>> {
        let response = self
            .client
            .get(self.repo_url(&format!("/issues/{number}")))
            .header(AUTHORIZATION, self.auth())
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::expect_success(response).await?;
        Ok(Some(response.json().await?))
    }

    async fn create_milestone(&self, title: &str) -> Result<()> {
        let response = self
            .client
            .post(self.repo_url("/milestones"))
            .header(AUTHORIZATION, self.auth())
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await?;
        Self::conflict_is_success(response, title).await
    }

    async fn create_label(&self, name: &str, color: &str) -> Result<()> {
        let color = color.trim_start_matches('#');
        let response = self
            .client
            .post(self.repo_url("/labels"))
            .header(AUTHORIZATION, self.auth())
            .json(&serde_json::json!({ "name": name, "color": color }))
            .send()
            .await?;
        Self::conflict_is_success(response, name).await
    }

    async fn add_collaborator(&self, login: &str, permission: &str) -> Result<()> {
        let response = self
            .client
            .put(self.repo_url(&format!("/collaborators/{login}")))
            .header(AUTHORIZATION, self.auth())
            .json(&serde_json::json!({ "permission": permission }))
            .send()
            .await?;
        Self::conflict_is_success(response, login).await
    }

    async fn list_milestones(&self, page: u32) -> Result<Vec<Milestone>> {
        let url = self.repo_url(&format!(
            "/milestones?state=all&per_page={PAGE_SIZE}&page={page}"
        ));
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.auth())
            .send()
            .await?;
        let response = Self::expect_success(response).await?;
        Ok(response.json().await?)
    }

    async fn list_collaborators(&self, page: u32) -> Result<Vec<Collaborator>> {
        let url = self.repo_url(&format!("/collaborators?per_page={PAGE_SIZE}&page={page}"));
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.auth())
            .send()
            .await?;
        let response = Self::expect_success(response).await?;
        Ok(response.json().await?)
    }

    async fn submit_import(&self, submission: &ImportSubmission) -> Result<ImportJob> {
        let response = self
            .client
            .post(self.repo_url("/import/issues"))
            .header(AUTHORIZATION, self.auth())
            .header(ACCEPT, IMPORT_ACCEPT)
            .json(submission)
            .send()
            .await?;
        let response = Self::expect_success(response).await?;
        Ok(response.json().await?)
    }

    async fn poll_import(&self, url: &str) -> Result<ImportJob> {
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.auth())
            .header(ACCEPT, IMPORT_ACCEPT)
            .send()
            .await?;
        let response = Self::expect_success(response).await?;
        Ok(response.json().await?)
    }
}
