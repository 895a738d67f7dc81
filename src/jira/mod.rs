//! Export retrieval from the source tracker.
//!
//! The source exposes issues only through a paginated XML search endpoint.
//! Retrieval is batched: within a batch every ordinal is requested
//! concurrently, and batches run strictly one after another so peak
//! concurrency stays bounded to one batch width. An issue that cannot be
//! retrieved yields a placeholder document instead of aborting its batch,
//! preserving ordinal continuity at the destination.

pub mod normalize;
pub mod xml;

pub use normalize::{NormalizeContext, normalize_document};

use crate::error::{JimError, Result};
use crate::model::CompositeKey;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

/// One issue's raw export document, or a marker that retrieval failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDocument {
    Fetched { ordinal: u64, xml: String },
    Unavailable { ordinal: u64 },
}

impl RawDocument {
    #[must_use]
    pub fn ordinal(&self) -> u64 {
        match self {
            Self::Fetched { ordinal, .. } | Self::Unavailable { ordinal } => *ordinal,
        }
    }
}

/// Totals reported by the discovery query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportStats {
    /// Total issue count reported by the source.
    pub total: u64,
    /// Key of the most recently created issue.
    pub last: CompositeKey,
}

/// Read side of the source tracker.
#[async_trait]
pub trait ExportSource: Send + Sync {
    /// Discover the total issue count and the highest issue key.
    async fn discover(&self, project: &str) -> Result<ExportStats>;

    /// Fetch the export document for a single issue.
    async fn fetch_issue(&self, project: &str, ordinal: u64) -> Result<String>;
}

/// `reqwest`-backed export source speaking the JQL search-request protocol.
pub struct JiraExport {
    client: reqwest::Client,
    base_url: String,
}

impl JiraExport {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: std::time::Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, jql: &str, temp_max: Option<u64>) -> String {
        let mut url = format!(
            "{}/sr/jira.issueviews:searchrequest-xml/temp/SearchRequest.xml?jqlQuery={jql}",
            self.base_url
        );
        if let Some(max) = temp_max {
            url.push_str(&format!("&tempMax={max}"));
        }
        url
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(JimError::Api {
                status: status.as_u16(),
                message: format!("GET {url}"),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ExportSource for JiraExport {
    async fn discover(&self, project: &str) -> Result<ExportStats> {
        let jql = format!("project+%3D+{project}+ORDER+BY+created+DESC");
        let url = self.search_url(&jql, Some(1));
        let xml = self.get_text(&url).await?;
        parse_discovery(&xml)
    }

    async fn fetch_issue(&self, project: &str, ordinal: u64) -> Result<String> {
        let jql = format!("PROJECT+%3D+{project}+AND+ISSUE={project}-{ordinal}");
        let url = self.search_url(&jql, None);
        self.get_text(&url).await
    }
}

/// Extract the reported total and the newest issue key from a discovery
/// response (a single-item search ordered newest first).
///
/// # Errors
///
/// Returns [`JimError::MalformedExport`] when the response carries no
/// issue records.
pub fn parse_discovery(xml: &str) -> Result<ExportStats> {
    let doc = roxmltree::Document::parse(xml)?;
    let channel = doc
        .descendants()
        .find(|n| n.has_tag_name("channel"))
        .ok_or_else(|| JimError::MalformedExport {
            context: "discovery".to_string(),
        })?;

    let item = xml::child(channel, "item").ok_or_else(|| JimError::MalformedExport {
        context: "discovery".to_string(),
    })?;
    let key_text =
        xml::child_text(item, "key").ok_or_else(|| JimError::MalformedExport {
            context: "discovery".to_string(),
        })?;
    let last = CompositeKey::parse(&key_text)?;

    let total = xml::child(channel, "issue")
        .and_then(|n| n.attribute("total"))
        .and_then(|v| v.parse().ok())
        .unwrap_or(last.ordinal);

    Ok(ExportStats { total, last })
}

/// Partition `[first, last]` into fixed-size runs of ordinals.
#[must_use]
pub fn partition(first: u64, last: u64, batch_size: u64) -> Vec<Vec<u64>> {
    if first > last || batch_size == 0 {
        return Vec::new();
    }
    let mut batches = Vec::new();
    let mut start = first;
    while start <= last {
        let end = last.min(start.saturating_add(batch_size - 1));
        batches.push((start..=end).collect());
        start = end + 1;
    }
    batches
}

/// Fetch every ordinal in one batch concurrently.
///
/// A failed request is logged and replaced with an unavailable marker so
/// sibling requests in the batch are unaffected.
pub async fn fetch_batch(
    source: &dyn ExportSource,
    project: &str,
    ordinals: &[u64],
) -> Vec<RawDocument> {
    let requests = ordinals.iter().map(|&ordinal| async move {
        match source.fetch_issue(project, ordinal).await {
            Ok(xml) => {
                debug!(project, ordinal, "retrieved issue");
                RawDocument::Fetched { ordinal, xml }
            }
            Err(err) => {
                warn!(project, ordinal, %err, "failed to retrieve issue; substituting placeholder");
                RawDocument::Unavailable { ordinal }
            }
        }
    });
    join_all(requests).await
}

/// Fetch `[first, last]` batch by batch, batches strictly sequential.
pub async fn fetch_range(
    source: &dyn ExportSource,
    project: &str,
    first: u64,
    last: u64,
    batch_size: u64,
) -> Vec<RawDocument> {
    let mut documents = Vec::new();
    for batch in partition(first, last, batch_size) {
        documents.extend(fetch_batch(source, project, &batch).await);
    }
    documents
}
