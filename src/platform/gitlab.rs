//! GitLab platform service implementation

use crate::config::GitLabConfig;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{Commit, MergeRequestSummary, PipelineStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// GitLab service using reqwest
pub struct GitLabService {
    client: Client,
    token: String,
    base_url: String,
    project_id: String,
}

/// MR as returned by list and single-MR endpoints
#[derive(Deserialize)]
struct MergeRequest {
    iid: u64,
    title: String,
    description: Option<String>,
    web_url: String,
    created_at: DateTime<Utc>,
    merge_status: String, // "can_be_merged", "cannot_be_merged", "unchecked", ...
    // Only present on the single-MR endpoint
    #[serde(default)]
    diverged_commits_count: Option<u32>,
    #[serde(default)]
    rebase_in_progress: Option<bool>,
    #[serde(default)]
    head_pipeline: Option<Pipeline>,
    #[serde(default)]
    pipeline: Option<Pipeline>,
}

/// Pipeline status
#[derive(Deserialize)]
struct Pipeline {
    status: String, // "success", "failed", "running", "pending", ...
}

/// MR approvals response
#[derive(Deserialize)]
struct MrApprovals {
    approved: bool,
}

#[derive(Deserialize)]
struct MrCommit {
    id: String,
    title: String,
}

impl From<MergeRequest> for MergeRequestSummary {
    fn from(mr: MergeRequest) -> Self {
        let pipeline = mr
            .head_pipeline
            .or(mr.pipeline)
            .map_or(PipelineStatus::Absent, |p| {
                PipelineStatus::from_gitlab(&p.status)
            });

        Self {
            iid: mr.iid,
            title: mr.title,
            description: mr.description.unwrap_or_default(),
            web_url: mr.web_url,
            created_at: mr.created_at,
            cannot_be_merged: mr.merge_status == "cannot_be_merged",
            diverged_commits_count: mr.diverged_commits_count.unwrap_or(0),
            rebase_in_progress: mr.rebase_in_progress.unwrap_or(false),
            pipeline,
        }
    }
}

impl From<MrCommit> for Commit {
    fn from(commit: MrCommit) -> Self {
        Self {
            id: commit.id,
            title: commit.title,
        }
    }
}

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// GitLab's maximum page size
const PER_PAGE: &str = "100";

/// Upper bound on followed pages for one listing
const MAX_PAGES: u32 = 50;

impl GitLabService {
    /// Create a new GitLab service
    pub fn new(config: &GitLabConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::GitLabApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: config.token.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn mr_url(&self, iid: u64, suffix: &str) -> String {
        self.api_url(&format!(
            "/projects/{}/merge_requests/{}{}",
            self.encoded_project(),
            iid,
            suffix
        ))
    }

    fn encoded_project(&self) -> String {
        urlencoding::encode(&self.project_id).into_owned()
    }

    fn next_page(response: &Response) -> Option<u32> {
        response
            .headers()
            .get("x-next-page")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok())
    }

    /// GET every page of a list endpoint
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let page_param = page.to_string();
            let response = self
                .client
                .get(url)
                .header("PRIVATE-TOKEN", &self.token)
                .query(query)
                .query(&[("per_page", PER_PAGE), ("page", page_param.as_str())])
                .send()
                .await?
                .error_for_status()
                .map_err(|e| Error::GitLabApi(e.to_string()))?;

            let next = Self::next_page(&response);
            let mut batch: Vec<T> = response.json().await?;
            items.append(&mut batch);

            match next {
                Some(next) if next > page && next <= MAX_PAGES => page = next,
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl PlatformService for GitLabService {
    async fn list_open_merge_requests(
        &self,
        target_branch: &str,
    ) -> Result<Vec<MergeRequestSummary>> {
        debug!(target_branch, "listing open MRs");
        let url = self.api_url(&format!(
            "/projects/{}/merge_requests",
            self.encoded_project()
        ));

        let mrs: Vec<MergeRequest> = self
            .get_all_pages(
                &url,
                &[
                    ("scope", "all"),
                    ("state", "opened"),
                    ("wip", "no"),
                    ("target_branch", target_branch),
                    ("order_by", "created_at"),
                    ("sort", "asc"),
                ],
            )
            .await?;

        debug!(count = mrs.len(), "listed open MRs");
        Ok(mrs.into_iter().map(Into::into).collect())
    }

    async fn get_merge_request(&self, iid: u64) -> Result<MergeRequestSummary> {
        debug!(mr_iid = iid, "getting MR");

        let mr: MergeRequest = self
            .client
            .get(self.mr_url(iid, ""))
            .header("PRIVATE-TOKEN", &self.token)
            .query(&[
                ("include_diverged_commits_count", "true"),
                ("include_rebase_in_progress", "true"),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        let summary: MergeRequestSummary = mr.into();
        debug!(
            mr_iid = iid,
            pipeline = %summary.pipeline,
            diverged = summary.diverged_commits_count,
            "got MR"
        );
        Ok(summary)
    }

    async fn is_approved(&self, iid: u64) -> Result<bool> {
        debug!(mr_iid = iid, "checking approvals");

        let approvals: MrApprovals = self
            .client
            .get(self.mr_url(iid, "/approvals"))
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        debug!(mr_iid = iid, approved = approvals.approved, "checked approvals");
        Ok(approvals.approved)
    }

    async fn list_commits(&self, iid: u64) -> Result<Vec<Commit>> {
        debug!(mr_iid = iid, "listing MR commits");

        let commits: Vec<MrCommit> = self.get_all_pages(&self.mr_url(iid, "/commits"), &[]).await?;

        debug!(mr_iid = iid, count = commits.len(), "listed MR commits");
        Ok(commits.into_iter().map(Into::into).collect())
    }

    async fn rebase(&self, iid: u64) -> Result<()> {
        debug!(mr_iid = iid, "requesting rebase");

        self.client
            .put(self.mr_url(iid, "/rebase"))
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(format!("Rebase failed: {e}")))?;

        debug!(mr_iid = iid, "rebase requested");
        Ok(())
    }

    async fn merge(&self, iid: u64) -> Result<()> {
        debug!(mr_iid = iid, "merging MR");

        self.client
            .put(self.mr_url(iid, "/merge"))
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(format!("Merge failed: {e}")))?;

        debug!(mr_iid = iid, "merge accepted");
        Ok(())
    }
}
