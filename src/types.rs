//! Core types for release-train

use chrono::{DateTime, Utc};

/// Status of the pipeline attached to a merge request's head commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    /// No pipeline has been created for the MR
    Absent,
    /// Pipeline is queued or executing
    Running,
    /// Pipeline finished successfully
    Success,
    /// Pipeline finished with a failure
    Failed,
    /// Any other terminal or manual state (canceled, skipped, manual, ...)
    Other(String),
}

impl PipelineStatus {
    /// Map a GitLab pipeline status string onto the train's view of it
    pub fn from_gitlab(status: &str) -> Self {
        match status {
            "success" => Self::Success,
            "failed" => Self::Failed,
            "running" | "pending" | "created" | "preparing" | "waiting_for_resource" => {
                Self::Running
            }
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Other(status) => write!(f, "{status}"),
        }
    }
}

/// A merge request as seen by one pass
///
/// Listing endpoints do not report divergence, rebase or pipeline state, so
/// summaries built from a listing carry `diverged_commits_count == 0`,
/// `rebase_in_progress == false` and `PipelineStatus::Absent` until the MR is
/// fetched individually.
#[derive(Debug, Clone)]
pub struct MergeRequestSummary {
    /// Project-scoped MR number
    pub iid: u64,
    /// MR title
    pub title: String,
    /// MR description (empty when unset)
    pub description: String,
    /// Web URL for the MR
    pub web_url: String,
    /// When the MR was opened
    pub created_at: DateTime<Utc>,
    /// Code host reports a merge conflict
    pub cannot_be_merged: bool,
    /// Commits on the target branch missing from the MR branch
    pub diverged_commits_count: u32,
    /// A rebase is already running for this MR
    pub rebase_in_progress: bool,
    /// Head pipeline state
    pub pipeline: PipelineStatus,
}

/// A commit on a merge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Commit SHA
    pub id: String,
    /// First line of the commit message
    pub title: String,
}

/// A Jira ticket returned by a release query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    /// Issue key, e.g. `REL-10`
    pub key: String,
    /// Issue summary
    pub summary: String,
    /// Workflow status name
    pub status: String,
    /// Names of the fix versions the ticket is planned for
    pub fix_versions: Vec<String>,
    /// Value of the configured release field, if set on the ticket
    pub release_value: Option<String>,
}
