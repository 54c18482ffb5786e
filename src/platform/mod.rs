//! Code-hosting platform services
//!
//! The train only needs a handful of merge request operations; they are
//! abstracted here so the decision engine can run against GitLab or a mock.

mod gitlab;

pub use gitlab::GitLabService;

use crate::error::Result;
use crate::types::{Commit, MergeRequestSummary};
use async_trait::async_trait;

/// Platform service trait for the merge request operations the train drives
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Open, non-draft MRs targeting `target_branch`, oldest first
    async fn list_open_merge_requests(&self, target_branch: &str)
    -> Result<Vec<MergeRequestSummary>>;

    /// Fresh MR state including divergence, rebase and pipeline status
    async fn get_merge_request(&self, iid: u64) -> Result<MergeRequestSummary>;

    /// Whether the MR satisfies its approval rules
    async fn is_approved(&self, iid: u64) -> Result<bool>;

    /// Commits on the MR branch
    async fn list_commits(&self, iid: u64) -> Result<Vec<Commit>>;

    /// Request a rebase onto the target branch
    ///
    /// Returns once the platform accepted the request; the rebase itself
    /// completes asynchronously.
    async fn rebase(&self, iid: u64) -> Result<()>;

    /// Merge the MR
    async fn merge(&self, iid: u64) -> Result<()>;
}
