//! Mock platform service for testing

#![allow(dead_code)]

use async_trait::async_trait;
use release_train::error::{Error, Result};
use release_train::platform::PlatformService;
use release_train::types::{Commit, MergeRequestSummary, PipelineStatus};
use std::collections::HashMap;
use std::sync::Mutex;

/// Simple mock platform service for testing
///
/// Features:
/// - Separate listing and single-MR views (listing lacks pipeline/divergence)
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    open_mrs: Mutex<Vec<MergeRequestSummary>>,
    mr_details: Mutex<HashMap<u64, MergeRequestSummary>>,
    approvals: Mutex<HashMap<u64, bool>>,
    commits: Mutex<HashMap<u64, Vec<Commit>>>,
    // Call tracking
    list_calls: Mutex<Vec<String>>,
    get_mr_calls: Mutex<Vec<u64>>,
    approval_calls: Mutex<Vec<u64>>,
    commit_calls: Mutex<Vec<u64>>,
    rebase_calls: Mutex<Vec<u64>>,
    merge_calls: Mutex<Vec<u64>>,
    // Error injection
    error_on_list: Mutex<Option<String>>,
    error_on_rebase: Mutex<Option<String>>,
    error_on_merge: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create an empty mock
    pub fn new() -> Self {
        Self {
            open_mrs: Mutex::new(Vec::new()),
            mr_details: Mutex::new(HashMap::new()),
            approvals: Mutex::new(HashMap::new()),
            commits: Mutex::new(HashMap::new()),
            list_calls: Mutex::new(Vec::new()),
            get_mr_calls: Mutex::new(Vec::new()),
            approval_calls: Mutex::new(Vec::new()),
            commit_calls: Mutex::new(Vec::new()),
            rebase_calls: Mutex::new(Vec::new()),
            merge_calls: Mutex::new(Vec::new()),
            error_on_list: Mutex::new(None),
            error_on_rebase: Mutex::new(None),
            error_on_merge: Mutex::new(None),
        }
    }

    // === Error injection methods ===

    /// Make `list_open_merge_requests` return an error
    pub fn fail_list(&self, msg: &str) {
        *self.error_on_list.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `rebase` return an error
    pub fn fail_rebase(&self, msg: &str) {
        *self.error_on_rebase.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `merge` return an error
    pub fn fail_merge(&self, msg: &str) {
        *self.error_on_merge.lock().unwrap() = Some(msg.to_string());
    }

    // === Setup ===

    /// Add an open MR
    ///
    /// `mr` is the fully fetched state; the listing gets the same MR without
    /// divergence, rebase or pipeline information, like GitLab's list endpoint.
    pub fn add_mr(&self, mr: MergeRequestSummary, approved: bool, commits: Vec<Commit>) {
        let mut listed = mr.clone();
        listed.diverged_commits_count = 0;
        listed.rebase_in_progress = false;
        listed.pipeline = PipelineStatus::Absent;

        self.open_mrs.lock().unwrap().push(listed);
        self.approvals.lock().unwrap().insert(mr.iid, approved);
        self.commits.lock().unwrap().insert(mr.iid, commits);
        self.mr_details.lock().unwrap().insert(mr.iid, mr);
    }

    /// Replace the fetched state of an MR
    pub fn set_mr_details(&self, mr: MergeRequestSummary) {
        self.mr_details.lock().unwrap().insert(mr.iid, mr);
    }

    /// Change the approval state of an MR
    pub fn set_approved(&self, iid: u64, approved: bool) {
        self.approvals.lock().unwrap().insert(iid, approved);
    }

    // === Call verification methods ===

    /// Branches passed to `list_open_merge_requests`
    pub fn get_list_calls(&self) -> Vec<String> {
        self.list_calls.lock().unwrap().clone()
    }

    /// MRs fetched individually
    pub fn get_mr_calls(&self) -> Vec<u64> {
        self.get_mr_calls.lock().unwrap().clone()
    }

    /// MRs whose approvals were checked
    pub fn get_approval_calls(&self) -> Vec<u64> {
        self.approval_calls.lock().unwrap().clone()
    }

    /// MRs whose commits were listed
    pub fn get_commit_calls(&self) -> Vec<u64> {
        self.commit_calls.lock().unwrap().clone()
    }

    /// MRs rebased
    pub fn get_rebase_calls(&self) -> Vec<u64> {
        self.rebase_calls.lock().unwrap().clone()
    }

    /// MRs merged
    pub fn get_merge_calls(&self) -> Vec<u64> {
        self.merge_calls.lock().unwrap().clone()
    }

    /// Assert that `merge` was called for a specific MR
    pub fn assert_merge_called(&self, iid: u64) {
        let calls = self.get_merge_calls();
        assert!(
            calls.contains(&iid),
            "Expected merge({iid}) but got: {calls:?}"
        );
    }

    /// Assert that `merge` was NOT called for a specific MR
    pub fn assert_merge_not_called(&self, iid: u64) {
        let calls = self.get_merge_calls();
        assert!(
            !calls.contains(&iid),
            "Expected merge({iid}) NOT to be called but it was: {calls:?}"
        );
    }

    /// Assert that no rebase or merge was issued
    pub fn assert_no_mutations(&self) {
        let rebases = self.get_rebase_calls();
        let merges = self.get_merge_calls();
        assert!(
            rebases.is_empty() && merges.is_empty(),
            "Expected no mutations but got rebases {rebases:?}, merges {merges:?}"
        );
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn list_open_merge_requests(
        &self,
        target_branch: &str,
    ) -> Result<Vec<MergeRequestSummary>> {
        self.list_calls
            .lock()
            .unwrap()
            .push(target_branch.to_string());

        if let Some(msg) = self.error_on_list.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        Ok(self.open_mrs.lock().unwrap().clone())
    }

    async fn get_merge_request(&self, iid: u64) -> Result<MergeRequestSummary> {
        self.get_mr_calls.lock().unwrap().push(iid);

        let details = self.mr_details.lock().unwrap();
        details.get(&iid).cloned().ok_or_else(|| {
            Error::Platform(format!("get_merge_request: no response configured for !{iid}"))
        })
    }

    async fn is_approved(&self, iid: u64) -> Result<bool> {
        self.approval_calls.lock().unwrap().push(iid);

        let approvals = self.approvals.lock().unwrap();
        approvals.get(&iid).copied().ok_or_else(|| {
            Error::Platform(format!("is_approved: no response configured for !{iid}"))
        })
    }

    async fn list_commits(&self, iid: u64) -> Result<Vec<Commit>> {
        self.commit_calls.lock().unwrap().push(iid);

        let commits = self.commits.lock().unwrap();
        Ok(commits.get(&iid).cloned().unwrap_or_default())
    }

    async fn rebase(&self, iid: u64) -> Result<()> {
        self.rebase_calls.lock().unwrap().push(iid);

        if let Some(msg) = self.error_on_rebase.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        Ok(())
    }

    async fn merge(&self, iid: u64) -> Result<()> {
        self.merge_calls.lock().unwrap().push(iid);

        if let Some(msg) = self.error_on_merge.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        // A merged MR leaves the open listing.
        self.open_mrs.lock().unwrap().retain(|mr| mr.iid != iid);
        Ok(())
    }
}
