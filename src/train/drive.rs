//! Queue driver - one pass of the merge train
//!
//! Candidates are evaluated strictly one at a time, oldest first. A rebase
//! or a wait ends the pass; skips and merges move on to the next MR. Any
//! failed API call aborts the pass and the next pass starts from fresh state.

use crate::config::{JiraConfig, TrainConfig, TrainPolicy};
use crate::error::Result;
use crate::platform::PlatformService;
use crate::scheduler::PassRunner;
use crate::tickets::TicketMatcher;
use crate::tracker::{IssueTracker, TicketQuery};
use crate::train::consistency::find_undeclared_commit;
use crate::train::decide::{Action, SkipReason, decide};
use crate::train::filter::{EligibleSet, ReleaseFilter, referenced_keys};
use crate::types::MergeRequestSummary;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Action taken for one MR
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrOutcome {
    /// MR number
    pub iid: u64,
    /// What the train did
    pub action: Action,
}

/// Result of one pass
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// Open MRs on the target branch
    pub listed: usize,
    /// MRs backed entirely by eligible tickets
    pub candidates: usize,
    /// Evaluated MRs in evaluation order
    pub outcomes: Vec<MrOutcome>,
    /// MR whose action ended the pass early
    pub stopped_by: Option<u64>,
    /// Mutations were only logged
    pub dry_run: bool,
}

impl PassReport {
    /// Action recorded for `iid`, if it was evaluated
    pub fn action_for(&self, iid: u64) -> Option<&Action> {
        self.outcomes
            .iter()
            .find(|o| o.iid == iid)
            .map(|o| &o.action)
    }

    /// MRs merged in this pass
    pub fn merged(&self) -> Vec<u64> {
        self.iids_where(|a| matches!(a, Action::Merge))
    }

    /// MRs rebased in this pass
    pub fn rebased(&self) -> Vec<u64> {
        self.iids_where(|a| matches!(a, Action::Rebase))
    }

    fn iids_where(&self, pred: impl Fn(&Action) -> bool) -> Vec<u64> {
        self.outcomes
            .iter()
            .filter(|o| pred(&o.action))
            .map(|o| o.iid)
            .collect()
    }
}

/// The merge train: collaborators plus the immutable settings for a pass
pub struct MergeTrain {
    platform: Arc<dyn PlatformService>,
    tracker: Arc<dyn IssueTracker>,
    matcher: TicketMatcher,
    jira: JiraConfig,
    target_branch: String,
    policy: TrainPolicy,
}

impl MergeTrain {
    /// Build a train from resolved configuration
    pub fn new(
        config: &TrainConfig,
        platform: Arc<dyn PlatformService>,
        tracker: Arc<dyn IssueTracker>,
    ) -> Result<Self> {
        let matcher = TicketMatcher::new(&config.jira.browse_url, &config.jira.project_key)?;
        Ok(Self {
            platform,
            tracker,
            matcher,
            jira: config.jira.clone(),
            target_branch: config.gitlab.target_branch.clone(),
            policy: config.policy,
        })
    }

    /// Run one full pass
    pub async fn run_pass(&self) -> Result<PassReport> {
        info!(target_branch = %self.target_branch, "getting merge requests");
        let mut mrs = self
            .platform
            .list_open_merge_requests(&self.target_branch)
            .await?;
        // Listing is already oldest-first; a stable sort keeps ties in listing order.
        mrs.sort_by_key(|mr| mr.created_at);

        let keys = referenced_keys(&self.matcher, &mrs);
        info!(mrs = mrs.len(), tickets = keys.len(), "getting jira tickets");
        let query = TicketQuery::for_release(&self.jira, &keys);
        let tickets = self.tracker.search_tickets(&query).await?;
        for ticket in &tickets {
            debug!(
                ticket = %ticket.key,
                status = %ticket.status,
                release = ?ticket.release_value,
                "release ticket"
            );
        }
        let eligible = EligibleSet::new(tickets);
        debug!(eligible = eligible.len(), "eligible tickets");

        let filter = ReleaseFilter::new(&self.matcher, &eligible, &self.jira.statuses);
        let listed = mrs.len();
        let candidates: Vec<MergeRequestSummary> = mrs
            .into_iter()
            .filter(|mr| match filter.exclusion(mr) {
                Some(reason) => {
                    debug!(mr_iid = mr.iid, %reason, "not in release");
                    false
                }
                None => true,
            })
            .collect();

        let mut report = PassReport {
            listed,
            candidates: candidates.len(),
            dry_run: self.policy.dry_run,
            ..PassReport::default()
        };

        for mr in &candidates {
            info!(mr_iid = mr.iid, title = %mr.title, "loading merge request");
            let action = self.evaluate(mr).await?;
            info!(mr_iid = mr.iid, %action, "decided");

            self.apply(mr.iid, &action).await?;

            let stops = action.stops_pass();
            report.outcomes.push(MrOutcome {
                iid: mr.iid,
                action,
            });
            if stops {
                report.stopped_by = Some(mr.iid);
                break;
            }
        }

        info!(
            listed = report.listed,
            candidates = report.candidates,
            merged = ?report.merged(),
            rebased = ?report.rebased(),
            stopped_by = ?report.stopped_by,
            "done"
        );
        Ok(report)
    }

    async fn evaluate(&self, listed: &MergeRequestSummary) -> Result<Action> {
        if self.policy.check_commits {
            let commits = self.platform.list_commits(listed.iid).await?;
            if let Some(commit) =
                find_undeclared_commit(&self.matcher, &listed.description, &commits)
            {
                debug!(mr_iid = listed.iid, commit = %commit.id, title = %commit.title, "undeclared commit");
                return Ok(Action::Skip(SkipReason::UndeclaredCommit));
            }
        }

        let mr = self.platform.get_merge_request(listed.iid).await?;
        let iid = mr.iid;
        decide(&mr, self.policy.missing_pipeline, || {
            self.platform.is_approved(iid)
        })
        .await
    }

    async fn apply(&self, iid: u64, action: &Action) -> Result<()> {
        if !action.is_mutation() {
            return Ok(());
        }
        if self.policy.dry_run {
            info!(mr_iid = iid, %action, "dry run, not executing");
            return Ok(());
        }

        match action {
            Action::Rebase => {
                info!(mr_iid = iid, "rebasing");
                self.platform.rebase(iid).await
            }
            Action::Merge => {
                info!(mr_iid = iid, "merging");
                self.platform.merge(iid).await?;
                info!(mr_iid = iid, "merged, continuing with next merge request");
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PassRunner for MergeTrain {
    async fn run_pass(&self) -> Result<PassReport> {
        Self::run_pass(self).await
    }
}
