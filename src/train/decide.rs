//! Per-MR decision - the train's state machine
//!
//! Signals are checked in a fixed priority order and the first match wins:
//! conflict, missing pipeline, failed pipeline, approval, divergence, running
//! pipeline, successful pipeline. Reordering changes which MRs move.

use crate::config::MissingPipeline;
use crate::error::Result;
use crate::types::{MergeRequestSummary, PipelineStatus};
use std::future::Future;

/// Why an MR was passed over in this pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A commit references no ticket, or one the description does not link
    UndeclaredCommit,
    /// Code host reports a merge conflict
    Conflict,
    /// No pipeline exists for the MR
    NoPipeline,
    /// Head pipeline failed
    PipelineFailed,
    /// Approval rules not satisfied
    NotApproved,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UndeclaredCommit => write!(f, "commits do not match description"),
            Self::Conflict => write!(f, "cannot be merged"),
            Self::NoPipeline => write!(f, "no pipeline"),
            Self::PipelineFailed => write!(f, "pipeline failed"),
            Self::NotApproved => write!(f, "not approved"),
        }
    }
}

/// Why the pass stopped without a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    /// Head pipeline is still running
    PipelineRunning,
    /// No pipeline, and the policy halts on that
    NoPipeline,
}

impl std::fmt::Display for WaitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PipelineRunning => write!(f, "pipeline running"),
            Self::NoPipeline => write!(f, "no pipeline"),
        }
    }
}

/// What the train does with one MR
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Leave the MR alone and evaluate the next one
    Skip(SkipReason),
    /// Rebase onto the target branch, then end the pass
    Rebase,
    /// End the pass without touching anything
    Wait(WaitReason),
    /// Merge, then evaluate the next one
    Merge,
    /// Pipeline in a state the train does not act on; evaluate the next one
    NoOp(PipelineStatus),
}

impl Action {
    /// Whether no further MR may be evaluated in this pass
    pub const fn stops_pass(&self) -> bool {
        matches!(self, Self::Rebase | Self::Wait(_))
    }

    /// Whether the action changes state on the code host
    pub const fn is_mutation(&self) -> bool {
        matches!(self, Self::Rebase | Self::Merge)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip(reason) => write!(f, "skip ({reason})"),
            Self::Rebase => write!(f, "rebase"),
            Self::Wait(reason) => write!(f, "wait ({reason})"),
            Self::Merge => write!(f, "merge"),
            Self::NoOp(status) => write!(f, "no-op (pipeline {status})"),
        }
    }
}

/// Whether the MR is behind its target and no rebase is running yet
pub const fn needs_rebase(mr: &MergeRequestSummary) -> bool {
    mr.diverged_commits_count > 0 && !mr.rebase_in_progress
}

/// Decide the action for a freshly fetched MR
///
/// `approval` is only awaited once the conflict and pipeline checks have
/// passed, so skipped MRs cost no approval lookup.
pub async fn decide<F, Fut>(
    mr: &MergeRequestSummary,
    missing_pipeline: MissingPipeline,
    approval: F,
) -> Result<Action>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    if mr.cannot_be_merged {
        return Ok(Action::Skip(SkipReason::Conflict));
    }

    match (&mr.pipeline, missing_pipeline) {
        (PipelineStatus::Absent, MissingPipeline::Skip) => {
            return Ok(Action::Skip(SkipReason::NoPipeline));
        }
        (PipelineStatus::Absent, MissingPipeline::Halt) => {
            return Ok(Action::Wait(WaitReason::NoPipeline));
        }
        (PipelineStatus::Failed, _) => return Ok(Action::Skip(SkipReason::PipelineFailed)),
        _ => {}
    }

    if !approval().await? {
        return Ok(Action::Skip(SkipReason::NotApproved));
    }

    if needs_rebase(mr) {
        return Ok(Action::Rebase);
    }

    Ok(match &mr.pipeline {
        PipelineStatus::Running => Action::Wait(WaitReason::PipelineRunning),
        PipelineStatus::Success => Action::Merge,
        other => Action::NoOp(other.clone()),
    })
}
