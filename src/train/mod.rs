//! Merge train engine
//!
//! A pass runs in three phases:
//! 1. Select - list open MRs, look up their tickets, keep release-backed ones (pure filter)
//! 2. Decide - per MR, commit consistency then the priority-ordered state machine
//! 3. Drive - issue rebase/merge calls, ending the pass on rebase or wait

mod consistency;
mod decide;
mod drive;
mod filter;

pub use consistency::{commits_match_description, find_undeclared_commit};
pub use decide::{Action, SkipReason, WaitReason, decide, needs_rebase};
pub use drive::{MergeTrain, MrOutcome, PassReport};
pub use filter::{EligibleSet, Exclusion, ReleaseFilter, referenced_keys};
