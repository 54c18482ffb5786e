//! Commit/description consistency
//!
//! Every commit on an MR must name a ticket that the MR description links.
//! This keeps work that was never declared in the description (and so never
//! checked against the release) out of the target branch.

use crate::tickets::TicketMatcher;
use crate::types::Commit;

/// First commit whose ticket is missing or not declared in `description`
///
/// Only the first key in each commit title counts.
pub fn find_undeclared_commit<'a>(
    matcher: &TicketMatcher,
    description: &str,
    commits: &'a [Commit],
) -> Option<&'a Commit> {
    let declared = matcher.description_refs(description);
    commits.iter().find(|commit| {
        matcher
            .commit_ref(&commit.title)
            .is_none_or(|key| !declared.contains(&key))
    })
}

/// Whether every commit references a ticket declared in `description`
///
/// An MR without commits passes.
pub fn commits_match_description(
    matcher: &TicketMatcher,
    description: &str,
    commits: &[Commit],
) -> bool {
    find_undeclared_commit(matcher, description, commits).is_none()
}
