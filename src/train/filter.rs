//! Release filtering - pure functions over already-fetched data
//!
//! An MR is a candidate only when it links at least one ticket and every
//! linked ticket is in the pass's eligible set (and, with a status
//! allow-list, in an allowed status). There is no partial credit.

use crate::tickets::TicketMatcher;
use crate::types::{MergeRequestSummary, Ticket};
use std::collections::HashMap;

/// Tickets that satisfied the release query in this pass, by key
#[derive(Debug, Clone, Default)]
pub struct EligibleSet {
    tickets: HashMap<String, Ticket>,
}

impl EligibleSet {
    /// Index tickets by key
    pub fn new(tickets: impl IntoIterator<Item = Ticket>) -> Self {
        Self {
            tickets: tickets.into_iter().map(|t| (t.key.clone(), t)).collect(),
        }
    }

    /// Look up a ticket
    pub fn get(&self, key: &str) -> Option<&Ticket> {
        self.tickets.get(key)
    }

    /// Whether `key` is eligible
    pub fn contains(&self, key: &str) -> bool {
        self.tickets.contains_key(key)
    }

    /// Number of eligible tickets
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// Whether no ticket is eligible
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

/// Why an MR was left out of the train
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    /// Description links no ticket of the project
    NoTickets,
    /// Linked ticket is not part of the release
    NotInRelease(String),
    /// Linked ticket's status is not allowed
    StatusNotAllowed {
        /// Ticket key
        key: String,
        /// Its current status
        status: String,
    },
}

impl std::fmt::Display for Exclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTickets => write!(f, "no linked tickets"),
            Self::NotInRelease(key) => write!(f, "{key} is not in the release"),
            Self::StatusNotAllowed { key, status } => {
                write!(f, "{key} has status {status:?}")
            }
        }
    }
}

/// Release filter for one pass
#[derive(Debug, Clone, Copy)]
pub struct ReleaseFilter<'a> {
    matcher: &'a TicketMatcher,
    eligible: &'a EligibleSet,
    statuses: &'a [String],
}

impl<'a> ReleaseFilter<'a> {
    /// Filter against `eligible`; an empty `statuses` disables the status gate
    pub const fn new(
        matcher: &'a TicketMatcher,
        eligible: &'a EligibleSet,
        statuses: &'a [String],
    ) -> Self {
        Self {
            matcher,
            eligible,
            statuses,
        }
    }

    /// First reason `mr` is excluded, or `None` for a candidate
    pub fn exclusion(&self, mr: &MergeRequestSummary) -> Option<Exclusion> {
        let refs = self.matcher.description_refs(&mr.description);
        if refs.is_empty() {
            return Some(Exclusion::NoTickets);
        }

        for key in refs {
            let Some(ticket) = self.eligible.get(&key) else {
                return Some(Exclusion::NotInRelease(key));
            };
            if !self.status_allowed(&ticket.status) {
                return Some(Exclusion::StatusNotAllowed {
                    key,
                    status: ticket.status.clone(),
                });
            }
        }
        None
    }

    /// Status names compare case-insensitively, like JQL does
    fn status_allowed(&self, status: &str) -> bool {
        self.statuses.is_empty()
            || self
                .statuses
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(status))
    }

    /// Whether `mr` is fully backed by eligible tickets
    pub fn is_candidate(&self, mr: &MergeRequestSummary) -> bool {
        self.exclusion(mr).is_none()
    }
}

/// Every ticket key linked from any of `mrs`, in listing order
pub fn referenced_keys(matcher: &TicketMatcher, mrs: &[MergeRequestSummary]) -> Vec<String> {
    mrs.iter()
        .flat_map(|mr| matcher.description_refs(&mr.description))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PipelineStatus;
    use chrono::{TimeZone, Utc};

    const BROWSE: &str = "https://jira.example.com/browse";

    fn matcher() -> TicketMatcher {
        TicketMatcher::new(BROWSE, "REL").unwrap()
    }

    fn ticket(key: &str, status: &str) -> Ticket {
        Ticket {
            key: key.to_string(),
            summary: format!("Summary of {key}"),
            status: status.to_string(),
            fix_versions: vec!["1.0".to_string()],
            release_value: Some("1.0".to_string()),
        }
    }

    fn mr_linking(iid: u64, keys: &[&str]) -> MergeRequestSummary {
        let description = keys
            .iter()
            .map(|k| format!("Ticket: {BROWSE}/{k}"))
            .collect::<Vec<_>>()
            .join("\n");
        MergeRequestSummary {
            iid,
            title: format!("MR {iid}"),
            description,
            web_url: format!("https://gitlab.example.com/mr/{iid}"),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            cannot_be_merged: false,
            diverged_commits_count: 0,
            rebase_in_progress: false,
            pipeline: PipelineStatus::Absent,
        }
    }

    #[test]
    fn test_no_references_excluded() {
        let m = matcher();
        let eligible = EligibleSet::new([ticket("REL-10", "Done")]);
        let filter = ReleaseFilter::new(&m, &eligible, &[]);

        let mr = mr_linking(1, &[]);
        assert_eq!(filter.exclusion(&mr), Some(Exclusion::NoTickets));
        assert!(!filter.is_candidate(&mr));
    }

    #[test]
    fn test_all_references_resolved_included() {
        let m = matcher();
        let eligible = EligibleSet::new([ticket("REL-10", "Done"), ticket("REL-11", "Done")]);
        let filter = ReleaseFilter::new(&m, &eligible, &[]);

        assert!(filter.is_candidate(&mr_linking(5, &["REL-10"])));
        assert!(filter.is_candidate(&mr_linking(6, &["REL-10", "REL-11", "REL-10"])));
    }

    #[test]
    fn test_one_unresolved_reference_excludes_whole_mr() {
        let m = matcher();
        let eligible = EligibleSet::new([ticket("REL-10", "Done")]);
        let filter = ReleaseFilter::new(&m, &eligible, &[]);

        let mr = mr_linking(7, &["REL-10", "REL-99"]);
        assert_eq!(
            filter.exclusion(&mr),
            Some(Exclusion::NotInRelease("REL-99".to_string()))
        );
    }

    #[test]
    fn test_status_gate_applies_per_ticket() {
        let m = matcher();
        let eligible = EligibleSet::new([ticket("REL-10", "Done"), ticket("REL-11", "Open")]);
        let statuses = vec!["Done".to_string()];
        let filter = ReleaseFilter::new(&m, &eligible, &statuses);

        assert!(filter.is_candidate(&mr_linking(1, &["REL-10"])));
        assert_eq!(
            filter.exclusion(&mr_linking(2, &["REL-10", "REL-11"])),
            Some(Exclusion::StatusNotAllowed {
                key: "REL-11".to_string(),
                status: "Open".to_string(),
            })
        );
    }

    #[test]
    fn test_status_gate_ignores_case() {
        let m = matcher();
        let eligible = EligibleSet::new([ticket("REL-10", "Ready for Release")]);
        let statuses = vec!["ready FOR release".to_string()];
        let filter = ReleaseFilter::new(&m, &eligible, &statuses);

        assert!(filter.is_candidate(&mr_linking(1, &["REL-10"])));
    }

    #[test]
    fn test_empty_allow_list_disables_status_gate() {
        let m = matcher();
        let eligible = EligibleSet::new([ticket("REL-11", "Anything")]);
        let filter = ReleaseFilter::new(&m, &eligible, &[]);
        assert!(filter.is_candidate(&mr_linking(1, &["REL-11"])));
    }

    #[test]
    fn test_referenced_keys_flattens_in_order() {
        let mrs = vec![mr_linking(1, &["REL-2", "REL-1"]), mr_linking(2, &[]), mr_linking(3, &["REL-2"])];
        assert_eq!(referenced_keys(&matcher(), &mrs), vec!["REL-2", "REL-1", "REL-2"]);
    }

    #[test]
    fn test_eligible_set_lookup() {
        let eligible = EligibleSet::new([ticket("REL-10", "Done")]);
        assert!(eligible.contains("REL-10"));
        assert!(!eligible.contains("REL-1"));
        assert_eq!(eligible.len(), 1);
        assert!(!eligible.is_empty());
        assert!(EligibleSet::default().is_empty());
    }
}
