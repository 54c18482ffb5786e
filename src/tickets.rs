//! Ticket reference extraction
//!
//! Merge request descriptions declare their tickets as Jira browse links
//! (`https://jira.example.com/browse/REL-10`); commit titles mention the bare
//! key (`REL-10: fix login`). Both patterns are built once from the
//! configured browse URL and project key.

use crate::error::{Error, Result};
use regex::Regex;

/// Extracts ticket keys of one Jira project from free text
#[derive(Debug, Clone)]
pub struct TicketMatcher {
    project: String,
    link: Regex,
    key: Regex,
}

impl TicketMatcher {
    /// Build a matcher for `project` links under `browse_url`
    pub fn new(browse_url: &str, project: &str) -> Result<Self> {
        let project = project.trim();
        if project.is_empty() {
            return Err(Error::Config("Jira project key is empty".to_string()));
        }
        let base = browse_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(Error::Config("Jira browse URL is empty".to_string()));
        }

        let key = format!(r"{}-\d+", regex::escape(project));
        let link = Regex::new(&format!("{}/({key})", regex::escape(base)))?;
        let key = Regex::new(&format!(r"\b({key})"))?;

        Ok(Self {
            project: project.to_string(),
            link,
            key,
        })
    }

    /// Project key this matcher is scoped to
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Ticket keys linked from an MR description, in order of appearance
    ///
    /// Duplicates are kept; an empty result means the MR declares no tickets.
    pub fn description_refs(&self, text: &str) -> Vec<String> {
        self.link
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// First ticket key mentioned in a commit title
    pub fn commit_ref(&self, title: &str) -> Option<String> {
        self.key.captures(title).map(|caps| caps[1].to_string())
    }
}
