//! Issue tracker services
//!
//! The train asks the tracker one question per pass: which of these ticket
//! keys belong to the release and are in an acceptable status.

mod jira;

pub use jira::JiraService;

use crate::config::JiraConfig;
use crate::error::Result;
use crate::types::Ticket;
use async_trait::async_trait;

/// Issue tracker trait for release-scoped ticket lookups
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Tickets matching `query`
    ///
    /// Implementations return an empty list without a request when
    /// `query.keys` is empty.
    async fn search_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>>;
}

/// Release query over a set of ticket keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketQuery {
    /// Jira project key
    pub project: String,
    /// Allowed statuses; empty requires only that a status is set
    pub statuses: Vec<String>,
    /// Release field and value to match, if any
    pub release: Option<ReleaseClause>,
    /// Keys to restrict the search to
    pub keys: Vec<String>,
}

/// Release field clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseClause {
    /// Field name, e.g. `fixVersion` or a custom field
    pub field: String,
    /// Release name the field must equal
    pub value: String,
    /// Also accept tickets with the field unset
    pub allow_empty: bool,
}

impl TicketQuery {
    /// Query for `keys` scoped by the configured project, release and statuses
    ///
    /// Keys are deduplicated, keeping first-seen order.
    pub fn for_release(config: &JiraConfig, keys: &[String]) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(keys.len());
        for key in keys {
            if !unique.contains(key) {
                unique.push(key.clone());
            }
        }

        Self {
            project: config.project_key.clone(),
            statuses: config.statuses.clone(),
            release: config.release.as_ref().map(|value| ReleaseClause {
                field: config.release_field.clone(),
                value: value.clone(),
                allow_empty: config.allow_empty_release_field,
            }),
            keys: unique,
        }
    }

    /// Render the query as JQL
    pub fn to_jql(&self) -> String {
        let mut clauses = vec![format!("project = {}", quote(&self.project))];

        if self.statuses.is_empty() {
            clauses.push("status is not EMPTY".to_string());
        } else {
            let statuses: Vec<String> = self.statuses.iter().map(|s| quote(s)).collect();
            clauses.push(format!("status in ({})", statuses.join(", ")));
        }

        if let Some(release) = &self.release {
            let field = field_ref(&release.field);
            let matches = format!("{field} = {}", quote(&release.value));
            if release.allow_empty {
                clauses.push(format!("({field} is EMPTY OR {matches})"));
            } else {
                clauses.push(matches);
            }
        }

        clauses.push(format!("key in ({})", self.keys.join(", ")));
        clauses.join(" AND ")
    }
}

impl ReleaseClause {
    /// Id the REST API reports this field under
    pub fn api_field(&self) -> String {
        api_field_id(&self.field)
    }
}

/// REST field id for a JQL field name
///
/// `fixVersion` comes back as `fixVersions` and `cf[10010]` as
/// `customfield_10010`; anything else is assumed to be an id already.
pub fn api_field_id(name: &str) -> String {
    if name.eq_ignore_ascii_case("fixVersion") {
        return "fixVersions".to_string();
    }
    custom_field_id(name).map_or_else(|| name.to_string(), |id| format!("customfield_{id}"))
}

fn custom_field_id(name: &str) -> Option<&str> {
    name.strip_prefix("cf[")?
        .strip_suffix(']')
        .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}

/// Field reference for JQL
///
/// Ids and `cf[N]` stay bare; display names with spaces or punctuation are
/// quoted.
fn field_ref(name: &str) -> String {
    let bare = !name.is_empty()
        && (custom_field_id(name).is_some()
            || name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.'));
    if bare { name.to_string() } else { quote(name) }
}

/// Quote a JQL string literal
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
