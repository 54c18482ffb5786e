//! Jira issue tracker implementation

use crate::auth::JiraCredential;
use crate::config::JiraConfig;
use crate::error::{Error, Result};
use crate::tracker::{IssueTracker, ReleaseClause, TicketQuery};
use crate::types::Ticket;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Jira service using reqwest
pub struct JiraService {
    client: Client,
    credential: JiraCredential,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchPayload<'a> {
    jql: &'a str,
    start_at: usize,
    max_results: usize,
    // Unknown or hidden keys must not fail the whole query.
    validate_query: &'static str,
    fields: &'a [String],
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: Option<usize>,
    issues: Vec<Issue>,
}

#[derive(Deserialize)]
struct Issue {
    key: String,
    fields: IssueFields,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueFields {
    #[serde(default)]
    summary: Option<String>,
    status: Option<NamedValue>,
    #[serde(default)]
    fix_versions: Vec<NamedValue>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

#[derive(Deserialize)]
struct NamedValue {
    name: String,
}

impl Issue {
    /// Convert to a ticket, reading the release from `release_field` (a REST field id)
    fn into_ticket(self, release_field: Option<&str>) -> Ticket {
        let fields = self.fields;
        let fix_versions: Vec<String> = fields.fix_versions.into_iter().map(|v| v.name).collect();
        let release_value = match release_field {
            Some("fixVersions") => (!fix_versions.is_empty()).then(|| fix_versions.join(", ")),
            Some(id) => fields.other.get(id).and_then(field_text),
            None => None,
        };

        Ticket {
            key: self.key,
            summary: fields.summary.unwrap_or_default(),
            status: fields.status.map(|s| s.name).unwrap_or_default(),
            fix_versions,
            release_value,
        }
    }
}

/// Display text of a field value
///
/// Select lists and versions are objects with `value` or `name`;
/// multi-value fields are joined.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(field_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Object(map) => map
            .get("value")
            .or_else(|| map.get("name"))
            .and_then(field_text),
    }
}

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Requested page size; Jira may return fewer
const MAX_RESULTS: usize = 1000;

/// Fields every search asks for
const BASE_FIELDS: [&str; 3] = ["summary", "status", "fixVersions"];

impl JiraService {
    /// Create a new Jira service
    pub fn new(config: &JiraConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::JiraApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            credential: config.credential.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl IssueTracker for JiraService {
    async fn search_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>> {
        if query.keys.is_empty() {
            debug!("no ticket keys to look up");
            return Ok(Vec::new());
        }

        let jql = query.to_jql();
        debug!(%jql, "searching tickets");
        let url = self.api_url("/search");
        let release_field = query.release.as_ref().map(ReleaseClause::api_field);
        let mut fields: Vec<String> = BASE_FIELDS.iter().map(ToString::to_string).collect();
        if let Some(field) = &release_field
            && !fields.contains(field)
        {
            fields.push(field.clone());
        }
        let mut tickets: Vec<Ticket> = Vec::new();

        loop {
            let payload = SearchPayload {
                jql: &jql,
                start_at: tickets.len(),
                max_results: MAX_RESULTS,
                validate_query: "warn",
                fields: &fields,
            };

            let page: SearchResponse = self
                .client
                .post(&url)
                .header("Authorization", self.credential.header_value())
                .json(&payload)
                .send()
                .await?
                .error_for_status()
                .map_err(|e| Error::JiraApi(e.to_string()))?
                .json()
                .await?;

            let received = page.issues.len();
            tickets.extend(
                page.issues
                    .into_iter()
                    .map(|issue| issue.into_ticket(release_field.as_deref())),
            );

            let total = page.total.unwrap_or(tickets.len());
            if received == 0 || tickets.len() >= total {
                break;
            }
        }

        debug!(count = tickets.len(), "found tickets");
        Ok(tickets)
    }
}
