//! Train configuration
//!
//! The process builds one immutable [`TrainConfig`] at start-up from CLI
//! flags, environment variables and an optional TOML file, then hands it to
//! every component by reference. Nothing reads the environment afterwards.

use crate::auth::JiraCredential;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Directory name under the user config dir
const CONFIG_DIR: &str = "release-train";

/// Filename for the config file
const CONFIG_FILE: &str = "config.toml";

/// Default seconds between passes
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default Jira field holding the release
pub const DEFAULT_RELEASE_FIELD: &str = "fixVersion";

/// What to do with a candidate MR that has no pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingPipeline {
    /// Skip the MR and keep evaluating the queue
    #[default]
    Skip,
    /// Stop the pass; nothing behind the MR is touched
    Halt,
}

/// GitLab connection and target
#[derive(Debug, Clone)]
pub struct GitLabConfig {
    /// API root, e.g. `https://gitlab.example.com/api/v4`
    pub base_url: String,
    /// Personal access token
    pub token: String,
    /// Numeric project id or `group/project` path
    pub project_id: String,
    /// Branch the train merges into
    pub target_branch: String,
}

/// Jira connection and release scope
#[derive(Debug, Clone)]
pub struct JiraConfig {
    /// REST API root, e.g. `https://jira.example.com/rest/api/2`
    pub base_url: String,
    /// Basic auth credential
    pub credential: JiraCredential,
    /// Prefix of ticket links in MR descriptions
    pub browse_url: String,
    /// Jira project key (`REL` in `REL-10`)
    pub project_key: String,
    /// Release the train is collecting; no release clause when unset
    pub release: Option<String>,
    /// Field the release is stored in
    pub release_field: String,
    /// Also accept tickets whose release field is empty
    pub allow_empty_release_field: bool,
    /// Allowed status names; empty means "any status"
    pub statuses: Vec<String>,
}

/// Knobs for the decision engine
#[derive(Debug, Clone, Copy)]
pub struct TrainPolicy {
    /// Handling of MRs without a pipeline
    pub missing_pipeline: MissingPipeline,
    /// Require every commit to reference a ticket from the description
    pub check_commits: bool,
    /// Decide and log, but never rebase or merge
    pub dry_run: bool,
}

impl Default for TrainPolicy {
    fn default() -> Self {
        Self {
            missing_pipeline: MissingPipeline::Skip,
            check_commits: true,
            dry_run: false,
        }
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// GitLab side
    pub gitlab: GitLabConfig,
    /// Jira side
    pub jira: JiraConfig,
    /// Decision policy
    pub policy: TrainPolicy,
    /// Time between pass starts
    pub poll_interval: Duration,
}

/// `[gitlab]` section, every value optional until resolved
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialGitLab {
    /// API root
    pub url: Option<String>,
    /// Access token
    pub token: Option<String>,
    /// Project id or path
    pub project_id: Option<String>,
    /// Target branch
    pub branch: Option<String>,
}

/// `[jira]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialJira {
    /// REST API root
    pub url: Option<String>,
    /// Pre-encoded basic credential
    pub auth: Option<String>,
    /// User for user/token auth
    pub user: Option<String>,
    /// API token for user/token auth
    pub token: Option<String>,
    /// Ticket link prefix
    pub browse_url: Option<String>,
    /// Project key
    pub project: Option<String>,
    /// Release name
    pub release: Option<String>,
    /// Release field name
    pub field: Option<String>,
    /// Accept an empty release field
    pub allow_empty_field: Option<bool>,
    /// Status allow-list
    pub statuses: Option<Vec<String>>,
}

/// `[train]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialTrain {
    /// Seconds between passes
    pub poll_interval_secs: Option<u64>,
    /// Missing pipeline policy
    pub missing_pipeline: Option<MissingPipeline>,
    /// Commit consistency check toggle
    pub check_commits: Option<bool>,
    /// Dry-run toggle
    pub dry_run: Option<bool>,
}

/// Configuration layer before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    /// GitLab values
    #[serde(default)]
    pub gitlab: PartialGitLab,
    /// Jira values
    #[serde(default)]
    pub jira: PartialJira,
    /// Train values
    #[serde(default)]
    pub train: PartialTrain,
}

impl PartialConfig {
    /// Fill every unset value from `lower`
    #[must_use]
    pub fn or(self, lower: Self) -> Self {
        Self {
            gitlab: PartialGitLab {
                url: self.gitlab.url.or(lower.gitlab.url),
                token: self.gitlab.token.or(lower.gitlab.token),
                project_id: self.gitlab.project_id.or(lower.gitlab.project_id),
                branch: self.gitlab.branch.or(lower.gitlab.branch),
            },
            jira: PartialJira {
                url: self.jira.url.or(lower.jira.url),
                auth: self.jira.auth.or(lower.jira.auth),
                user: self.jira.user.or(lower.jira.user),
                token: self.jira.token.or(lower.jira.token),
                browse_url: self.jira.browse_url.or(lower.jira.browse_url),
                project: self.jira.project.or(lower.jira.project),
                release: self.jira.release.or(lower.jira.release),
                field: self.jira.field.or(lower.jira.field),
                allow_empty_field: self.jira.allow_empty_field.or(lower.jira.allow_empty_field),
                statuses: self.jira.statuses.or(lower.jira.statuses),
            },
            train: PartialTrain {
                poll_interval_secs: self
                    .train
                    .poll_interval_secs
                    .or(lower.train.poll_interval_secs),
                missing_pipeline: self.train.missing_pipeline.or(lower.train.missing_pipeline),
                check_commits: self.train.check_commits.or(lower.train.check_commits),
                dry_run: self.train.dry_run.or(lower.train.dry_run),
            },
        }
    }

    /// Validate and build the final configuration
    pub fn resolve(self) -> Result<TrainConfig> {
        let gitlab = GitLabConfig {
            base_url: validated_url("gitlab.url", required("gitlab.url", self.gitlab.url)?)?,
            token: required("gitlab.token", self.gitlab.token)?,
            project_id: required("gitlab.project_id", self.gitlab.project_id)?,
            target_branch: required("gitlab.branch", self.gitlab.branch)?,
        };

        let jira_url = validated_url("jira.url", required("jira.url", self.jira.url)?)?;
        let credential = match (self.jira.auth, self.jira.user, self.jira.token) {
            (Some(encoded), _, _) if !encoded.trim().is_empty() => {
                JiraCredential::encoded(encoded)
            }
            (_, Some(user), Some(token)) => JiraCredential::user_token(&user, &token),
            _ => {
                return Err(Error::Config(
                    "missing Jira credential: set jira.auth, or jira.user and jira.token"
                        .to_string(),
                ));
            }
        };
        let browse_url = match self.jira.browse_url {
            Some(url) => validated_url("jira.browse_url", url)?,
            None => derive_browse_url(&jira_url)?,
        };

        let jira = JiraConfig {
            base_url: jira_url,
            credential,
            browse_url,
            project_key: required("jira.project", self.jira.project)?,
            release: self.jira.release.filter(|r| !r.trim().is_empty()),
            release_field: self
                .jira
                .field
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_RELEASE_FIELD.to_string()),
            allow_empty_release_field: self.jira.allow_empty_field.unwrap_or(false),
            statuses: self
                .jira
                .statuses
                .unwrap_or_default()
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        let secs = self
            .train
            .poll_interval_secs
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        if secs == 0 {
            return Err(Error::Config(
                "train.poll_interval_secs must be greater than zero".to_string(),
            ));
        }

        let defaults = TrainPolicy::default();
        let policy = TrainPolicy {
            missing_pipeline: self
                .train
                .missing_pipeline
                .unwrap_or(defaults.missing_pipeline),
            check_commits: self.train.check_commits.unwrap_or(defaults.check_commits),
            dry_run: self.train.dry_run.unwrap_or(defaults.dry_run),
        };

        Ok(TrainConfig {
            gitlab,
            jira,
            policy,
            poll_interval: Duration::from_secs(secs),
        })
    }
}

/// Split a comma-separated status list (`In Review, 'Done'`)
///
/// Surrounding quotes are dropped so JQL-style lists are accepted too.
pub fn parse_status_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_matches(|c: char| c == '\'' || c == '"').trim())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Default config file location, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load a TOML config file
pub fn load_config_file(path: &Path) -> Result<PartialConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Derive the ticket link prefix from the REST root
///
/// `https://host/jira/rest/api/2` becomes `https://host/jira/browse`.
pub fn derive_browse_url(api_url: &str) -> Result<String> {
    let Some(idx) = api_url.find("/rest/") else {
        return Err(Error::Config(format!(
            "cannot derive jira.browse_url from {api_url}; set it explicitly"
        )));
    };
    Ok(format!("{}/browse", &api_url[..idx]))
}

fn required(key: &str, value: Option<String>) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("missing required value {key}")))
}

fn validated_url(key: &str, value: String) -> Result<String> {
    let parsed = Url::parse(&value).map_err(|e| Error::Config(format!("invalid {key}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "invalid {key}: unsupported scheme {}",
            parsed.scheme()
        )));
    }
    Ok(value.trim_end_matches('/').to_string())
}
