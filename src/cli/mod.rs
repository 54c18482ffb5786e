//! Command-line surface
//!
//! Every setting can come from a flag, an environment variable or the
//! config file, in that order of precedence.

mod run;

pub use run::run;

use clap::Parser;
use release_train::config::{
    MissingPipeline, PartialConfig, PartialGitLab, PartialJira, PartialTrain, parse_status_list,
};
use std::path::PathBuf;

/// Release-scoped merge train for GitLab merge requests backed by Jira tickets
#[derive(Debug, Parser)]
#[command(name = "release-train", version, about)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// TOML config file (defaults to <config dir>/release-train/config.toml)
    #[arg(long, env = "RELEASE_TRAIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,

    /// Decide and log, but never rebase or merge
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,

    /// GitLab API root, e.g. https://gitlab.example.com/api/v4
    #[arg(long, env = "GITLAB_URL")]
    pub gitlab_url: Option<String>,

    /// GitLab personal access token
    #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
    pub gitlab_token: Option<String>,

    /// GitLab project id or path
    #[arg(long, env = "GITLAB_PROJECT_ID")]
    pub gitlab_project_id: Option<String>,

    /// Branch the train merges into
    #[arg(long, env = "GITLAB_BRANCH_NAME")]
    pub branch: Option<String>,

    /// Jira REST API root, e.g. https://jira.example.com/rest/api/2
    #[arg(long, env = "JIRA_URL")]
    pub jira_url: Option<String>,

    /// Base64-encoded `user:token` for Jira basic auth
    #[arg(long, env = "JIRA_AUTH", hide_env_values = true)]
    pub jira_auth: Option<String>,

    /// Jira user (with --jira-token, instead of --jira-auth)
    #[arg(long, env = "JIRA_USER")]
    pub jira_user: Option<String>,

    /// Jira API token
    #[arg(long, env = "JIRA_TOKEN", hide_env_values = true)]
    pub jira_token: Option<String>,

    /// Prefix of ticket links in MR descriptions (derived from --jira-url when unset)
    #[arg(long, env = "JIRA_BROWSE_URL")]
    pub jira_browse_url: Option<String>,

    /// Jira project key
    #[arg(long, env = "JIRA_PROJECT_ID")]
    pub jira_project: Option<String>,

    /// Release the train collects
    #[arg(long, env = "JIRA_RELEASE_NAME")]
    pub release: Option<String>,

    /// Jira field holding the release (default: fixVersion)
    #[arg(long, env = "JIRA_FIELD_NAME")]
    pub release_field: Option<String>,

    /// Comma-separated allowed ticket statuses
    #[arg(long, env = "JIRA_STATUS")]
    pub statuses: Option<String>,

    /// Also accept tickets whose release field is empty
    #[arg(long, env = "ALLOW_EMPTY_JIRA_FIELD")]
    pub allow_empty_field: bool,

    /// Seconds between passes (default: 60)
    #[arg(long, env = "POLL_INTERVAL_SECS")]
    pub poll_interval_secs: Option<u64>,

    /// What to do with an MR that has no pipeline (default: skip)
    #[arg(long, value_enum, env = "MISSING_PIPELINE")]
    pub missing_pipeline: Option<MissingPipeline>,

    /// Do not require commits to reference the description's tickets
    #[arg(long, env = "SKIP_COMMIT_CHECK")]
    pub skip_commit_check: bool,
}

impl Cli {
    /// Flags and environment as the highest-priority config layer
    ///
    /// Unset switches stay `None` so the config file can still set them.
    pub fn to_partial(&self) -> PartialConfig {
        PartialConfig {
            gitlab: PartialGitLab {
                url: self.gitlab_url.clone(),
                token: self.gitlab_token.clone(),
                project_id: self.gitlab_project_id.clone(),
                branch: self.branch.clone(),
            },
            jira: PartialJira {
                url: self.jira_url.clone(),
                auth: self.jira_auth.clone(),
                user: self.jira_user.clone(),
                token: self.jira_token.clone(),
                browse_url: self.jira_browse_url.clone(),
                project: self.jira_project.clone(),
                release: self.release.clone(),
                field: self.release_field.clone(),
                allow_empty_field: self.allow_empty_field.then_some(true),
                statuses: self.statuses.as_deref().map(parse_status_list),
            },
            train: PartialTrain {
                poll_interval_secs: self.poll_interval_secs,
                missing_pipeline: self.missing_pipeline,
                check_commits: self.skip_commit_check.then_some(false),
                dry_run: self.dry_run.then_some(true),
            },
        }
    }
}
