//! Shared fixtures for release-train tests

#![allow(dead_code)]

mod mock_platform;
mod mock_tracker;

pub use mock_platform::MockPlatformService;
pub use mock_tracker::MockTracker;

use chrono::{DateTime, Duration, TimeZone, Utc};
use release_train::auth::JiraCredential;
use release_train::config::{GitLabConfig, JiraConfig, TrainConfig, TrainPolicy};
use release_train::types::{Commit, MergeRequestSummary, PipelineStatus, Ticket};

/// Ticket link prefix used by every fixture
pub const BROWSE_URL: &str = "https://jira.example.com/browse";

/// Jira project used by every fixture
pub const PROJECT: &str = "REL";

/// Release used by every fixture
pub const RELEASE: &str = "1.4.0";

/// Config for a train on `main` collecting release 1.4.0 of REL
pub fn test_config() -> TrainConfig {
    TrainConfig {
        gitlab: GitLabConfig {
            base_url: "https://gitlab.example.com/api/v4".to_string(),
            token: "glpat-test".to_string(),
            project_id: "group/app".to_string(),
            target_branch: "main".to_string(),
        },
        jira: JiraConfig {
            base_url: "https://jira.example.com/rest/api/2".to_string(),
            credential: JiraCredential::user_token("bot", "s3cret"),
            browse_url: BROWSE_URL.to_string(),
            project_key: PROJECT.to_string(),
            release: Some(RELEASE.to_string()),
            release_field: "fixVersion".to_string(),
            allow_empty_release_field: false,
            statuses: vec!["Ready".to_string()],
        },
        policy: TrainPolicy::default(),
        poll_interval: std::time::Duration::from_secs(60),
    }
}

/// Fixed clock origin for `created_at`
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

/// Description linking each of `keys`
pub fn description_for(keys: &[&str]) -> String {
    keys.iter()
        .map(|k| format!("- {BROWSE_URL}/{k}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Mergeable MR declaring `keys`: green pipeline, up to date, no conflict
///
/// `created_at` is `iid` minutes after [`epoch`], so lower iids are older.
pub fn make_mr(iid: u64, keys: &[&str]) -> MergeRequestSummary {
    MergeRequestSummary {
        iid,
        title: format!("MR {iid}"),
        description: description_for(keys),
        web_url: format!("https://gitlab.example.com/group/app/-/merge_requests/{iid}"),
        created_at: epoch() + Duration::minutes(i64::try_from(iid).unwrap()),
        cannot_be_merged: false,
        diverged_commits_count: 0,
        rebase_in_progress: false,
        pipeline: PipelineStatus::Success,
    }
}

/// One commit per key, titled `<key>: change`
pub fn commits_for(keys: &[&str]) -> Vec<Commit> {
    keys.iter()
        .enumerate()
        .map(|(i, k)| Commit {
            id: format!("{i:040x}"),
            title: format!("{k}: change"),
        })
        .collect()
}

/// Ticket in `status` planned for the fixture release
pub fn ticket(key: &str, status: &str) -> Ticket {
    Ticket {
        key: key.to_string(),
        summary: format!("Ticket {key}"),
        status: status.to_string(),
        fix_versions: vec![RELEASE.to_string()],
        release_value: Some(RELEASE.to_string()),
    }
}
