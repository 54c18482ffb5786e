//! Error types for release-train

use thiserror::Error;

/// Errors raised by the train and its collaborators
///
/// Ineligible merge requests (conflicts, failed pipelines, missing approvals)
/// are never errors; they surface as skip decisions in a pass report.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// GitLab API returned an error status or an unusable payload
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// Jira API returned an error status or an unusable payload
    #[error("Jira API error: {0}")]
    JiraApi(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ticket pattern failed to compile
    #[error("invalid ticket pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Code-host failure reported by a non-HTTP implementation
    #[error("platform error: {0}")]
    Platform(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
