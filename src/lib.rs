//! release-train: a release-scoped merge train for GitLab
//!
//! Polls the open merge requests of one target branch, keeps the ones whose
//! Jira tickets all belong to the configured release, and advances them one
//! at a time through rebase, pipeline and approval gates until they merge.

pub mod auth;
pub mod config;
pub mod error;
pub mod platform;
pub mod scheduler;
pub mod tickets;
pub mod tracker;
pub mod train;
pub mod types;
