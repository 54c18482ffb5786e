//! Authentication for GitLab and Jira
//!
//! GitLab takes a personal access token header. Jira takes HTTP Basic,
//! either pre-encoded or built from a user and API token.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;

/// Source of the Jira credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Already base64-encoded `user:token`
    Encoded,
    /// Separate user and token, encoded on use
    UserToken,
}

/// Jira HTTP Basic credential
#[derive(Clone, PartialEq, Eq)]
pub struct JiraCredential {
    encoded: String,
    source: AuthSource,
}

impl JiraCredential {
    /// Use a credential that is already base64-encoded
    pub fn encoded(value: impl Into<String>) -> Self {
        Self {
            encoded: value.into().trim().to_string(),
            source: AuthSource::Encoded,
        }
    }

    /// Encode `user:token`
    pub fn user_token(user: &str, token: &str) -> Self {
        Self {
            encoded: STANDARD.encode(format!("{user}:{token}")),
            source: AuthSource::UserToken,
        }
    }

    /// Where the credential came from
    pub const fn source(&self) -> AuthSource {
        self.source
    }

    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("Basic {}", self.encoded)
    }
}

// Keep secrets out of debug logs.
impl fmt::Debug for JiraCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraCredential")
            .field("source", &self.source)
            .field("encoded", &"<redacted>")
            .finish()
    }
}
