use thiserror::Error;

/// Failures surfaced by the GitHub REST API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitHubError {
    #[error("Token is invalid or expired")]
    Auth,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Network(String),

    #[error("Rate limited by API")]
    RateLimited,

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GitHubError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GitHubError::Parse(e.to_string())
        } else {
            GitHubError::Network(e.to_string())
        }
    }
}

pub type GitHubResult<T> = Result<T, GitHubError>;
