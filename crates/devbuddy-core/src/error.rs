use github_client::GitHubError;
use thiserror::Error;

use crate::repositories::RepositoryError;
use crate::services::StreamError;

/// Failures of a user-triggered action.
///
/// Every variant is caught at the controller boundary and turned into a
/// [`Notice`](crate::controllers::Notice) or a chat message; none of them end
/// the session.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid or expired token")]
    Auth,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("Invalid repository reference: {0}")]
    InvalidRepository(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Persistence(#[from] RepositoryError),
}

impl From<GitHubError> for AppError {
    fn from(e: GitHubError) -> Self {
        match e {
            GitHubError::Auth => AppError::Auth,
            GitHubError::NotFound(what) => AppError::NotFound(what),
            other => AppError::Network(other.to_string()),
        }
    }
}

impl AppError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth => "Invalid token or connection error.".to_string(),
            AppError::Network(_) => {
                "Could not reach GitHub. Check your connection and try again.".to_string()
            }
            AppError::NotFound(what) => {
                format!("\"{what}\" was not found or you don't have access to it.")
            }
            AppError::Stream(_) => {
                "Connection to the assistant failed. Please try again.".to_string()
            }
            AppError::InvalidRepository(input) => {
                format!("\"{input}\" is not a repository reference. Use owner/name.")
            }
            AppError::NotAuthenticated => "Sign in with a GitHub token first.".to_string(),
            AppError::Persistence(e) => format!("Could not save local state: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_errors_map_to_taxonomy() {
        assert!(matches!(AppError::from(GitHubError::Auth), AppError::Auth));
        assert!(matches!(
            AppError::from(GitHubError::NotFound("a/b".into())),
            AppError::NotFound(ref what) if what == "a/b"
        ));
        assert!(matches!(
            AppError::from(GitHubError::RateLimited),
            AppError::Network(_)
        ));
        assert!(matches!(
            AppError::from(GitHubError::Parse("bad json".into())),
            AppError::Network(_)
        ));
    }

    #[test]
    fn test_not_found_message_names_target() {
        let msg = AppError::NotFound("octocat/missing".into()).user_message();
        assert!(msg.contains("octocat/missing"));
    }
}
