use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use tracing::{debug, info, warn};

use crate::classify::is_binary;
use crate::error::{GitHubError, GitHubResult};
use crate::models::{
    GitHubRepo, GitHubUser, GitTreeItem, RepoDetails, RepoRef, TreeItemKind, TreeResponse,
};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";
const FALLBACK_BRANCH: &str = "main";
const REPOS_PAGE_SIZE: &str = "100";

/// Characters escaped inside a single path segment. `/` is kept so nested
/// repository paths map onto URL segments.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Boxed future returned by every [`RepositoryHost`] call.
pub type HostFuture<T> = Pin<Box<dyn Future<Output = GitHubResult<T>> + Send>>;

/// Remote repository capabilities consumed by the workspace.
///
/// Object-safe so controllers can hold an `Arc<dyn RepositoryHost>` and tests
/// can substitute an in-memory host.
pub trait RepositoryHost: Send + Sync {
    /// Validate a credential and return the profile it belongs to.
    fn validate_token(&self, token: &str) -> HostFuture<GitHubUser>;

    /// Up to 100 most recently updated repositories visible to the token.
    fn list_repos(&self, token: &str) -> HostFuture<Vec<GitHubRepo>>;

    /// Flat recursive listing of text blobs on `branch`.
    ///
    /// When `branch` is `None` the repository's default branch is resolved
    /// first, falling back to `main` if that lookup fails.
    fn fetch_tree(
        &self,
        repo: &RepoRef,
        token: &str,
        branch: Option<&str>,
    ) -> HostFuture<Vec<GitTreeItem>>;

    /// Raw content of one file on the default branch.
    fn fetch_file_content(&self, repo: &RepoRef, path: &str, token: &str) -> HostFuture<String>;
}

/// [`RepositoryHost`] backed by the GitHub REST API v3.
#[derive(Clone)]
pub struct GitHubClient {
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GitHubClient {
    pub fn new() -> GitHubResult<Self> {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    /// Point the client at another API root (GitHub Enterprise, mock servers).
    pub fn with_base_url(base_url: impl Into<String>) -> GitHubResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("devbuddy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, url: &str, token: &str, accept: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(token)
            .header(ACCEPT, accept)
    }

    fn is_rate_limited(response: &reqwest::Response) -> bool {
        response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(|s| s == "0")
            .unwrap_or(false)
    }

    /// Map non-success statuses onto the host error taxonomy.
    fn check_status(response: reqwest::Response, what: &str) -> GitHubResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
                if Self::is_rate_limited(&response) =>
            {
                Err(GitHubError::RateLimited)
            }
            StatusCode::UNAUTHORIZED => Err(GitHubError::Auth),
            StatusCode::NOT_FOUND => Err(GitHubError::NotFound(what.to_string())),
            other => Err(GitHubError::Network(format!(
                "API returned status {other} for {what}"
            ))),
        }
    }

    async fn fetch_user(&self, token: &str) -> GitHubResult<GitHubUser> {
        let url = format!("{}/user", self.base_url);
        debug!(url = %url, "Validating token");

        let response = self.get(&url, token, JSON_MEDIA_TYPE).send().await?;
        if response.status() == StatusCode::FORBIDDEN && !Self::is_rate_limited(&response) {
            return Err(GitHubError::Auth);
        }
        let response = Self::check_status(response, "user")?;

        let user: GitHubUser = response
            .json()
            .await
            .map_err(|e| GitHubError::Parse(e.to_string()))?;
        info!(login = %user.login, "Token validated");
        Ok(user)
    }

    async fn fetch_repos(&self, token: &str) -> GitHubResult<Vec<GitHubRepo>> {
        let url = format!("{}/user/repos", self.base_url);
        let response = self
            .get(&url, token, JSON_MEDIA_TYPE)
            .query(&[("sort", "updated"), ("per_page", REPOS_PAGE_SIZE)])
            .send()
            .await?;
        let response = Self::check_status(response, "repository list")?;

        let repos: Vec<GitHubRepo> = response
            .json()
            .await
            .map_err(|e| GitHubError::Parse(e.to_string()))?;
        debug!(count = repos.len(), "Fetched repositories");
        Ok(repos)
    }

    /// Default branch of the repository, or `main` if it can't be resolved.
    async fn resolve_default_branch(&self, repo: &RepoRef, token: &str) -> String {
        let url = format!("{}/repos/{}/{}", self.base_url, repo.owner, repo.name);

        let resolved = async {
            let response = self.get(&url, token, JSON_MEDIA_TYPE).send().await?;
            let response = Self::check_status(response, &repo.full_name())?;
            let details: RepoDetails = response
                .json()
                .await
                .map_err(|e| GitHubError::Parse(e.to_string()))?;
            Ok::<String, GitHubError>(details.default_branch)
        }
        .await;

        match resolved {
            Ok(branch) => branch,
            Err(e) => {
                warn!(repo = %repo, error = %e, "Could not resolve default branch, using main");
                FALLBACK_BRANCH.to_string()
            }
        }
    }

    async fn fetch_tree_items(
        &self,
        repo: &RepoRef,
        token: &str,
        branch: Option<&str>,
    ) -> GitHubResult<Vec<GitTreeItem>> {
        let target_ref = match branch {
            Some(branch) => branch.to_string(),
            None => self.resolve_default_branch(repo, token).await,
        };

        let url = format!(
            "{}/repos/{}/{}/git/trees/{}",
            self.base_url,
            repo.owner,
            repo.name,
            utf8_percent_encode(&target_ref, PATH_SEGMENT)
        );
        debug!(url = %url, "Fetching repository tree");

        let response = self
            .get(&url, token, JSON_MEDIA_TYPE)
            .query(&[("recursive", "1")])
            .send()
            .await?;
        let response = Self::check_status(response, &format!("{repo}@{target_ref}"))?;

        let body: TreeResponse = response
            .json()
            .await
            .map_err(|e| GitHubError::Parse(e.to_string()))?;

        if body.truncated {
            warn!(repo = %repo, "Repository tree truncated by host (too large)");
        }

        let items: Vec<GitTreeItem> = body
            .tree
            .into_iter()
            .filter(|item| item.kind == TreeItemKind::Blob)
            .filter(|item| !is_binary(&item.path))
            .collect();

        info!(repo = %repo, branch = %target_ref, count = items.len(), "Fetched repository tree");
        Ok(items)
    }

    async fn fetch_raw(&self, repo: &RepoRef, path: &str, token: &str) -> GitHubResult<String> {
        let encoded_path = utf8_percent_encode(path.trim_start_matches('/'), PATH_SEGMENT);
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url, repo.owner, repo.name, encoded_path
        );
        debug!(url = %url, "Fetching file content");

        let response = self.get(&url, token, RAW_MEDIA_TYPE).send().await?;
        let response = Self::check_status(response, path)?;
        Ok(response.text().await?)
    }
}

impl RepositoryHost for GitHubClient {
    fn validate_token(&self, token: &str) -> HostFuture<GitHubUser> {
        let this = self.clone();
        let token = token.to_string();
        Box::pin(async move { this.fetch_user(&token).await })
    }

    fn list_repos(&self, token: &str) -> HostFuture<Vec<GitHubRepo>> {
        let this = self.clone();
        let token = token.to_string();
        Box::pin(async move { this.fetch_repos(&token).await })
    }

    fn fetch_tree(
        &self,
        repo: &RepoRef,
        token: &str,
        branch: Option<&str>,
    ) -> HostFuture<Vec<GitTreeItem>> {
        let this = self.clone();
        let repo = repo.clone();
        let token = token.to_string();
        let branch = branch.map(str::to_string);
        Box::pin(async move { this.fetch_tree_items(&repo, &token, branch.as_deref()).await })
    }

    fn fetch_file_content(&self, repo: &RepoRef, path: &str, token: &str) -> HostFuture<String> {
        let this = self.clone();
        let repo = repo.clone();
        let path = path.to_string();
        let token = token.to_string();
        Box::pin(async move { this.fetch_raw(&repo, &path, &token).await })
    }
}

impl RepositoryHost for Arc<dyn RepositoryHost> {
    fn validate_token(&self, token: &str) -> HostFuture<GitHubUser> {
        (**self).validate_token(token)
    }

    fn list_repos(&self, token: &str) -> HostFuture<Vec<GitHubRepo>> {
        (**self).list_repos(token)
    }

    fn fetch_tree(
        &self,
        repo: &RepoRef,
        token: &str,
        branch: Option<&str>,
    ) -> HostFuture<Vec<GitTreeItem>> {
        (**self).fetch_tree(repo, token, branch)
    }

    fn fetch_file_content(&self, repo: &RepoRef, path: &str, token: &str) -> HostFuture<String> {
        (**self).fetch_file_content(repo, path, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user_json() -> serde_json::Value {
        json!({
            "login": "octocat",
            "id": 1,
            "avatar_url": "https://example.com/a.png",
            "html_url": "https://github.com/octocat",
            "name": "The Octocat"
        })
    }

    fn tree_json(truncated: bool) -> serde_json::Value {
        json!({
            "sha": "root",
            "truncated": truncated,
            "tree": [
                {"path": "src", "mode": "040000", "type": "tree", "sha": "t1"},
                {"path": "src/main.rs", "mode": "100644", "type": "blob", "sha": "b1", "size": 10},
                {"path": "logo.png", "mode": "100644", "type": "blob", "sha": "b2", "size": 99},
                {"path": "README.md", "mode": "100644", "type": "blob", "sha": "b3", "size": 5}
            ]
        })
    }

    async fn client_for(server: &MockServer) -> GitHubClient {
        GitHubClient::with_base_url(server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_validate_token_returns_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("authorization", "Bearer good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let user = client.validate_token("good").await.unwrap();
        assert_eq!(user.login, "octocat");
        assert_eq!(user.name.as_deref(), Some("The Octocat"));
    }

    #[tokio::test]
    async fn test_validate_token_unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.validate_token("bad").await.unwrap_err();
        assert_eq!(err, GitHubError::Auth);
    }

    #[tokio::test]
    async fn test_list_repos_sends_sort_and_page_size() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/repos"))
            .and(query_param("sort", "updated"))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 7,
                "name": "hello",
                "full_name": "octocat/hello",
                "private": false,
                "html_url": "https://github.com/octocat/hello",
                "description": null,
                "default_branch": "trunk",
                "updated_at": "2024-01-01T00:00:00Z",
                "owner": user_json()
            }])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let repos = client.list_repos("t").await.unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].default_branch, "trunk");
        assert_eq!(repos[0].repo_ref(), RepoRef::new("octocat", "hello"));
    }

    #[tokio::test]
    async fn test_list_repos_server_error_is_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/repos"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.list_repos("t").await.unwrap_err();
        assert!(matches!(err, GitHubError::Network(_)));
    }

    #[tokio::test]
    async fn test_fetch_tree_filters_directories_and_binaries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/git/trees/dev"))
            .and(query_param("recursive", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tree_json(false)))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let repo = RepoRef::new("octocat", "hello");
        let tree = client.fetch_tree(&repo, "t", Some("dev")).await.unwrap();

        let paths: Vec<&str> = tree.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["src/main.rs", "README.md"]);
    }

    #[tokio::test]
    async fn test_fetch_tree_resolves_default_branch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"default_branch": "trunk"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/git/trees/trunk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tree_json(true)))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let repo = RepoRef::new("octocat", "hello");
        let tree = client.fetch_tree(&repo, "t", None).await.unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_tree_falls_back_to_main() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/git/trees/main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tree_json(false)))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let repo = RepoRef::new("octocat", "hello");
        assert!(client.fetch_tree(&repo, "t", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_tree_missing_repo_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/nope/git/trees/main"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let repo = RepoRef::new("octocat", "nope");
        let err = client.fetch_tree(&repo, "t", Some("main")).await.unwrap_err();
        assert!(matches!(err, GitHubError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_file_content_uses_raw_media_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/contents/src/main.rs"))
            .and(header("accept", RAW_MEDIA_TYPE))
            .respond_with(ResponseTemplate::new(200).set_body_string("fn main() {}"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let repo = RepoRef::new("octocat", "hello");
        let content = client
            .fetch_file_content(&repo, "src/main.rs", "t")
            .await
            .unwrap();
        assert_eq!(content, "fn main() {}");
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/contents/a.txt"))
            .respond_with(ResponseTemplate::new(403).insert_header("x-ratelimit-remaining", "0"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let repo = RepoRef::new("octocat", "hello");
        let err = client
            .fetch_file_content(&repo, "a.txt", "t")
            .await
            .unwrap_err();
        assert_eq!(err, GitHubError::RateLimited);
    }
}
