use serde::{Deserialize, Serialize};

/// Profile returned by `GET /user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub id: u64,
    pub avatar_url: String,
    pub html_url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub followers: Option<u64>,
    #[serde(default)]
    pub public_repos: Option<u64>,
}

/// Repository entry returned by `GET /user/repos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub private: bool,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    pub default_branch: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub owner: GitHubUser,
}

impl GitHubRepo {
    pub fn repo_ref(&self) -> RepoRef {
        RepoRef {
            owner: self.owner.login.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeItemKind {
    Blob,
    Tree,
    Commit,
}

/// One entry of a recursive `git/trees` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitTreeItem {
    pub path: String,
    #[serde(default)]
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: TreeItemKind,
    pub sha: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}

impl GitTreeItem {
    pub fn blob(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: "100644".to_string(),
            kind: TreeItemKind::Blob,
            sha: sha.into(),
            size: None,
            url: None,
        }
    }

    /// Last path segment, used as the tab title.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// `owner/name` pair identifying a repository on the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses `owner/name` or a `https://github.com/owner/name` URL.
    ///
    /// Surrounding whitespace and a trailing slash are ignored. Anything with
    /// fewer than two non-empty segments is rejected.
    pub fn parse(input: &str) -> Option<Self> {
        let cleaned = input
            .trim()
            .trim_start_matches("https://github.com/")
            .trim_start_matches("http://github.com/")
            .trim_end_matches('/');

        let mut parts = cleaned.split('/');
        let owner = parts.next().filter(|s| !s.is_empty())?;
        let name = parts
            .next()
            .map(|s| s.trim_end_matches(".git"))
            .filter(|s| !s.is_empty())?;
        Some(Self::new(owner, name))
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// `GET /repos/{owner}/{repo}` (only the fields we read).
#[derive(Debug, Deserialize)]
pub(crate) struct RepoDetails {
    pub default_branch: String,
}

/// `GET /repos/{owner}/{repo}/git/trees/{ref}?recursive=1`
#[derive(Debug, Deserialize)]
pub(crate) struct TreeResponse {
    pub tree: Vec<GitTreeItem>,
    #[serde(default)]
    pub truncated: bool,
}
