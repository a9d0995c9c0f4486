use github_client::{GitTreeItem, RepoRef, detect_language};
use serde::{Deserialize, Serialize};

use super::docs::{DocSection, WELCOME_CONTENT};

pub const WELCOME_FILE_ID: &str = "welcome";
pub const README_FILE_ID: &str = "readme";
pub const NO_FOCUS_FILE_ID: &str = "none";

/// Paths under this prefix are documentation pages and open in preview.
pub const DOCS_PATH_PREFIX: &str = "docs/";

/// A file open in the workspace.
///
/// `id` is stable across edits: the blob sha for repository files, a fixed
/// string for synthetic ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub id: String,
    pub name: String,
    pub path: String,
    pub language: String,
    pub content: String,
}

impl ProjectFile {
    pub fn new(
        id: impl Into<String>,
        path: impl Into<String>,
        language: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            id: id.into(),
            name,
            path,
            language: language.into(),
            content: content.into(),
        }
    }

    /// File materialized from a tree entry and its fetched content.
    pub fn from_tree_item(item: &GitTreeItem, content: impl Into<String>) -> Self {
        Self::new(
            item.sha.clone(),
            item.path.clone(),
            detect_language(&item.path),
            content,
        )
    }

    pub fn from_doc(doc: &DocSection) -> Self {
        Self {
            id: format!("doc-{}", doc.id),
            name: format!("{}.md", doc.title),
            path: format!("{DOCS_PATH_PREFIX}{}", doc.id),
            language: "markdown".to_string(),
            content: doc.content.to_string(),
        }
    }

    /// Default tab of a fresh workspace.
    pub fn welcome() -> Self {
        Self::new(WELCOME_FILE_ID, "WELCOME.md", "markdown", WELCOME_CONTENT)
    }

    /// Synthetic README shown after connecting to one of the user's repositories.
    pub fn repository_readme(repo: &RepoRef, branch: &str, private: bool) -> Self {
        let content = format!(
            "# {}\n\nRepository loaded into DevBuddy.\nBranch: {}\nPrivate: {}",
            repo.full_name(),
            branch,
            if private { "Yes" } else { "No" }
        );
        Self::new(README_FILE_ID, "README.md", "markdown", content)
    }

    /// Synthetic README shown after opening a repository by name.
    pub fn public_repository_readme(repo: &RepoRef) -> Self {
        let content = format!(
            "# {}\n\nPublic repository loaded.\n(Opened by name from the search box)",
            repo.full_name()
        );
        Self::new(README_FILE_ID, "README.md", "markdown", content)
    }

    /// Stand-in focus for the assistant when no tab is open.
    pub fn no_focus() -> Self {
        Self {
            id: NO_FOCUS_FILE_ID.to_string(),
            name: "No file".to_string(),
            path: String::new(),
            language: "plaintext".to_string(),
            content: String::new(),
        }
    }

    pub fn is_documentation(&self) -> bool {
        self.path.starts_with(DOCS_PATH_PREFIX)
    }
}
