//! GitHub REST client for the repository explorer.
//!
//! Exposes the four host capabilities the workspace depends on (token
//! validation, repository listing, recursive tree listing and raw file
//! content) behind the object-safe [`RepositoryHost`] trait, plus the path
//! classification helpers used when materializing files.

mod classify;
mod client;
mod error;
mod models;

pub use classify::{detect_language, is_binary};
pub use client::{GitHubClient, HostFuture, RepositoryHost, DEFAULT_API_BASE};
pub use error::{GitHubError, GitHubResult};
pub use models::{GitHubRepo, GitHubUser, GitTreeItem, RepoRef, TreeItemKind};
