use github_client::{GitHubRepo, GitHubUser, GitTreeItem, RepoRef};

/// Generation of the active connection.
///
/// Bumped on login, logout and repository switch. Async work captures the
/// epoch before suspending and applies its result only if the epoch is still
/// current.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Epoch(self.0.wrapping_add(1))
    }
}

/// Repository the workspace is currently bound to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectedRepo {
    pub repo: RepoRef,
    pub branch: Option<String>,
    pub private: Option<bool>,
}

impl ConnectedRepo {
    pub fn full_name(&self) -> String {
        self.repo.full_name()
    }
}

/// Credential, profile and repository connection.
#[derive(Clone, Debug, Default)]
pub struct Session {
    token: Option<String>,
    user: Option<GitHubUser>,
    repos: Vec<GitHubRepo>,
    connected: Option<ConnectedRepo>,
    tree: Vec<GitTreeItem>,
    epoch: Epoch,
    auth_epoch: Epoch,
}

impl Session {
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.epoch == epoch
    }

    /// Start a new generation; results captured under older epochs go stale.
    pub fn advance(&mut self) -> Epoch {
        self.epoch = self.epoch.next();
        self.epoch
    }

    /// Generation of the credential alone. Only sign-in and sign-out move it,
    /// so repository switches do not invalidate the repository list.
    pub fn auth_epoch(&self) -> Epoch {
        self.auth_epoch
    }

    pub fn is_current_auth(&self, epoch: Epoch) -> bool {
        self.auth_epoch == epoch
    }

    fn advance_auth(&mut self) -> Epoch {
        self.auth_epoch = self.auth_epoch.next();
        self.advance()
    }

    /// Signed in with a validated token. Drops any previous connection.
    pub fn sign_in(&mut self, token: String, user: GitHubUser) -> Epoch {
        self.token = Some(token);
        self.user = Some(user);
        self.repos.clear();
        self.connected = None;
        self.tree.clear();
        self.advance_auth()
    }

    pub fn sign_out(&mut self) -> Epoch {
        self.token = None;
        self.user = None;
        self.repos.clear();
        self.connected = None;
        self.tree.clear();
        self.advance_auth()
    }

    /// Bind to a repository, replacing the tree wholesale.
    pub fn connect(&mut self, connected: ConnectedRepo, tree: Vec<GitTreeItem>) -> Epoch {
        self.connected = Some(connected);
        self.tree = tree;
        self.advance()
    }

    pub fn set_repos(&mut self, repos: Vec<GitHubRepo>) {
        self.repos = repos;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&GitHubUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn repos(&self) -> &[GitHubRepo] {
        &self.repos
    }

    pub fn connected(&self) -> Option<&ConnectedRepo> {
        self.connected.as_ref()
    }

    pub fn tree(&self) -> &[GitTreeItem] {
        &self.tree
    }
}
