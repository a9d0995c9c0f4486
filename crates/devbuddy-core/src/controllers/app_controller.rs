use std::sync::Arc;

use github_client::{GitHubClient, GitHubRepo, GitHubUser, GitTreeItem, RepoRef, RepositoryHost};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::shell::{Notice, Sidebar, SidebarView};
use crate::error::AppError;
use crate::models::{
    ChatOrchestrator, ChatPhase, ConnectedRepo, Message, ProjectFile, Session, ViewMode,
    WorkspaceStore, find_doc,
};
use crate::repositories::{TokenJsonRepository, TokenRepository};
use crate::services::{
    ChatService, CompletionBackend, ContextAssembler, RigCompletionBackend, TurnOutcome,
    UnconfiguredBackend,
};
use crate::settings::Settings;

/// Everything the shell renders, guarded by one lock.
#[derive(Default)]
struct AppState {
    session: Session,
    workspace: WorkspaceStore,
    sidebar: Sidebar,
    repo_filter: String,
    notices: Vec<Notice>,
    loading_repos: bool,
    loading_tree: bool,
}

/// Shell controller: turns user actions into host calls, workspace updates
/// and chat turns.
///
/// Failures never escape as errors. They become [`Notice`]s (auth and host
/// failures) or a fallback chat message (completion failures). Every async
/// action captures the session epoch before awaiting and drops its result if
/// a login, logout or repository switch happened in the meantime.
pub struct AppController {
    host: Arc<dyn RepositoryHost>,
    tokens: Arc<dyn TokenRepository>,
    chat_service: ChatService,
    settings: Settings,
    state: Mutex<AppState>,
    chat: Arc<Mutex<ChatOrchestrator>>,
}

impl AppController {
    pub fn new(
        host: Arc<dyn RepositoryHost>,
        tokens: Arc<dyn TokenRepository>,
        backend: Arc<dyn CompletionBackend>,
        settings: Settings,
    ) -> Self {
        let chat_service = ChatService::new(
            backend,
            ContextAssembler::new(settings.open_file_budget_bytes),
            settings.stream_idle_timeout(),
        );

        Self {
            host,
            tokens,
            chat_service,
            settings,
            state: Mutex::new(AppState::default()),
            chat: Arc::new(Mutex::new(ChatOrchestrator::default())),
        }
    }

    /// Production wiring: GitHub REST client, token file under the config
    /// directory and the configured completion provider.
    ///
    /// A provider that cannot be built (missing key) does not prevent start
    /// up; chat turns then fail with the configuration error.
    pub fn from_settings(settings: Settings) -> Result<Self, AppError> {
        let host: Arc<dyn RepositoryHost> =
            Arc::new(GitHubClient::with_base_url(settings.api_base_url.clone())?);
        let tokens: Arc<dyn TokenRepository> = Arc::new(TokenJsonRepository::new()?);

        let backend: Arc<dyn CompletionBackend> =
            match RigCompletionBackend::from_model_config(&settings.model) {
                Ok(backend) => Arc::new(backend),
                Err(e) => {
                    warn!(error = %e, "Completion provider unavailable");
                    Arc::new(UnconfiguredBackend::new(e.to_string()))
                }
            };

        Ok(Self::new(host, tokens, backend, settings))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Authentication ─────────────────────────────────────────────────

    /// Sign in with a previously stored token, if any.
    pub async fn restore_session(&self) -> bool {
        match self.tokens.load().await {
            Ok(Some(token)) => {
                info!("Restoring session from stored token");
                self.login(&token).await
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = ?e, "Failed to read stored token");
                false
            }
        }
    }

    /// Validate `token`, then load the user's repositories.
    ///
    /// A rejected token is removed from storage and reported inline in the
    /// login form. A failed repository listing keeps the session signed in.
    pub async fn login(&self, token: &str) -> bool {
        let token = token.trim().to_string();
        if token.is_empty() {
            return false;
        }

        let auth_epoch = {
            let mut state = self.state.lock();
            state.loading_repos = true;
            state.session.auth_epoch()
        };

        let validated = self.host.validate_token(&token).await;

        let user = match validated {
            Ok(user) => user,
            Err(e) => {
                {
                    let mut state = self.state.lock();
                    if !state.session.is_current_auth(auth_epoch) {
                        debug!("Discarding failure of a superseded login");
                        return false;
                    }
                    warn!(error = %AppError::from(e), "Token validation failed");
                    state.loading_repos = false;
                    state.notices.push(Notice::auth(&AppError::Auth));
                }
                if let Err(e) = self.tokens.clear().await {
                    warn!(error = ?e, "Failed to remove rejected token");
                }
                return false;
            }
        };

        let auth_epoch = {
            let mut state = self.state.lock();
            if !state.session.is_current_auth(auth_epoch) {
                debug!(login = %user.login, "Discarding superseded login");
                return false;
            }
            info!(login = %user.login, "Signed in");
            state.session.sign_in(token.clone(), user);
            state.workspace.reset(vec![ProjectFile::welcome()]);
            state.repo_filter.clear();
            state.loading_tree = false;
            state.session.auth_epoch()
        };
        self.chat.lock().clear();

        if let Err(e) = self.tokens.save(token.clone()).await {
            warn!(error = ?e, "Failed to persist token");
            self.push_notice(Notice::alert(&AppError::from(e)));
        }

        let repos = self.host.list_repos(&token).await;
        let mut state = self.state.lock();
        if !state.session.is_current_auth(auth_epoch) {
            debug!("Discarding repository list of a previous session");
            return true;
        }
        state.loading_repos = false;
        match repos {
            Ok(repos) => {
                info!(count = repos.len(), "Loaded repositories");
                state.session.set_repos(repos);
            }
            Err(e) => {
                let error = AppError::from(e);
                warn!(error = %error, "Failed to list repositories");
                state.notices.push(Notice::alert(&error));
            }
        }
        true
    }

    /// Forget the credential and return to the default workspace.
    pub async fn logout(&self) {
        {
            let mut state = self.state.lock();
            state.session.sign_out();
            state.workspace.reset(vec![ProjectFile::welcome()]);
            state.repo_filter.clear();
            state.loading_repos = false;
            state.loading_tree = false;
        }
        self.chat.lock().clear();
        info!("Signed out");

        if let Err(e) = self.tokens.clear().await {
            warn!(error = ?e, "Failed to remove stored token");
        }
    }

    // ── Repository connection ──────────────────────────────────────────

    /// Connect to one of the listed repositories on its default branch.
    pub async fn connect_repo(&self, repo: &GitHubRepo) -> bool {
        let connected = ConnectedRepo {
            repo: repo.repo_ref(),
            branch: Some(repo.default_branch.clone()),
            private: Some(repo.private),
        };
        let readme =
            ProjectFile::repository_readme(&connected.repo, &repo.default_branch, repo.private);
        self.load_repository(connected, readme).await
    }

    /// Connect to any repository by `owner/name` or GitHub URL.
    pub async fn open_public_repo(&self, input: &str) -> bool {
        let Some(repo) = RepoRef::parse(input) else {
            self.push_notice(Notice::alert(&AppError::InvalidRepository(
                input.trim().to_string(),
            )));
            return false;
        };

        let readme = ProjectFile::public_repository_readme(&repo);
        let connected = ConnectedRepo {
            repo,
            branch: None,
            private: None,
        };
        let loaded = self.load_repository(connected, readme).await;
        if loaded {
            self.state.lock().repo_filter.clear();
        }
        loaded
    }

    /// The most recent connect request wins: starting one advances the
    /// connection epoch, so an earlier request still in flight is dropped.
    async fn load_repository(&self, connected: ConnectedRepo, readme: ProjectFile) -> bool {
        let Some(token) = self.authenticated() else {
            return false;
        };
        let epoch = {
            let mut state = self.state.lock();
            state.loading_tree = true;
            state.session.advance()
        };

        let result = self
            .host
            .fetch_tree(&connected.repo, &token, connected.branch.as_deref())
            .await;

        let full_name = connected.full_name();
        {
            let mut state = self.state.lock();
            if !state.session.is_current(epoch) {
                debug!(repo = %full_name, "Discarding tree of a superseded connection");
                return false;
            }
            state.loading_tree = false;

            match result {
                Ok(tree) => {
                    info!(repo = %full_name, files = tree.len(), "Connected repository");
                    state.session.connect(connected, tree);
                    state.workspace.reset(vec![readme]);
                }
                Err(e) => {
                    let error = AppError::from(e);
                    warn!(repo = %full_name, error = %error, "Failed to load repository tree");
                    state.notices.push(Notice::alert(&error));
                    return false;
                }
            }
        }

        self.chat.lock().reset_for_connection(&full_name);
        true
    }

    // ── Workspace ──────────────────────────────────────────────────────

    /// Open a file from the tree, fetching its content unless the path is
    /// already open. Returns the id of the activated tab.
    pub async fn open_tree_item(&self, item: &GitTreeItem) -> Option<String> {
        let (repo, token, epoch) = {
            let mut state = self.state.lock();
            if let Some(id) = state.workspace.find_by_path(&item.path).map(|f| f.id.clone()) {
                let before = state.workspace.active_id().map(str::to_string);
                state.workspace.set_active(&id);
                drop(state);
                self.after_focus_change(before.as_deref(), Some(id.as_str()));
                return Some(id);
            }

            let connected = state.session.connected().map(|c| c.repo.clone());
            let token = state.session.token().map(str::to_string);
            match (connected, token) {
                (Some(repo), Some(token)) => (repo, token, state.session.epoch()),
                _ => {
                    state.notices.push(Notice::alert(&AppError::NotAuthenticated));
                    return None;
                }
            }
        };

        let result = self
            .host
            .fetch_file_content(&repo, &item.path, &token)
            .await;

        let (before, id) = {
            let mut state = self.state.lock();
            if !state.session.is_current(epoch) {
                debug!(path = %item.path, "Discarding file of a superseded connection");
                return None;
            }
            match result {
                Ok(content) => {
                    let before = state.workspace.active_id().map(str::to_string);
                    let id = state
                        .workspace
                        .open_file(ProjectFile::from_tree_item(item, content));
                    debug!(path = %item.path, id = %id, "Opened file");
                    (before, id)
                }
                Err(e) => {
                    let error = AppError::from(e);
                    warn!(path = %item.path, error = %error, "Failed to load file");
                    state.notices.push(Notice::alert(&error));
                    return None;
                }
            }
        };

        self.after_focus_change(before.as_deref(), Some(id.as_str()));
        Some(id)
    }

    /// Open a built-in documentation page in preview.
    pub fn open_doc(&self, doc_id: &str) -> Option<String> {
        let doc = find_doc(doc_id)?;
        let (before, id) = {
            let mut state = self.state.lock();
            let before = state.workspace.active_id().map(str::to_string);
            let id = state.workspace.open_file(ProjectFile::from_doc(doc));
            state.workspace.set_view_mode(ViewMode::Preview);
            (before, id)
        };
        self.after_focus_change(before.as_deref(), Some(id.as_str()));
        Some(id)
    }

    pub fn close_file(&self, id: &str) -> bool {
        let (before, after, closed) = {
            let mut state = self.state.lock();
            let before = state.workspace.active_id().map(str::to_string);
            let closed = state.workspace.close_file(id);
            (before, state.workspace.active_id().map(str::to_string), closed)
        };
        self.after_focus_change(before.as_deref(), after.as_deref());
        closed
    }

    pub fn select_file(&self, id: &str) -> bool {
        let (before, selected) = {
            let mut state = self.state.lock();
            let before = state.workspace.active_id().map(str::to_string);
            (before, state.workspace.set_active(id))
        };
        if selected {
            self.after_focus_change(before.as_deref(), Some(id));
        }
        selected
    }

    pub fn edit_active(&self, content: impl Into<String>) -> bool {
        self.state.lock().workspace.edit_active(content)
    }

    pub fn toggle_view_mode(&self) -> Option<ViewMode> {
        let mut state = self.state.lock();
        state.workspace.active_id()?;
        Some(state.workspace.toggle_view_mode())
    }

    fn after_focus_change(&self, before: Option<&str>, after: Option<&str>) {
        if before == after || !self.settings.cancel_stream_on_file_switch {
            return;
        }
        if self.chat.lock().stop() {
            info!("Stopped assistant reply after file switch");
        }
    }

    // ── Chat ───────────────────────────────────────────────────────────

    /// Send `input` with the current workspace as context and stream the
    /// reply into the transcript.
    ///
    /// Returns `None` when the input is blank or a reply is already in
    /// flight; the transcript is left untouched in that case.
    pub async fn send_message(&self, input: &str) -> Option<TurnOutcome> {
        let handle = self.chat.lock().begin_turn(input)?;

        let request = {
            let state = self.state.lock();
            let focus = state
                .workspace
                .active_file()
                .cloned()
                .unwrap_or_else(ProjectFile::no_focus);
            self.chat_service.prepare_request(
                &handle,
                &focus,
                state.workspace.files(),
                state.session.tree(),
            )
        };

        let outcome = self.chat_service.run_turn(&self.chat, handle, request).await;
        if let TurnOutcome::Failed(e) = &outcome {
            warn!(error = %e, "Assistant reply failed");
        }
        Some(outcome)
    }

    /// Stop the reply in flight, keeping what was streamed.
    pub fn stop_stream(&self) -> bool {
        self.chat.lock().stop()
    }

    pub fn clear_chat(&self) {
        self.chat.lock().clear();
    }

    // ── Shell ──────────────────────────────────────────────────────────

    pub fn select_sidebar_view(&self, view: SidebarView) -> Sidebar {
        let mut state = self.state.lock();
        state.sidebar.select(view);
        state.sidebar
    }

    pub fn set_repo_filter(&self, filter: impl Into<String>) {
        self.state.lock().repo_filter = filter.into();
    }

    /// Listed repositories whose full name contains the filter, ignoring case.
    pub fn filtered_repos(&self) -> Vec<GitHubRepo> {
        let state = self.state.lock();
        let needle = state.repo_filter.to_lowercase();
        state
            .session
            .repos()
            .iter()
            .filter(|r| r.full_name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Repository the filter text names, offered as "open public repository".
    pub fn public_repo_candidate(&self) -> Option<RepoRef> {
        let state = self.state.lock();
        if !state.repo_filter.contains('/') {
            return None;
        }
        RepoRef::parse(&state.repo_filter)
    }

    /// Drain pending notices, oldest first.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.state.lock().notices)
    }

    // ── Read access ────────────────────────────────────────────────────

    pub fn with_workspace<R>(&self, f: impl FnOnce(&WorkspaceStore) -> R) -> R {
        f(&self.state.lock().workspace)
    }

    pub fn with_session<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.state.lock().session)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.chat.lock().messages().to_vec()
    }

    pub fn chat_phase(&self) -> ChatPhase {
        self.chat.lock().phase()
    }

    pub fn user(&self) -> Option<GitHubUser> {
        self.state.lock().session.user().cloned()
    }

    pub fn connected_repo(&self) -> Option<ConnectedRepo> {
        self.state.lock().session.connected().cloned()
    }

    pub fn sidebar(&self) -> Sidebar {
        self.state.lock().sidebar
    }

    pub fn is_loading_repos(&self) -> bool {
        self.state.lock().loading_repos
    }

    pub fn is_loading_tree(&self) -> bool {
        self.state.lock().loading_tree
    }

    fn authenticated(&self) -> Option<String> {
        let mut state = self.state.lock();
        let token = state.session.token().map(str::to_string);
        if token.is_none() {
            state.notices.push(Notice::alert(&AppError::NotAuthenticated));
        }
        token
    }

    fn push_notice(&self, notice: Notice) {
        self.state.lock().notices.push(notice);
    }
}
