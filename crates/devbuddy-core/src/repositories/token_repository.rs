use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{RepositoryError, RepositoryResult};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Key under which the access token is persisted.
pub const TOKEN_STORAGE_KEY: &str = "devbuddybot_gh_token";

/// The only piece of state that survives a restart: the host access token.
pub trait TokenRepository: Send + Sync + 'static {
    fn load(&self) -> BoxFuture<'static, RepositoryResult<Option<String>>>;

    fn save(&self, token: String) -> BoxFuture<'static, RepositoryResult<()>>;

    /// Remove the stored token. Clearing an absent token succeeds.
    fn clear(&self) -> BoxFuture<'static, RepositoryResult<()>>;
}

impl TokenRepository for Arc<dyn TokenRepository> {
    fn load(&self) -> BoxFuture<'static, RepositoryResult<Option<String>>> {
        (**self).load()
    }

    fn save(&self, token: String) -> BoxFuture<'static, RepositoryResult<()>> {
        (**self).save(token)
    }

    fn clear(&self) -> BoxFuture<'static, RepositoryResult<()>> {
        (**self).clear()
    }
}

#[derive(Serialize, Deserialize)]
struct StoredToken {
    #[serde(rename = "devbuddybot_gh_token")]
    token: String,
}

/// Token stored as `{"devbuddybot_gh_token": "..."}` in `auth.json`.
pub struct TokenJsonRepository {
    file_path: PathBuf,
}

impl TokenJsonRepository {
    /// Repository under the user's config directory.
    pub fn new() -> RepositoryResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RepositoryError::Path("Cannot determine config directory".into()))?;

        Ok(Self {
            file_path: config_dir.join("devbuddy").join("auth.json"),
        })
    }

    pub fn with_path(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl TokenRepository for TokenJsonRepository {
    fn load(&self) -> BoxFuture<'static, RepositoryResult<Option<String>>> {
        let path = self.file_path.clone();

        Box::pin(async move {
            let contents = match tokio::fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            };

            let stored: StoredToken = serde_json::from_str(&contents)?;
            Ok(Some(stored.token).filter(|t| !t.is_empty()))
        })
    }

    fn save(&self, token: String) -> BoxFuture<'static, RepositoryResult<()>> {
        let path = self.file_path.clone();

        Box::pin(async move {
            let json = serde_json::to_string_pretty(&StoredToken { token })?;

            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            // Write atomically using temp file + rename
            let temp_path = path.with_extension("json.tmp");
            tokio::fs::write(&temp_path, &json).await?;
            tokio::fs::rename(&temp_path, &path).await?;

            debug!(path = %path.display(), "Stored access token");
            Ok(())
        })
    }

    fn clear(&self) -> BoxFuture<'static, RepositoryResult<()>> {
        let path = self.file_path.clone();

        Box::pin(async move {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Removed stored access token");
                    Ok(())
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }
}

/// Process-local token storage.
#[derive(Clone, Default)]
pub struct InMemoryTokenRepository {
    token: Arc<Mutex<Option<String>>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(Mutex::new(Some(token.into()))),
        }
    }

    pub fn current(&self) -> Option<String> {
        self.token.lock().clone()
    }
}

impl TokenRepository for InMemoryTokenRepository {
    fn load(&self) -> BoxFuture<'static, RepositoryResult<Option<String>>> {
        let token = self.token.lock().clone();
        Box::pin(async move { Ok(token) })
    }

    fn save(&self, token: String) -> BoxFuture<'static, RepositoryResult<()>> {
        *self.token.lock() = Some(token);
        Box::pin(async { Ok(()) })
    }

    fn clear(&self) -> BoxFuture<'static, RepositoryResult<()>> {
        *self.token.lock() = None;
        Box::pin(async { Ok(()) })
    }
}
