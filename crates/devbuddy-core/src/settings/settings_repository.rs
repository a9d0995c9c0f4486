use std::path::PathBuf;

use tracing::warn;

use super::settings_model::Settings;
use crate::repositories::{BoxFuture, RepositoryError, RepositoryResult};

pub trait SettingsRepository: Send + Sync + 'static {
    /// Load settings; a missing file yields defaults.
    fn load(&self) -> BoxFuture<'static, RepositoryResult<Settings>>;

    fn save(&self, settings: Settings) -> BoxFuture<'static, RepositoryResult<()>>;
}

pub struct SettingsJsonRepository {
    file_path: PathBuf,
}

impl SettingsJsonRepository {
    pub fn new() -> RepositoryResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RepositoryError::Path("Cannot determine config directory".into()))?;

        Ok(Self {
            file_path: config_dir.join("devbuddy").join("settings.json"),
        })
    }

    pub fn with_path(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }
}

impl SettingsRepository for SettingsJsonRepository {
    fn load(&self) -> BoxFuture<'static, RepositoryResult<Settings>> {
        let path = self.file_path.clone();

        Box::pin(async move {
            let contents = match tokio::fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(Settings::default());
                }
                Err(e) => {
                    warn!(error = ?e, path = %path.display(), "Failed to read settings");
                    return Err(e.into());
                }
            };

            Ok(serde_json::from_str(&contents)?)
        })
    }

    fn save(&self, settings: Settings) -> BoxFuture<'static, RepositoryResult<()>> {
        let path = self.file_path.clone();

        Box::pin(async move {
            let json = serde_json::to_string_pretty(&settings)?;

            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let temp_path = path.with_extension("json.tmp");
            tokio::fs::write(&temp_path, &json).await?;
            tokio::fs::rename(&temp_path, &path).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SettingsJsonRepository::with_path(dir.path().join("settings.json"));
        assert_eq!(repo.load().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SettingsJsonRepository::with_path(dir.path().join("cfg").join("settings.json"));

        let settings = Settings {
            open_file_budget_bytes: Some(32_000),
            cancel_stream_on_file_switch: true,
            ..Settings::default()
        };
        repo.save(settings.clone()).await.unwrap();

        assert_eq!(repo.load().await.unwrap(), settings);
    }
}
