pub mod settings_model;
pub mod settings_repository;

pub use settings_model::{ModelConfig, ProviderType, Settings};
pub use settings_repository::{SettingsJsonRepository, SettingsRepository};
