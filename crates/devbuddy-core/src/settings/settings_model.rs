use std::time::Duration;

use github_client::DEFAULT_API_BASE;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

pub const SYSTEM_INSTRUCTION: &str = "You are DevBuddyBot, an expert AI acting as software architect \
and tech lead inside an IDE.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(clippy::upper_case_acronyms)]
pub enum ProviderType {
    #[default]
    Gemini,
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
    Ollama,
}

impl ProviderType {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "Google Gemini",
            ProviderType::Anthropic => "Anthropic",
            ProviderType::OpenAI => "OpenAI",
            ProviderType::Ollama => "Ollama",
        }
    }
}

/// Completion model selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: ProviderType,
    pub model_identifier: String,
    pub temperature: f32,
    pub preamble: String,
    /// Environment variable holding the provider API key.
    pub api_key_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ModelConfig {
    /// Provider key from the environment. Keys are never persisted.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::Gemini,
            model_identifier: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            preamble: SYSTEM_INSTRUCTION.to_string(),
            api_key_env: "API_KEY".to_string(),
            base_url: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub model: ModelConfig,
    /// Total bytes of open-file content sent per turn; `None` sends everything.
    pub open_file_budget_bytes: Option<usize>,
    pub stream_idle_timeout_secs: u64,
    /// Stop the in-flight reply when the active file changes.
    pub cancel_stream_on_file_switch: bool,
}

impl Settings {
    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs.max(1))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            model: ModelConfig::default(),
            open_file_budget_bytes: None,
            stream_idle_timeout_secs: 60,
            cancel_stream_on_file_switch: false,
        }
    }
}
