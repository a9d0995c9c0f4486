use anyhow::{Result, anyhow};
use futures::StreamExt;
use rig::OneOrMany;
use rig::agent::Agent;
use rig::client::CompletionClient;
use rig::completion::message::{AssistantContent, Text, UserContent};
use rig::streaming::StreamingPrompt;
use tracing::{debug, info};

use super::completion::{
    CompletionBackend, CompletionFuture, CompletionRequest, StreamError, TextStream,
};
use crate::models::{Message, Role};
use crate::settings::{ModelConfig, ProviderType};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Enum-based agent wrapper for multi-provider support
#[derive(Clone)]
pub enum AgentClient {
    Gemini(Agent<rig::providers::gemini::completion::CompletionModel>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    OpenAI(Agent<rig::providers::openai::responses_api::ResponsesCompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel>),
}

impl AgentClient {
    /// Build the provider agent described by `config`, reading the key from
    /// the configured environment variable.
    pub fn from_model_config(config: &ModelConfig) -> Result<Self> {
        let require_key = || {
            config.api_key().ok_or_else(|| {
                anyhow!(
                    "API key not configured for {} (set {})",
                    config.provider.display_name(),
                    config.api_key_env
                )
            })
        };
        let temperature = config.temperature as f64;

        let client = match config.provider {
            ProviderType::Gemini => {
                let client = rig::providers::gemini::Client::new(&require_key()?)?;
                AgentClient::Gemini(
                    client
                        .agent(&config.model_identifier)
                        .preamble(&config.preamble)
                        .temperature(temperature)
                        .build(),
                )
            }
            ProviderType::Anthropic => {
                let client = rig::providers::anthropic::Client::new(&require_key()?)?;
                AgentClient::Anthropic(
                    client
                        .agent(&config.model_identifier)
                        .preamble(&config.preamble)
                        .temperature(temperature)
                        .build(),
                )
            }
            ProviderType::OpenAI => {
                let client = rig::providers::openai::Client::new(&require_key()?)?;
                AgentClient::OpenAI(
                    client
                        .agent(&config.model_identifier)
                        .preamble(&config.preamble)
                        .temperature(temperature)
                        .build(),
                )
            }
            ProviderType::Ollama => {
                let url = config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
                let client = rig::providers::ollama::Client::builder()
                    .api_key(rig::client::Nothing)
                    .base_url(&url)
                    .build()?;
                AgentClient::Ollama(
                    client
                        .agent(&config.model_identifier)
                        .preamble(&config.preamble)
                        .temperature(temperature)
                        .build(),
                )
            }
        };

        info!(
            provider = client.provider_name(),
            model = %config.model_identifier,
            "Created completion agent"
        );
        Ok(client)
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            AgentClient::Gemini(_) => "Gemini",
            AgentClient::Anthropic(_) => "Anthropic",
            AgentClient::OpenAI(_) => "OpenAI",
            AgentClient::Ollama(_) => "Ollama",
        }
    }
}

/// Replay transcript entries as rig messages, skipping empty placeholders.
pub fn to_rig_history(history: &[Message]) -> Vec<rig::completion::Message> {
    history
        .iter()
        .filter(|m| !m.content.is_empty())
        .map(|m| match m.role {
            Role::User => user_message(&m.content),
            Role::Model => rig::completion::Message::Assistant {
                id: None,
                content: OneOrMany::one(AssistantContent::Text(Text {
                    text: m.content.clone(),
                })),
            },
        })
        .collect()
}

fn user_message(text: &str) -> rig::completion::Message {
    rig::completion::Message::User {
        content: OneOrMany::one(UserContent::Text(Text {
            text: text.to_string(),
        })),
    }
}

/// Reduce a rig multi-turn stream to its text deltas.
macro_rules! text_stream {
    ($stream:expr) => {
        Box::pin(async_stream::stream! {
            while let Some(item) = $stream.next().await {
                match item {
                    Ok(rig::agent::MultiTurnStreamItem::StreamAssistantItem(
                        rig::streaming::StreamedAssistantContent::Text(text),
                    )) => {
                        yield Ok(text.text);
                    }
                    Err(e) => {
                        yield Err(StreamError::Interrupted(e.to_string()));
                        return;
                    }
                    _ => {}
                }
            }
        })
    };
}

/// [`CompletionBackend`] backed by a rig agent.
#[derive(Clone)]
pub struct RigCompletionBackend {
    agent: AgentClient,
}

impl RigCompletionBackend {
    pub fn new(agent: AgentClient) -> Self {
        Self { agent }
    }

    pub fn from_model_config(config: &ModelConfig) -> Result<Self, StreamError> {
        AgentClient::from_model_config(config)
            .map(Self::new)
            .map_err(|e| StreamError::Configuration(e.to_string()))
    }
}

impl CompletionBackend for RigCompletionBackend {
    fn stream_completion(&self, request: CompletionRequest) -> CompletionFuture {
        let agent = self.agent.clone();

        Box::pin(async move {
            let history = to_rig_history(&request.history);
            let prompt = user_message(&request.prompt);
            debug!(
                provider = agent.provider_name(),
                history_len = history.len(),
                prompt_len = request.prompt.len(),
                "Starting completion stream"
            );

            let stream: TextStream = match agent {
                AgentClient::Gemini(agent) => {
                    let mut stream = agent
                        .stream_prompt(prompt)
                        .with_history(history)
                        .multi_turn(1)
                        .await;
                    text_stream!(stream)
                }
                AgentClient::Anthropic(agent) => {
                    let mut stream = agent
                        .stream_prompt(prompt)
                        .with_history(history)
                        .multi_turn(1)
                        .await;
                    text_stream!(stream)
                }
                AgentClient::OpenAI(agent) => {
                    let mut stream = agent
                        .stream_prompt(prompt)
                        .with_history(history)
                        .multi_turn(1)
                        .await;
                    text_stream!(stream)
                }
                AgentClient::Ollama(agent) => {
                    let mut stream = agent
                        .stream_prompt(prompt)
                        .with_history(history)
                        .multi_turn(1)
                        .await;
                    text_stream!(stream)
                }
            };

            Ok(stream)
        })
    }
}

/// Backend used when no provider could be configured; every turn fails with
/// the configuration error.
pub struct UnconfiguredBackend {
    reason: String,
}

impl UnconfiguredBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl CompletionBackend for UnconfiguredBackend {
    fn stream_completion(&self, _request: CompletionRequest) -> CompletionFuture {
        let reason = self.reason.clone();
        Box::pin(async move { Err(StreamError::Configuration(reason)) })
    }
}
