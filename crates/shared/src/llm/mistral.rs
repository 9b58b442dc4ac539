use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tokio::time::sleep;

use super::gateway::{GenerateFuture, TextGenerationError, TextGenerator};
use crate::config::ConfigError;
use crate::config_env::{optional_trimmed_env, parse_u32_env, parse_u64_env, require_env};

const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://api.mistral.ai/v1/chat/completions";
const DEFAULT_MODEL: &str = "mistral-large-latest";
const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_BASE_BACKOFF_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct MistralGatewayConfig {
    pub chat_completions_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_backoff_ms: u64,
}

impl MistralGatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = require_env("MISTRAL_API_KEY")?;
        let chat_completions_url = optional_trimmed_env("MISTRAL_CHAT_COMPLETIONS_URL")
            .unwrap_or_else(|| DEFAULT_CHAT_COMPLETIONS_URL.to_string());
        if !chat_completions_url.starts_with("http://")
            && !chat_completions_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidConfiguration(
                "MISTRAL_CHAT_COMPLETIONS_URL must start with http:// or https://".to_string(),
            ));
        }

        Ok(Self {
            chat_completions_url,
            api_key,
            model: optional_trimmed_env("MISTRAL_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_ms: parse_u64_env("MISTRAL_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?,
            max_retries: parse_u32_env("MISTRAL_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            retry_base_backoff_ms: parse_u64_env(
                "MISTRAL_RETRY_BASE_BACKOFF_MS",
                DEFAULT_RETRY_BASE_BACKOFF_MS,
            )?,
        })
    }
}

/// Text generator backed by the Mistral chat-completions API.
#[derive(Clone)]
pub struct MistralGateway {
    client: reqwest::Client,
    config: MistralGatewayConfig,
}

impl MistralGateway {
    pub fn new(config: MistralGatewayConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;

        Ok(Self { client, config })
    }

    async fn generate_with_retries(&self, prompt: &str) -> Result<String, TextGenerationError> {
        let mut attempt = 0_u32;

        loop {
            match self.send_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    if err.retryable && attempt < self.config.max_retries {
                        let backoff_multiplier = 2_u64.saturating_pow(attempt);
                        let backoff_ms = self
                            .config
                            .retry_base_backoff_ms
                            .saturating_mul(backoff_multiplier);
                        sleep(Duration::from_millis(backoff_ms)).await;
                        attempt = attempt.saturating_add(1);
                        continue;
                    }

                    return Err(err.error);
                }
            }
        }
    }

    async fn send_once(&self, prompt: &str) -> Result<String, SendAttemptError> {
        let request_body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "temperature": 0
        });

        let response = self
            .client
            .post(&self.config.chat_completions_url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    SendAttemptError::retryable(TextGenerationError::Timeout)
                } else {
                    SendAttemptError::retryable(TextGenerationError::ProviderFailure(
                        "request_unavailable".to_string(),
                    ))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|_| {
            SendAttemptError::non_retryable(TextGenerationError::InvalidPayload(
                "response_body_read_failed".to_string(),
            ))
        })?;

        if !status.is_success() {
            let error = TextGenerationError::ProviderFailure(format!("status={}", status.as_u16()));
            return Err(if is_retryable_status(status) {
                SendAttemptError::retryable(error)
            } else {
                SendAttemptError::non_retryable(error)
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|_| {
            SendAttemptError::non_retryable(TextGenerationError::InvalidPayload(
                "response_json_parse_failed".to_string(),
            ))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                SendAttemptError::non_retryable(TextGenerationError::InvalidPayload(
                    "missing_choice".to_string(),
                ))
            })?;

        Ok(content)
    }
}

impl TextGenerator for MistralGateway {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(self.generate_with_retries(prompt))
    }
}

#[derive(Debug)]
struct SendAttemptError {
    error: TextGenerationError,
    retryable: bool,
}

impl SendAttemptError {
    fn retryable(error: TextGenerationError) -> Self {
        Self {
            error,
            retryable: true,
        }
    }

    fn non_retryable(error: TextGenerationError) -> Self {
        Self {
            error,
            retryable: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: String,
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}
