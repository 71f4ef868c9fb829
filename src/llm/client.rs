//! HTTP client for OpenAI-compatible chat completion endpoints.

use crate::config::LlmConfig;
use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Message in a chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Sampling options for one completion.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Thin wrapper around `reqwest` bound to one endpoint, key and model.
pub struct ChatClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl ChatClient {
    /// Build a client from configuration. The key must already be resolved.
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ServiceError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: chat_endpoint(&config.base_url),
            api_key,
            model: config.model.clone(),
            timeout: config.timeout(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the messages and return the assistant's text.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<String, ServiceError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        debug!(
            "Sending chat request with {} messages to {}",
            messages.len(),
            self.endpoint
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::Timeout {
                        after: self.timeout,
                    }
                } else if e.is_connect() {
                    ServiceError::Transport(format!("Cannot connect to {}", self.endpoint))
                } else {
                    ServiceError::Transport(format!("Failed to send request: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status, body });
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ServiceError::Parse("reply has no message content".to_string()))
    }
}

fn chat_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}
