//! Language-model services used by the pipeline.
//!
//! The pipeline only sees the two capability traits below; [`LlmService`]
//! implements both over an OpenAI-compatible chat endpoint, and tests
//! substitute their own stubs.

pub mod client;
pub mod prompts;

use crate::analysis::summary::AreaStatistics;
use crate::config::LlmConfig;
use crate::error::ServiceError;
use crate::models::ResolvedQuery;
use crate::resolver::model::parse_resolution;
use async_trait::async_trait;
use client::{ChatClient, ChatMessage, CompletionOptions};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Resolves a free-text query into areas, intent and metrics.
#[async_trait]
pub trait AreaResolutionService: Send + Sync {
    async fn resolve_areas(
        &self,
        query: &str,
        available_areas: &[String],
    ) -> Result<ResolvedQuery, ServiceError>;
}

/// Writes a short narrative from per-area statistics.
#[async_trait]
pub trait SummaryGenerationService: Send + Sync {
    async fn generate_summary(&self, request: &SummaryRequest) -> Result<String, ServiceError>;
}

/// Bounds a service call; expiry becomes [`ServiceError::Timeout`].
pub async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(ServiceError::Timeout { after: timeout }))
}

/// Everything the summary service gets to see.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub query: String,
    pub areas: Vec<String>,
    pub statistics: Vec<AreaStatistics>,
}

/// Both services backed by one chat client.
pub struct LlmService {
    client: ChatClient,
    resolve_temperature: f32,
    summary_temperature: f32,
    summary_max_tokens: u32,
}

impl LlmService {
    /// Builds the service when the configuration is active.
    ///
    /// Returns `Ok(None)` when the model is disabled or no key is set.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, ServiceError> {
        if !config.is_active() {
            debug!("Language model disabled or no API key configured");
            return Ok(None);
        }

        let api_key = config
            .api_key
            .clone()
            .ok_or(ServiceError::NotConfigured)?;
        let client = ChatClient::new(config, api_key)?;

        info!("Language model services enabled ({})", client.model());

        Ok(Some(Self {
            client,
            resolve_temperature: config.resolve_temperature,
            summary_temperature: config.summary_temperature,
            summary_max_tokens: config.summary_max_tokens,
        }))
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }
}

#[async_trait]
impl AreaResolutionService for LlmService {
    async fn resolve_areas(
        &self,
        query: &str,
        available_areas: &[String],
    ) -> Result<ResolvedQuery, ServiceError> {
        let messages = [
            ChatMessage::system(prompts::RESOLVE_SYSTEM_PROMPT),
            ChatMessage::user(prompts::resolution_prompt(query, available_areas)),
        ];
        let options = CompletionOptions {
            temperature: self.resolve_temperature,
            max_tokens: None,
        };

        let content = self.client.complete(&messages, options).await?;
        debug!("Resolution reply: {}", content);

        parse_resolution(&content, available_areas)
    }
}

#[async_trait]
impl SummaryGenerationService for LlmService {
    async fn generate_summary(&self, request: &SummaryRequest) -> Result<String, ServiceError> {
        let messages = [
            ChatMessage::system(prompts::SUMMARY_SYSTEM_PROMPT),
            ChatMessage::user(prompts::summary_prompt(
                &request.query,
                &request.areas,
                &request.statistics,
            )),
        ];
        let options = CompletionOptions {
            temperature: self.summary_temperature,
            max_tokens: Some(self.summary_max_tokens),
        };

        let content = self.client.complete(&messages, options).await?;
        let summary = content.trim();

        if summary.is_empty() {
            return Err(ServiceError::EmptyResponse);
        }

        Ok(summary.to_string())
    }
}
