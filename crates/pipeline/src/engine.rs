//! One model call per question.

use std::sync::Arc;
use std::time::Duration;

use docqa_config::AppConfig;
use docqa_core::{Provider, ProviderError, ProviderRequest};
use tokio::sync::Semaphore;
use tracing::debug;

/// Sends prompts to the configured provider and returns trimmed answers.
///
/// Calls are gated by a semaphore shared by every request in the process,
/// so a burst of requests cannot open more than
/// `pipeline.max_concurrent_model_calls` connections to the model service.
#[derive(Clone)]
pub struct AnswerEngine {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl AnswerEngine {
    pub fn new(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let model = config
            .providers
            .get(&config.default_provider)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone());

        Self {
            provider,
            model,
            temperature: config.default_temperature,
            max_tokens: config.default_max_tokens,
            permits: Arc::new(Semaphore::new(config.pipeline.max_concurrent_model_calls)),
            timeout: Duration::from_secs(config.pipeline.model_timeout_secs),
        }
    }

    /// Share an existing call pool instead of the one created in [`AnswerEngine::new`].
    pub fn with_permits(mut self, permits: Arc<Semaphore>) -> Self {
        self.permits = permits;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Ask the model one prompt and wait for the whole answer.
    pub async fn ask(&self, prompt: String) -> Result<String, ProviderError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ProviderError::NotConfigured("model call pool is closed".into()))?;

        let request = ProviderRequest::prompt(&self.model, prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!("no answer within {}s", self.timeout.as_secs()))
            })??;

        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Model call finished"
            );
        }

        let answer = response.message.content.trim();
        if answer.is_empty() {
            return Err(ProviderError::EmptyResponse("answer was blank".into()));
        }
        Ok(answer.to_string())
    }
}
