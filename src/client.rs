//! Translation client adapter: one system prompt plus one line in, one
//! translated line out.
//!
//! The driver only sees [`CompletionClient`], so tests can script responses
//! without a network. [`LlmClient`] is the production implementation over an
//! `edgequake-llm` provider.

use crate::config::TranslationConfig;
use crate::error::TranslateError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A chat model reduced to what line translation needs.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `system_prompt` as the system message and `user_message` as the
    /// user message; return the raw response text.
    ///
    /// Failures are reported as [`TranslateError::LlmApiError`]. The line
    /// number is left at 0 and filled in by the driver.
    async fn complete(&self, system_prompt: &str, user_message: &str)
        -> Result<String, TranslateError>;
}

/// [`CompletionClient`] over an `edgequake-llm` provider.
pub struct LlmClient {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmClient {
    /// Wrap `provider` with deterministic sampling (temperature 0.0).
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            temperature: 0.0,
            max_tokens: 1024,
        }
    }

    /// Wrap `provider` with the sampling settings from `config`.
    pub fn from_config(provider: Arc<dyn LLMProvider>, config: &TranslationConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, TranslateError> {
        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_message),
        ];
        let options = self.options();

        let start = Instant::now();
        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| TranslateError::LlmApiError {
                line: 0,
                message: e.to_string(),
            })?;

        debug!(
            "{} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Translate one line: the prompt goes out as the system message, the trimmed
/// line as the user message, and the response comes back trimmed.
pub async fn translate_line(
    client: &dyn CompletionClient,
    prompt: &str,
    line: &str,
) -> Result<String, TranslateError> {
    let response = client.complete(prompt, line.trim()).await?;
    Ok(response.trim().to_string())
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, TranslateError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        TranslateError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`), built by
///    [`ProviderFactory::create_llm_provider`] which reads the matching API
///    key from the environment.
/// 3. **`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`**, when both are set.
/// 4. **`OPENAI_API_KEY`** present: OpenAI with the configured model.
/// 5. **[`ProviderFactory::from_env`]**, whatever key it finds first.
///
/// Runs before any line is touched, so a missing key never costs a model
/// call.
pub async fn resolve_provider(
    config: &TranslationConfig,
) -> Result<Arc<dyn LLMProvider>, TranslateError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_id());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", config.model_id());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| TranslateError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
