//! Configuration types for PDF translation.
//!
//! Every knob lives in [`TranslationConfig`], built via
//! [`TranslationConfigBuilder`]. One struct is easy to pass around, log and
//! compare between runs; the builder lets callers set only what they care
//! about and keep documented defaults for the rest.

use crate::accounting::{ModelPricing, TokenAccountant};
use crate::error::TranslateError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini-2024-07-18";

/// Largest input PDF accepted by default (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration for one translation run.
///
/// # Example
/// ```rust
/// use traduja::TranslationConfig;
///
/// let config = TranslationConfig::builder()
///     .source_lang("en")
///     .target_lang("fr")
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// assert_eq!(config.model_id(), "gpt-4o-mini");
/// ```
#[derive(Clone)]
pub struct TranslationConfig {
    /// Language code of the document. Default: `"en"`.
    pub source_lang: String,

    /// Language code to translate into. Default: `"pt"`.
    pub target_lang: String,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    ///
    /// Also selects the tokenizer and the price table entry used for the
    /// cost estimate.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.0.
    ///
    /// The same line with the same context should translate the same way
    /// every time, so randomness is off by default.
    pub temperature: f32,

    /// Maximum tokens the model may generate for one line. Default: 1024.
    pub max_tokens: usize,

    /// Price override for the cost estimate. If None, looked up from the
    /// model name.
    pub pricing: Option<ModelPricing>,

    /// OCR service settings.
    pub ocr: OcrConfig,

    /// Separator placed between OCR pages. Default: [`PageSeparator::None`].
    pub page_separator: PageSeparator,

    /// Largest input file accepted, in bytes. Default: 10 MiB.
    pub max_file_size: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Receives per-line progress and token updates.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: "en".to_string(),
            target_lang: "pt".to_string(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 1024,
            pricing: None,
            ocr: OcrConfig::default(),
            page_separator: PageSeparator::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("source_lang", &self.source_lang)
            .field("target_lang", &self.target_lang)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("pricing", &self.pricing)
            .field("ocr", &self.ocr)
            .field("page_separator", &self.page_separator)
            .field("max_file_size", &self.max_file_size)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn TranslationProgressCallback>"),
            )
            .finish()
    }
}

impl TranslationConfig {
    /// Create a new builder for `TranslationConfig`.
    pub fn builder() -> TranslationConfigBuilder {
        TranslationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The configured model, or [`DEFAULT_MODEL`].
    pub fn model_id(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Token accountant for the configured model and price.
    pub fn accountant(&self) -> TokenAccountant {
        let accountant = TokenAccountant::for_model(self.model_id());
        match self.pricing {
            Some(pricing) => accountant.with_pricing(pricing),
            None => accountant,
        }
    }
}

/// Builder for [`TranslationConfig`].
#[derive(Debug)]
pub struct TranslationConfigBuilder {
    config: TranslationConfig,
}

impl TranslationConfigBuilder {
    pub fn source_lang(mut self, code: impl Into<String>) -> Self {
        self.config.source_lang = code.into();
        self
    }

    pub fn target_lang(mut self, code: impl Into<String>) -> Self {
        self.config.target_lang = code.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn pricing(mut self, pricing: ModelPricing) -> Self {
        self.config.pricing = Some(pricing);
        self
    }

    pub fn ocr(mut self, ocr: OcrConfig) -> Self {
        self.config.ocr = ocr;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TranslationConfig, TranslateError> {
        let c = &self.config;
        if c.source_lang.trim().is_empty() || c.target_lang.trim().is_empty() {
            return Err(TranslateError::InvalidConfig(
                "Source and target language codes must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(TranslateError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.max_file_size == 0 {
            return Err(TranslateError::InvalidConfig(
                "max_file_size must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── OCR ──────────────────────────────────────────────────────────────────

/// Settings for the Mistral OCR endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// API base URL. Default: `https://api.mistral.ai`.
    pub endpoint: String,

    /// OCR model. Default: `mistral-ocr-latest`.
    pub model: String,

    /// API key. If None, read from `MISTRAL_API_KEY` when OCR runs.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout in seconds. Default: 300.
    ///
    /// OCR of a long PDF is one request, so this is much larger than a
    /// per-line timeout would be.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.mistral.ai".to_string(),
            model: "mistral-ocr-latest".to_string(),
            api_key: None,
            timeout_secs: 300,
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How OCR pages are joined into one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSeparator {
    /// No separator; pages joined with "\n\n". (default)
    #[default]
    None,
    /// Horizontal rule: "\n\n---\n\n"
    HorizontalRule,
    /// HTML comment with page number: "<!-- page N -->"
    Comment,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator placed before page `page_num` (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            PageSeparator::Comment => format!("\n\n<!-- page {} -->\n\n", page_num),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }
}
