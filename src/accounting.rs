//! Token counting and cost accounting.
//!
//! Costs are *estimated* locally rather than read from the provider's usage
//! report: the same numbers then come out whichever provider served the call,
//! and the ledger can be updated the moment a line is done.
//!
//! Counting goes through a [`TokenEncoder`]. The default one wraps the
//! `tiktoken` vocabulary for the configured model. When no vocabulary is known
//! for the model, or encoding fails, [`approximate_tokens`] is used instead:
//! whitespace-separated words × 1.3. A tokenizer problem never stops a
//! translation.

use crate::error::TokenizerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Count tokens without a tokenizer: word count × 1.3, truncated toward
/// zero.
pub fn approximate_tokens(text: &str) -> u64 {
    let words = text.split_whitespace().count() as u64;
    words * 13 / 10
}

/// Count tokens for `text` with the tokenizer of `model`.
///
/// Loads the vocabulary on every call; use a [`TokenAccountant`] when
/// counting repeatedly.
pub fn count_tokens(text: &str, model: &str) -> u64 {
    TokenAccountant::for_model(model).count_tokens(text)
}

// ── Encoders ─────────────────────────────────────────────────────────────

/// A model-aware tokenizer.
pub trait TokenEncoder: Send + Sync {
    /// Number of tokens `text` encodes to.
    fn count(&self, text: &str) -> Result<usize, TokenizerError>;
}

/// `tiktoken` BPE encoder.
pub struct TiktokenEncoder {
    bpe: CoreBPE,
}

impl TiktokenEncoder {
    /// Load the vocabulary used by `model` (e.g. `o200k_base` for gpt-4o).
    pub fn for_model(model: &str) -> Result<Self, TokenizerError> {
        let bpe = tiktoken_rs::get_bpe_from_model(model).map_err(|e| {
            TokenizerError::Unavailable {
                model: model.to_string(),
                detail: e.to_string(),
            }
        })?;
        Ok(Self { bpe })
    }
}

impl TokenEncoder for TiktokenEncoder {
    fn count(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(self.bpe.encode_with_special_tokens(text).len())
    }
}

// ── Pricing ──────────────────────────────────────────────────────────────

/// Published price of a model, in US dollars per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// Model-name prefixes and their prices. Longer prefixes come first so that
/// `gpt-4o-mini` wins over `gpt-4o`.
const PRICE_TABLE: &[(&str, f64, f64)] = &[
    ("gpt-4o-mini", 0.15, 0.60),
    ("gpt-4o", 2.50, 10.00),
    ("gpt-4.1-nano", 0.10, 0.40),
    ("gpt-4.1-mini", 0.40, 1.60),
    ("gpt-4.1", 2.00, 8.00),
    ("claude-sonnet-4", 3.00, 15.00),
    ("claude-haiku-4", 0.80, 4.00),
    ("gemini-2.0-flash", 0.10, 0.40),
    ("mistral-small", 0.10, 0.30),
];

impl ModelPricing {
    /// Price of `gpt-4o-mini`, the default translation model.
    pub const GPT_4O_MINI: ModelPricing = ModelPricing {
        input_per_million: 0.15,
        output_per_million: 0.60,
    };

    pub fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }

    /// Look up a model's price by name prefix, so dated snapshots such as
    /// `gpt-4o-mini-2024-07-18` resolve. Unknown models are priced as
    /// [`ModelPricing::GPT_4O_MINI`].
    pub fn for_model(model: &str) -> Self {
        PRICE_TABLE
            .iter()
            .find(|(prefix, _, _)| model.starts_with(prefix))
            .map(|&(_, input, output)| Self::new(input, output))
            .unwrap_or(Self::GPT_4O_MINI)
    }

    pub fn input_cost(&self, tokens: u64) -> f64 {
        tokens as f64 * self.input_per_million / 1_000_000.0
    }

    pub fn output_cost(&self, tokens: u64) -> f64 {
        tokens as f64 * self.output_per_million / 1_000_000.0
    }
}

impl Default for ModelPricing {
    fn default() -> Self {
        Self::GPT_4O_MINI
    }
}

// ── Ledger ───────────────────────────────────────────────────────────────

/// Running token and cost totals for one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenLedger {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

impl TokenLedger {
    /// Add one line's usage and recompute the costs from the new totals.
    pub fn accumulate(&mut self, input_tokens: u64, output_tokens: u64, pricing: &ModelPricing) -> &Self {
        self.input_tokens += input_tokens;
        self.output_tokens += output_tokens;
        self.input_cost = pricing.input_cost(self.input_tokens);
        self.output_cost = pricing.output_cost(self.output_tokens);
        self.total_cost = self.input_cost + self.output_cost;
        self
    }
}

impl fmt::Display for TokenLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tokens in / {} tokens out  ${:.4}",
            self.input_tokens, self.output_tokens, self.total_cost
        )
    }
}

// ── Accountant ───────────────────────────────────────────────────────────

/// Counts tokens for prompts and responses and prices them.
///
/// Holds no running totals; the driver owns the [`TokenLedger`] for each
/// document.
#[derive(Clone)]
pub struct TokenAccountant {
    encoder: Option<Arc<dyn TokenEncoder>>,
    pricing: ModelPricing,
}

impl TokenAccountant {
    /// Tokenizer and price for `model`. Falls back to the word-count
    /// estimate when `tiktoken` does not know the model.
    pub fn for_model(model: &str) -> Self {
        let encoder = match TiktokenEncoder::for_model(model) {
            Ok(enc) => Some(Arc::new(enc) as Arc<dyn TokenEncoder>),
            Err(e) => {
                debug!("{e}; using word-count estimate");
                None
            }
        };
        Self {
            encoder,
            pricing: ModelPricing::for_model(model),
        }
    }

    pub fn with_encoder(encoder: Arc<dyn TokenEncoder>, pricing: ModelPricing) -> Self {
        Self {
            encoder: Some(encoder),
            pricing,
        }
    }

    /// Word-count estimates only.
    pub fn approximate(pricing: ModelPricing) -> Self {
        Self {
            encoder: None,
            pricing,
        }
    }

    pub fn with_pricing(mut self, pricing: ModelPricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn pricing(&self) -> &ModelPricing {
        &self.pricing
    }

    pub fn has_tokenizer(&self) -> bool {
        self.encoder.is_some()
    }

    /// Token count for `text`. Never fails.
    pub fn count_tokens(&self, text: &str) -> u64 {
        match &self.encoder {
            Some(enc) => match enc.count(text) {
                Ok(n) => n as u64,
                Err(e) => {
                    debug!("{e}; using word-count estimate");
                    approximate_tokens(text)
                }
            },
            None => approximate_tokens(text),
        }
    }

    /// Input and output tokens for one translated line.
    ///
    /// Input is the system prompt plus the trimmed source line; output is the
    /// trimmed translation.
    pub fn line_usage(&self, prompt: &str, source_line: &str, translated: &str) -> (u64, u64) {
        let input = self.count_tokens(prompt) + self.count_tokens(source_line.trim());
        let output = self.count_tokens(translated.trim());
        (input, output)
    }
}

impl fmt::Debug for TokenAccountant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAccountant")
            .field("encoder", &self.encoder.as_ref().map(|_| "<dyn TokenEncoder>"))
            .field("pricing", &self.pricing)
            .finish()
    }
}
