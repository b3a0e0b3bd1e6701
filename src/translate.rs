//! Line-by-line document translation.
//!
//! ## Algorithm
//!
//! ```text
//! input lines ──▶ for i in 0..N
//!                   │
//!                   ├─ blank? ──▶ push "" ──▶ on_line_complete
//!                   │
//!                   └─ before = last 3 non-blank of OUTPUT[..i]
//!                      after  = next 3 non-blank of INPUT[i+1..]
//!                      prompt = compose(source, target, before, after)
//!                      out    = client.complete(prompt, line.trim()).trim()
//!                      push out ──▶ ledger += usage
//!                               ──▶ on_line_complete ──▶ on_token_update
//! ```
//!
//! Lines are awaited one at a time: line `i` sees the translations of the
//! lines before it, which a concurrent schedule could not provide. The first
//! failing call aborts the document; nothing partial is returned.

use crate::accounting::{TokenAccountant, TokenLedger};
use crate::client::{translate_line, CompletionClient};
use crate::context::{select_context, Direction};
use crate::error::TranslateError;
use crate::progress::TranslationProgressCallback;
use crate::prompts::build_prompt;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Result of translating one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentTranslation {
    /// Translated text, same number of lines as the input.
    pub text: String,
    /// Token and cost totals for the whole document.
    pub ledger: TokenLedger,
    /// Number of lines sent to the model (non-blank lines).
    pub model_calls: usize,
    /// Number of lines in the document, blank ones included.
    pub total_lines: usize,
}

/// Translates documents line by line through a [`CompletionClient`].
pub struct LineTranslator<'a> {
    client: &'a dyn CompletionClient,
    accountant: TokenAccountant,
    source: String,
    target: String,
}

impl<'a> LineTranslator<'a> {
    /// Create a translator from `source` to `target` language codes.
    pub fn new(
        client: &'a dyn CompletionClient,
        accountant: TokenAccountant,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            client,
            accountant,
            source: source.into(),
            target: target.into(),
        }
    }

    /// Translate `text`, splitting on `'\n'`.
    ///
    /// The output has exactly as many lines as the input and every blank
    /// input line is blank in the output. An empty string is one blank line.
    pub async fn translate(
        &self,
        text: &str,
        callback: Option<&dyn TranslationProgressCallback>,
    ) -> Result<DocumentTranslation, TranslateError> {
        let input: Vec<&str> = text.split('\n').collect();
        let total = input.len();
        let mut output: Vec<String> = Vec::with_capacity(total);
        let mut ledger = TokenLedger::default();
        let mut model_calls = 0usize;

        info!(
            "Translating {} lines from {} to {}",
            total, self.source, self.target
        );
        if let Some(cb) = callback {
            cb.on_translation_start(total);
        }

        for (i, line) in input.iter().enumerate() {
            if line.trim().is_empty() {
                output.push(String::new());
                if let Some(cb) = callback {
                    cb.on_line_complete(i + 1, total);
                }
                continue;
            }

            let before = select_context(&output, i, Direction::Before);
            let after = select_context(&input, i, Direction::After);
            let prompt = build_prompt(&self.source, &self.target, &before, &after);

            let translated = translate_line(self.client, &prompt, line)
                .await
                .map_err(|e| e.at_line(i + 1))?;
            model_calls += 1;

            if translated.is_empty() {
                warn!("Line {}: model returned an empty translation", i + 1);
            }

            let (input_tokens, output_tokens) =
                self.accountant.line_usage(&prompt, line, &translated);
            ledger.accumulate(input_tokens, output_tokens, self.accountant.pricing());
            debug!(
                "Line {}/{}: {} tokens in, {} tokens out",
                i + 1,
                total,
                input_tokens,
                output_tokens
            );

            output.push(translated);

            if let Some(cb) = callback {
                cb.on_line_complete(i + 1, total);
                cb.on_token_update(&ledger);
            }
        }

        if let Some(cb) = callback {
            cb.on_translation_complete(total, model_calls);
        }
        info!("Translation complete: {} model calls, {}", model_calls, ledger);

        Ok(DocumentTranslation {
            text: output.join("\n"),
            ledger,
            model_calls,
            total_lines: total,
        })
    }
}

/// Translate `text` from `source` to `target` and return only the text.
///
/// Token counts use the default model's tokenizer and prices; use
/// [`LineTranslator`] to choose them or to read the ledger afterwards.
pub async fn translate_document(
    text: &str,
    client: &dyn CompletionClient,
    source: &str,
    target: &str,
    callbacks: Option<&dyn TranslationProgressCallback>,
) -> Result<String, TranslateError> {
    let accountant = TokenAccountant::for_model(crate::config::DEFAULT_MODEL);
    let translator = LineTranslator::new(client, accountant, source, target);
    Ok(translator.translate(text, callbacks).await?.text)
}
