//! Progress and token-update callbacks for document translation.
//!
//! Inject an [`Arc<dyn TranslationProgressCallback>`] via
//! [`crate::config::TranslationConfigBuilder::progress_callback`], or pass one
//! straight to [`crate::translate::LineTranslator::translate`], to receive
//! events while a document is translated.
//!
//! Lines are translated one after another, so every method is called from
//! the translating task, in order, before the next line starts. Nothing is
//! queued: a slow callback slows the translation down.
//!
//! # Example
//!
//! ```rust
//! use traduja::{FnCallbacks, TranslationProgressCallback};
//!
//! let callbacks = FnCallbacks::new()
//!     .on_progress(|done, total| eprintln!("{done}/{total} lines"))
//!     .on_token_update(|ledger| eprintln!("${:.4} so far", ledger.total_cost));
//!
//! callbacks.on_line_complete(1, 10);
//! ```

use crate::accounting::TokenLedger;
use std::sync::Arc;

/// Observer for one document translation.
///
/// All methods have no-op defaults so implementors override only what they
/// need.
pub trait TranslationProgressCallback: Send + Sync {
    /// Called once before the first line.
    ///
    /// # Arguments
    /// * `total_lines` — number of lines in the document, blank ones included
    fn on_translation_start(&self, total_lines: usize) {
        let _ = total_lines;
    }

    /// Called after every line, blank or not.
    ///
    /// # Arguments
    /// * `lines_completed` — lines finished so far (current index + 1)
    /// * `total_lines`     — number of lines in the document
    fn on_line_complete(&self, lines_completed: usize, total_lines: usize) {
        let _ = (lines_completed, total_lines);
    }

    /// Called after every non-blank line with the running totals.
    ///
    /// Successive ledgers within one document never decrease.
    fn on_token_update(&self, ledger: &TokenLedger) {
        let _ = ledger;
    }

    /// Called once after the last line was translated successfully.
    ///
    /// # Arguments
    /// * `total_lines` — number of lines in the document
    /// * `model_calls` — non-blank lines that were sent to the model
    fn on_translation_complete(&self, total_lines: usize, model_calls: usize) {
        let _ = (total_lines, model_calls);
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopProgressCallback;

impl TranslationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::TranslationConfig`].
pub type ProgressCallback = Arc<dyn TranslationProgressCallback>;

type ProgressFn = Box<dyn Fn(usize, usize) + Send + Sync>;
type TokenFn = Box<dyn Fn(&TokenLedger) + Send + Sync>;

/// Adapts two optional closures to [`TranslationProgressCallback`].
#[derive(Default)]
pub struct FnCallbacks {
    progress: Option<ProgressFn>,
    tokens: Option<TokenFn>,
}

impl FnCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closure receiving `(lines_completed, total_lines)`.
    pub fn on_progress(mut self, f: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Closure receiving the cumulative ledger.
    pub fn on_token_update(mut self, f: impl Fn(&TokenLedger) + Send + Sync + 'static) -> Self {
        self.tokens = Some(Box::new(f));
        self
    }
}

impl TranslationProgressCallback for FnCallbacks {
    fn on_line_complete(&self, lines_completed: usize, total_lines: usize) {
        if let Some(ref f) = self.progress {
            f(lines_completed, total_lines);
        }
    }

    fn on_token_update(&self, ledger: &TokenLedger) {
        if let Some(ref f) = self.tokens {
            f(ledger);
        }
    }
}
