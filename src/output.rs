//! Result types returned by the translation entry points.

use crate::accounting::TokenLedger;
use serde::Serialize;

/// Markdown extracted from one PDF page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageText {
    /// 1-indexed page number.
    pub page: usize,
    pub markdown: String,
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TranslationStats {
    /// Pages returned by OCR (0 for markdown input).
    pub pages: usize,
    /// Lines in the source document, blank ones included.
    pub total_lines: usize,
    /// Lines copied through without a model call.
    pub blank_lines: usize,
    /// Lines sent to the model.
    pub model_calls: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Estimated cost in USD.
    pub total_cost: f64,
    pub ocr_duration_ms: u64,
    pub translation_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything one translation run produced.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationOutput {
    /// Source language code.
    pub source_lang: String,
    /// Target language code.
    pub target_lang: String,
    /// Model that translated the document.
    pub model: String,
    /// The source document as translated: OCR pages joined and cleaned.
    pub source_markdown: String,
    /// The translated document, one line per source line.
    pub markdown: String,
    /// Per-page OCR text (empty for markdown input).
    pub pages: Vec<PageText>,
    /// Final token and cost totals.
    pub ledger: TokenLedger,
    pub stats: TranslationStats,
}
