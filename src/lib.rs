//! # traduja
//!
//! Translate PDF documents line by line with Large Language Models.
//!
//! ## Why line by line?
//!
//! Whole-document translation lets the model merge, drop or reorder
//! paragraphs, and long documents do not fit a single context window anyway.
//! This crate instead sends every non-blank line on its own, together with a
//! small window of neighbouring lines for disambiguation. The output has
//! exactly as many lines as the input, blank lines stay where they were, and
//! Markdown structure (headings, lists, tables) survives untouched.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL (%PDF, ≤ 10 MiB)
//!  ├─ 2. OCR        Mistral OCR → markdown per page
//!  ├─ 3. Assemble   join pages, normalise line endings
//!  ├─ 4. Translate  one model call per non-blank line, 3 lines of context
//!  │                on each side, running token and cost ledger
//!  └─ 5. Output     source + translated markdown, optional HTML
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use traduja::{translate_pdf, TranslationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY,
//!     // OCR from MISTRAL_API_KEY.
//!     let config = TranslationConfig::builder().target_lang("fr").build()?;
//!     let output = translate_pdf("paper.pdf", &config).await?;
//!     println!("{}", output.markdown);
//!     eprintln!("{}", output.ledger);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `traduja` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! traduja = { version = "0.1", default-features = false }
//! ```
//!
//! ## Cost
//!
//! Every line carries the full instruction prompt, so input tokens dominate.
//! A 20-page paper (about 600 non-blank lines) costs roughly **$0.03** with
//! the default `gpt-4o-mini`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod accounting;
pub mod client;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod language;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod render;
pub mod translate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use accounting::{approximate_tokens, ModelPricing, TokenAccountant, TokenEncoder, TokenLedger};
pub use client::{resolve_provider, translate_line, CompletionClient, LlmClient};
pub use config::{OcrConfig, PageSeparator, TranslationConfig, TranslationConfigBuilder, DEFAULT_MODEL};
pub use context::{select_context, Direction};
pub use convert::{
    extract_markdown, output_file_name, source_stem, translate_markdown, translate_markdown_sync,
    translate_markdown_with, translate_pdf, translate_pdf_to_dir, translate_pdf_with,
    write_outputs,
};
pub use error::{TokenizerError, TranslateError};
pub use language::{display_name, Language};
pub use output::{PageText, TranslationOutput, TranslationStats};
pub use pipeline::ocr::{MistralOcr, OcrExtractor};
pub use pipeline::postprocess::finish_markdown;
pub use progress::{FnCallbacks, NoopProgressCallback, ProgressCallback, TranslationProgressCallback};
pub use prompts::build_prompt;
pub use render::markdown_to_html;
pub use translate::{translate_document, DocumentTranslation, LineTranslator};
