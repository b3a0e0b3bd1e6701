//! Error types for the traduja library.
//!
//! Two error types reflect two different failure policies:
//!
//! * [`TranslateError`] (**fatal**): the pipeline cannot continue (bad
//!   input file, provider not configured, a model call failed). Returned as
//!   `Err(TranslateError)` from every top-level entry point. A failed model
//!   call aborts the whole document: lines already translated are not
//!   returned, only what the progress callbacks reported before the failure.
//!
//! * [`TokenizerError`] (**absorbed**): the tokenizer for a model could not
//!   be loaded or failed on some input. Token accounting falls back to a
//!   word-count approximation; this error never leaves
//!   [`crate::accounting`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the traduja library.
#[derive(Debug, Error)]
pub enum TranslateError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The file is larger than the configured upload limit.
    #[error("File '{path}' is {size} bytes; the maximum allowed is {limit} bytes")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR service rejected the request or returned an unreadable body.
    #[error("OCR failed for '{path}': {detail}")]
    OcrFailed { path: PathBuf, detail: String },

    /// OCR succeeded but produced no text at all.
    #[error("No text could be extracted from '{path}'")]
    EmptyDocument { path: PathBuf },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("Provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// A completion call failed. Translation of the document stops here.
    #[error("LLM API error on line {line}: {message}")]
    LlmApiError { line: usize, message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TranslateError {
    /// Attach the 1-indexed line number to a completion failure.
    ///
    /// Clients report failures with `line: 0` because they don't know where
    /// in the document they are; the driver fills it in.
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            TranslateError::LlmApiError { message, .. } => {
                TranslateError::LlmApiError { line, message }
            }
            other => other,
        }
    }
}

/// Tokenizer failure. Never fatal; see [`crate::accounting::TokenAccountant`].
#[derive(Debug, Clone, Error)]
pub enum TokenizerError {
    /// No BPE vocabulary is known for this model name.
    #[error("no tokenizer available for model '{model}': {detail}")]
    Unavailable { model: String, detail: String },

    /// The encoder failed on a particular input.
    #[error("tokenizer failed: {0}")]
    EncodeFailed(String),
}
