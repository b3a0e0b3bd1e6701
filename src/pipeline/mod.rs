//! Pipeline stages around translation.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ ocr ──▶ postprocess ──▶ (translate) ──▶ postprocess
//! (URL/path) (Mistral) (clean source)               (final newline)
//! ```
//!
//! 1. [`input`]: canonicalise the user-supplied path or URL to a local PDF
//! 2. [`ocr`]: PDF to per-page markdown; the only stage with network I/O
//!    besides translation itself
//! 3. [`postprocess`]: deterministic text cleanup before and after
//!    translation

pub mod input;
pub mod ocr;
pub mod postprocess;
