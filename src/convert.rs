//! Top-level entry points: PDF or markdown in, translated markdown out.
//!
//! ## Pipeline
//!
//! ```text
//! input ──▶ resolve ──▶ provider ──▶ OCR ──▶ join + clean ──▶ translate
//! (path/URL) (%PDF, size) (config)   (pages)  (separator)     (line by line)
//! ```
//!
//! The provider is resolved before OCR runs: a missing API key should fail
//! before anything is paid for. The `*_with` variants take the OCR backend
//! and completion client as trait objects, which is how the integration
//! tests run the whole pipeline without a network.

use crate::client::{resolve_provider, CompletionClient, LlmClient};
use crate::config::TranslationConfig;
use crate::error::TranslateError;
use crate::output::{PageText, TranslationOutput, TranslationStats};
use crate::pipeline::ocr::{join_pages, MistralOcr, OcrExtractor};
use crate::pipeline::{input, postprocess};
use crate::render::markdown_to_html;
use crate::translate::LineTranslator;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Translate a PDF file or URL.
///
/// # Errors
/// Everything is fatal: bad input, missing provider or OCR key, OCR failure,
/// a document with no text, or any failed model call.
pub async fn translate_pdf(
    input_str: impl AsRef<str>,
    config: &TranslationConfig,
) -> Result<TranslationOutput, TranslateError> {
    let resolved = input::resolve_input(
        input_str.as_ref(),
        config.download_timeout_secs,
        config.max_file_size,
    )
    .await?;
    let provider = resolve_provider(config).await?;
    let ocr = MistralOcr::from_config(&config.ocr)?;
    let client = LlmClient::from_config(provider, config);
    run_pdf(resolved.path(), config, &ocr, &client).await
}

/// [`translate_pdf`] with caller-supplied OCR backend and completion client.
pub async fn translate_pdf_with(
    input_str: impl AsRef<str>,
    config: &TranslationConfig,
    ocr: &dyn OcrExtractor,
    client: &dyn CompletionClient,
) -> Result<TranslationOutput, TranslateError> {
    let resolved = input::resolve_input(
        input_str.as_ref(),
        config.download_timeout_secs,
        config.max_file_size,
    )
    .await?;
    run_pdf(resolved.path(), config, ocr, client).await
}

async fn run_pdf(
    pdf_path: &Path,
    config: &TranslationConfig,
    ocr: &dyn OcrExtractor,
    client: &dyn CompletionClient,
) -> Result<TranslationOutput, TranslateError> {
    let total_start = Instant::now();
    info!("Starting translation: {}", pdf_path.display());

    let ocr_start = Instant::now();
    let (pages, source) = extract_with(pdf_path, config, ocr).await?;
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;

    let mut output = run_markdown(source, config, client).await?;
    output.pages = pages;
    output.stats.pages = output.pages.len();
    output.stats.ocr_duration_ms = ocr_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Translate a markdown document, skipping OCR.
pub async fn translate_markdown(
    text: &str,
    config: &TranslationConfig,
) -> Result<TranslationOutput, TranslateError> {
    let provider = resolve_provider(config).await?;
    let client = LlmClient::from_config(provider, config);
    translate_markdown_with(text, config, &client).await
}

/// [`translate_markdown`] with a caller-supplied completion client.
///
/// Only line endings and invisible characters are normalised; blank lines
/// and trailing whitespace are translated as given.
pub async fn translate_markdown_with(
    text: &str,
    config: &TranslationConfig,
    client: &dyn CompletionClient,
) -> Result<TranslationOutput, TranslateError> {
    run_markdown(postprocess::normalise_source(text), config, client).await
}

/// Synchronous wrapper around [`translate_markdown`].
///
/// Creates a temporary tokio runtime internally.
pub fn translate_markdown_sync(
    text: &str,
    config: &TranslationConfig,
) -> Result<TranslationOutput, TranslateError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TranslateError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(translate_markdown(text, config))
}

async fn run_markdown(
    source: String,
    config: &TranslationConfig,
    client: &dyn CompletionClient,
) -> Result<TranslationOutput, TranslateError> {
    let start = Instant::now();
    let translator = LineTranslator::new(
        client,
        config.accountant(),
        config.source_lang.as_str(),
        config.target_lang.as_str(),
    );
    let result = translator
        .translate(&source, config.progress_callback.as_deref())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let stats = TranslationStats {
        pages: 0,
        total_lines: result.total_lines,
        blank_lines: result.total_lines - result.model_calls,
        model_calls: result.model_calls,
        input_tokens: result.ledger.input_tokens,
        output_tokens: result.ledger.output_tokens,
        total_cost: result.ledger.total_cost,
        ocr_duration_ms: 0,
        translation_duration_ms: elapsed,
        total_duration_ms: elapsed,
    };

    Ok(TranslationOutput {
        source_lang: config.source_lang.clone(),
        target_lang: config.target_lang.clone(),
        model: config.model_id().to_string(),
        source_markdown: source,
        markdown: result.text,
        pages: Vec::new(),
        ledger: result.ledger,
        stats,
    })
}

/// OCR a PDF file or URL and return the joined, cleaned markdown.
///
/// Needs only the OCR key; no LLM provider is resolved.
pub async fn extract_markdown(
    input_str: impl AsRef<str>,
    config: &TranslationConfig,
) -> Result<String, TranslateError> {
    let resolved = input::resolve_input(
        input_str.as_ref(),
        config.download_timeout_secs,
        config.max_file_size,
    )
    .await?;
    let ocr = MistralOcr::from_config(&config.ocr)?;
    let (_, markdown) = extract_with(resolved.path(), config, &ocr).await?;
    Ok(markdown)
}

async fn extract_with(
    pdf_path: &Path,
    config: &TranslationConfig,
    ocr: &dyn OcrExtractor,
) -> Result<(Vec<PageText>, String), TranslateError> {
    let raw = ocr.extract_pages(pdf_path).await?;
    if raw.iter().all(|p| p.trim().is_empty()) {
        return Err(TranslateError::EmptyDocument {
            path: pdf_path.to_path_buf(),
        });
    }
    info!("OCR extracted {} pages", raw.len());

    let markdown = postprocess::clean_source(&join_pages(&raw, &config.page_separator));
    let pages = raw
        .into_iter()
        .enumerate()
        .map(|(i, markdown)| PageText {
            page: i + 1,
            markdown,
        })
        .collect();
    Ok((pages, markdown))
}

/// Translate a PDF and write the results into `dir`.
///
/// Writes `{stem}.md` (source) and `{stem}_{target}.md` (translation).
pub async fn translate_pdf_to_dir(
    input_str: impl AsRef<str>,
    dir: impl AsRef<Path>,
    config: &TranslationConfig,
) -> Result<TranslationStats, TranslateError> {
    let input_str = input_str.as_ref();
    let output = translate_pdf(input_str, config).await?;
    write_outputs(&output, dir.as_ref(), &source_stem(input_str), false).await?;
    Ok(output.stats)
}

/// Write the source markdown, the translation and optionally an HTML
/// rendering of the translation into `dir`. Returns the written paths.
pub async fn write_outputs(
    output: &TranslationOutput,
    dir: &Path,
    stem: &str,
    html: bool,
) -> Result<Vec<PathBuf>, TranslateError> {
    let mut written = Vec::new();

    let source_path = dir.join(format!("{stem}.md"));
    write_atomic(&source_path, &postprocess::finish_markdown(&output.source_markdown)).await?;
    written.push(source_path);

    let translated_path = dir.join(output_file_name(stem, &output.target_lang, "md"));
    write_atomic(&translated_path, &postprocess::finish_markdown(&output.markdown)).await?;
    written.push(translated_path);

    if html {
        let html_path = dir.join(output_file_name(stem, &output.target_lang, "html"));
        let page = markdown_to_html(&output.markdown, stem, &output.target_lang);
        write_atomic(&html_path, &page).await?;
        written.push(html_path);
    }

    debug!("Wrote {} files to {}", written.len(), dir.display());
    Ok(written)
}

/// Write `contents` to `path` via a temp file and rename, so readers never
/// see a partial file.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), TranslateError> {
    let failed = |e: std::io::Error| TranslateError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(failed)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents).await.map_err(failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(failed)?;
    Ok(())
}

/// `"{stem}_{lang}.{ext}"`, the name of a translated download.
pub fn output_file_name(stem: &str, lang_code: &str, ext: &str) -> String {
    format!("{stem}_{lang_code}.{ext}")
}

/// File stem of a local path or URL, `"document"` when there is none.
pub fn source_stem(input: &str) -> String {
    let name = if input::is_url(input) {
        reqwest::Url::parse(input)
            .ok()
            .and_then(|u| {
                u.path_segments()
                    .and_then(|mut s| s.next_back().map(str::to_string))
            })
            .unwrap_or_default()
    } else {
        input.to_string()
    };

    Path::new(&name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names() {
        assert_eq!(output_file_name("paper", "pt", "md"), "paper_pt.md");
        assert_eq!(output_file_name("paper", "fr", "html"), "paper_fr.html");
    }

    #[test]
    fn stems_from_paths_and_urls() {
        assert_eq!(source_stem("/tmp/report.pdf"), "report");
        assert_eq!(source_stem("notes.v2.md"), "notes.v2");
        assert_eq!(source_stem("https://arxiv.org/pdf/2401.00001.pdf"), "2401.00001");
        assert_eq!(source_stem("https://example.com/"), "document");
        assert_eq!(source_stem(""), "document");
    }

    #[tokio::test]
    async fn atomic_write_creates_parent_and_leaves_no_tmp() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.md");
        write_atomic(&path, "olá\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "olá\n");
        assert!(!dir.path().join("nested").join("out.md.tmp").exists());
    }
}
