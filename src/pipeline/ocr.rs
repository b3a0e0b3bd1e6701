//! OCR extraction: PDF in, one markdown string per page out.
//!
//! The production backend is Mistral's OCR endpoint. The PDF is sent inline
//! as a base64 `data:` URI, so there is no separate upload step and no file
//! id to clean up afterwards.

use crate::config::{OcrConfig, PageSeparator};
use crate::error::TranslateError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Anything that can turn a PDF into per-page markdown.
#[async_trait]
pub trait OcrExtractor: Send + Sync {
    /// Markdown for each page, in page order.
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>, TranslateError>;
}

#[derive(Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: OcrDocument,
}

#[derive(Serialize)]
struct OcrDocument {
    #[serde(rename = "type")]
    kind: &'static str,
    document_url: String,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    pages: Vec<OcrPage>,
}

#[derive(Debug, Deserialize)]
struct OcrPage {
    index: usize,
    #[serde(default)]
    markdown: String,
}

/// Mistral OCR over HTTPS.
pub struct MistralOcr {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for MistralOcr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistralOcr")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl MistralOcr {
    /// Build a client from `config`; the API key falls back to
    /// `MISTRAL_API_KEY`.
    pub fn from_config(config: &OcrConfig) -> Result<Self, TranslateError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("MISTRAL_API_KEY").ok().filter(|k| !k.is_empty()))
            .ok_or_else(|| TranslateError::ProviderNotConfigured {
                provider: "mistral-ocr".to_string(),
                hint: "Set MISTRAL_API_KEY to enable PDF text extraction.".to_string(),
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranslateError::Internal(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl OcrExtractor for MistralOcr {
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>, TranslateError> {
        let failed = |detail: String| TranslateError::OcrFailed {
            path: path.to_path_buf(),
            detail,
        };

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| failed(format!("cannot read file: {e}")))?;
        let request = OcrRequest {
            model: &self.model,
            document: OcrDocument {
                kind: "document_url",
                document_url: format!("data:application/pdf;base64,{}", STANDARD.encode(&bytes)),
            },
        };

        info!("Sending {} bytes to OCR ({})", bytes.len(), self.model);
        let start = Instant::now();
        let response = self
            .http
            .post(format!("{}/v1/ocr", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| failed(e.to_string()))?;
        if !status.is_success() {
            return Err(failed(format!("HTTP {status}: {}", truncate(&body, 300))));
        }

        let pages = parse_response(&body).map_err(failed)?;
        debug!("OCR returned {} pages in {:?}", pages.len(), start.elapsed());
        Ok(pages)
    }
}

/// Page markdown from an OCR response body, ordered by page index.
fn parse_response(body: &str) -> Result<Vec<String>, String> {
    let mut parsed: OcrResponse =
        serde_json::from_str(body).map_err(|e| format!("unreadable OCR response: {e}"))?;
    parsed.pages.sort_by_key(|p| p.index);
    Ok(parsed.pages.into_iter().map(|p| p.markdown).collect())
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Join page texts into one document with `separator` between pages.
pub fn join_pages<S: AsRef<str>>(pages: &[S], separator: &PageSeparator) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            out.push_str(&separator.render(i + 1));
        }
        out.push_str(page.as_ref().trim_matches('\n'));
    }
    out
}
