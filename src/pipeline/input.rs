//! Input resolution: turn a user-supplied path or URL into a local PDF.
//!
//! URLs are downloaded into a `TempDir` that lives as long as the
//! [`ResolvedInput`], so the file disappears when the pipeline is done with
//! it. Both paths check the `%PDF` magic bytes and the size limit before the
//! OCR service sees a single byte.

use crate::error::TranslateError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved input: either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the PDF lives in a temp directory kept alive here.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Path to the PDF regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a local PDF no larger than `max_size` bytes.
pub async fn resolve_input(
    input: &str,
    timeout_secs: u64,
    max_size: u64,
) -> Result<ResolvedInput, TranslateError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TranslateError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs, max_size).await
    } else {
        resolve_local(input, max_size)
    }
}

/// Read a local text file (used for markdown input).
pub async fn read_text(path_str: &str) -> Result<String, TranslateError> {
    let path = PathBuf::from(path_str);
    tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TranslateError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => TranslateError::PermissionDenied { path },
        _ => TranslateError::InvalidInput {
            input: format!("{}: {}", path_str, e),
        },
    })
}

fn resolve_local(path_str: &str, max_size: u64) -> Result<ResolvedInput, TranslateError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(TranslateError::FileNotFound { path });
    }
    if path.is_dir() {
        return Err(TranslateError::InvalidInput {
            input: path_str.to_string(),
        });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(TranslateError::PermissionDenied { path });
        }
        Err(_) => return Err(TranslateError::FileNotFound { path }),
    };

    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    check_size(&path, size, max_size)?;

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() {
        check_magic(&path, &magic)?;
    } else {
        return Err(TranslateError::NotAPdf { path, magic });
    }

    debug!("Resolved local PDF: {} ({} bytes)", path.display(), size);
    Ok(ResolvedInput::Local(path))
}

fn check_size(path: &Path, size: u64, limit: u64) -> Result<(), TranslateError> {
    if size > limit {
        return Err(TranslateError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }
    Ok(())
}

fn check_magic(path: &Path, bytes: &[u8]) -> Result<(), TranslateError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(TranslateError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

async fn download_url(
    url: &str,
    timeout_secs: u64,
    max_size: u64,
) -> Result<ResolvedInput, TranslateError> {
    info!("Downloading PDF from: {}", url);

    let failed = |reason: String| TranslateError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            TranslateError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let filename = extract_filename(url);
    let temp_dir = TempDir::new().map_err(|e| TranslateError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    if let Some(len) = response.content_length() {
        check_size(&file_path, len, max_size)?;
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    check_size(&file_path, bytes.len() as u64, max_size)?;
    check_magic(&file_path, &bytes)?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| TranslateError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of `url` if it looks like a file name.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &TempDir, name: &str, bytes: &[u8]) -> String {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(bytes)
            .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_url() {
        assert_eq!(extract_filename("https://x.org/papers/a.pdf"), "a.pdf");
        assert_eq!(extract_filename("https://x.org/papers/"), "downloaded.pdf");
        assert_eq!(extract_filename("https://x.org/download"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn accepts_small_pdf() {
        let dir = TempDir::new().unwrap();
        let p = write_temp(&dir, "ok.pdf", b"%PDF-1.7\n...");
        let resolved = resolve_input(&p, 5, 1024).await.unwrap();
        assert!(matches!(resolved, ResolvedInput::Local(_)));
        assert!(resolved.path().ends_with("ok.pdf"));
    }

    #[tokio::test]
    async fn rejects_missing_file() {
        let err = resolve_input("/definitely/not/here.pdf", 5, 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn rejects_non_pdf() {
        let dir = TempDir::new().unwrap();
        let p = write_temp(&dir, "fake.pdf", b"PK\x03\x04zip");
        let err = resolve_input(&p, 5, 1024).await.unwrap_err();
        match err {
            TranslateError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let p = write_temp(&dir, "big.pdf", &[b'%'; 64]);
        let err = resolve_input(&p, 5, 16).await.unwrap_err();
        assert!(matches!(
            err,
            TranslateError::FileTooLarge { size: 64, limit: 16, .. }
        ));
    }

    #[tokio::test]
    async fn rejects_empty_input() {
        let err = resolve_input("   ", 5, 16).await.unwrap_err();
        assert!(matches!(err, TranslateError::InvalidInput { .. }));
    }

    #[test]
    fn read_text_reports_missing_file() {
        let err = tokio_test::block_on(read_text("/no/such/file.md")).unwrap_err();
        assert!(matches!(err, TranslateError::FileNotFound { .. }));
    }
}
