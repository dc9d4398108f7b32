//! Input resolution: turn a path, URL or in-memory buffer into an [`Upload`].
//!
//! The rest of the pipeline only ever sees bytes plus a declared MIME type,
//! exactly what a web upload form hands over. Local files get their MIME type
//! from the extension, falling back to magic bytes; URLs use the
//! `Content-Type` header with the same fallbacks.

use crate::error::AtsError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One uploaded resume: name, declared content type and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Build an upload from bytes, guessing the MIME type from the name and
    /// then from the content.
    pub fn detect(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = detect_mime(&name, &bytes).to_string();
        Self { name, mime, bytes }
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_mime(&self.mime)
    }
}

const OCTET_STREAM: &str = "application/octet-stream";

/// What the loader should do with an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Extract text from every page.
    Pdf,
    /// Decode into an image and send it as-is.
    Image,
    /// Already text.
    Text,
}

impl DocumentKind {
    /// Map a MIME type (parameters ignored, case-insensitive).
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => Some(Self::Pdf),
            "image/jpeg" | "image/jpg" | "image/png" => Some(Self::Image),
            "text/plain" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" | "png" => Some(Self::Image),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Recognise PDF, PNG and JPEG by their leading bytes.
fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"%PDF") {
        Some("application/pdf")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else {
        None
    }
}

/// Extension decides the kind; for images the sniffed type wins so a PNG
/// saved as `.jpg` is still declared as PNG.
fn detect_mime(name: &str, bytes: &[u8]) -> &'static str {
    let sniffed = sniff_mime(bytes);
    match DocumentKind::from_path(Path::new(name)) {
        Some(DocumentKind::Pdf) => "application/pdf",
        Some(DocumentKind::Text) => "text/plain",
        Some(DocumentKind::Image) => match sniffed {
            Some(m @ ("image/png" | "image/jpeg")) => m,
            _ if name.to_ascii_lowercase().ends_with(".png") => "image/png",
            _ => "image/jpeg",
        },
        None => sniffed.unwrap_or(OCTET_STREAM),
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or URL into an [`Upload`].
pub async fn resolve_upload(input: &str, timeout_secs: u64) -> Result<Upload, AtsError> {
    if input.trim().is_empty() {
        return Err(AtsError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<Upload, AtsError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => AtsError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => AtsError::FileNotFound {
            path: PathBuf::from(path),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let upload = Upload::detect(name, bytes);
    debug!("Resolved local resume: {} ({})", path.display(), upload.mime);
    Ok(upload)
}

/// Download a URL and return its body as an upload.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Upload, AtsError> {
    info!("Downloading resume from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AtsError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AtsError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            AtsError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(AtsError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let name = filename_from_url(url);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AtsError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    let upload = match content_type {
        Some(ct) if DocumentKind::from_mime(&ct).is_some() => Upload::new(name, ct, bytes),
        _ => Upload::detect(name, bytes),
    };

    info!("Downloaded {} ({} bytes, {})", upload.name, upload.bytes.len(), upload.mime);
    Ok(upload)
}

/// Last URL path segment, or `resume` when there is none.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    "resume".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/cv.pdf"));
        assert!(is_url("http://example.com/cv.pdf"));
        assert!(!is_url("/tmp/cv.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn kind_from_mime() {
        assert_eq!(DocumentKind::from_mime("application/pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_mime("IMAGE/PNG"), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_mime("image/jpeg"), Some(DocumentKind::Image));
        assert_eq!(
            DocumentKind::from_mime("text/plain; charset=utf-8"),
            Some(DocumentKind::Text)
        );
        assert_eq!(DocumentKind::from_mime("application/zip"), None);
    }

    #[test]
    fn detect_prefers_extension_then_magic() {
        let u = Upload::detect("cv.PDF", b"garbage".to_vec());
        assert_eq!(u.mime, "application/pdf");

        let u = Upload::detect("scan", b"%PDF-1.7 ...".to_vec());
        assert_eq!(u.mime, "application/pdf");

        let u = Upload::detect("notes.docx", b"PK\x03\x04".to_vec());
        assert_eq!(u.mime, "application/octet-stream");
        assert_eq!(u.kind(), None);
    }

    #[test]
    fn image_mime_follows_content() {
        let u = Upload::detect("cv.jpg", b"\x89PNG\r\n\x1a\nrest".to_vec());
        assert_eq!(u.mime, "image/png");

        let u = Upload::detect("cv.png", b"truncated".to_vec());
        assert_eq!(u.mime, "image/png");
        assert_eq!(u.kind(), Some(DocumentKind::Image));
    }

    #[test]
    fn filename_from_url_uses_last_segment() {
        assert_eq!(filename_from_url("https://x.io/people/jane.pdf"), "jane.pdf");
        assert_eq!(filename_from_url("https://x.io/"), "resume");
    }

    #[tokio::test]
    async fn missing_local_file_is_fatal() {
        let err = resolve_upload("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, AtsError::FileNotFound { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn reads_local_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jane.txt");
        std::fs::write(&path, "Go, 6 years").unwrap();

        let u = resolve_upload(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(u.name, "jane.txt");
        assert_eq!(u.mime, "text/plain");
        assert_eq!(u.bytes, b"Go, 6 years");
    }
}
