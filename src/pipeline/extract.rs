//! Document loading: PDF → text, image bytes → decoded image.
//!
//! pdfium is not async-safe, so PDF extraction runs on the blocking pool.
//! Extraction failures are not retried: a PDF that pdfium cannot open now
//! will not open on the next attempt either.

use crate::error::DocumentError;
use crate::pipeline::input::{DocumentKind, Upload};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Environment variable pointing at a directory or file holding libpdfium.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Content ready for the model.
#[derive(Debug, Clone)]
pub enum LoadedContent {
    Text(String),
    Image(DynamicImage),
}

/// Options that affect loading.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub pdf_only: bool,
    pub password: Option<String>,
}

/// Turn an upload into text or an image according to its declared type.
pub async fn load_document(upload: &Upload, opts: &LoadOptions) -> Result<LoadedContent, DocumentError> {
    let kind = upload.kind().ok_or_else(|| DocumentError::Unsupported {
        mime: upload.mime.clone(),
    })?;

    match kind {
        DocumentKind::Pdf => {
            let bytes = upload.bytes.clone();
            let password = opts.password.clone();
            let text = tokio::task::spawn_blocking(move || {
                extract_pdf_text(&bytes, password.as_deref())
            })
            .await
            .map_err(|e| DocumentError::Extraction {
                detail: format!("PDF task panicked: {e}"),
            })??;
            debug!("{}: extracted {} chars of text", upload.name, text.len());
            Ok(LoadedContent::Text(text))
        }
        DocumentKind::Image if opts.pdf_only => Err(DocumentError::Unsupported {
            mime: upload.mime.clone(),
        }),
        DocumentKind::Image => {
            let img = decode_image(&upload.bytes)?;
            debug!("{}: decoded {}x{} image", upload.name, img.width(), img.height());
            Ok(LoadedContent::Image(img))
        }
        DocumentKind::Text => String::from_utf8(upload.bytes.clone())
            .map(LoadedContent::Text)
            .map_err(|e| DocumentError::Extraction {
                detail: format!("text is not UTF-8: {e}"),
            }),
    }
}

/// Decode image bytes. No resizing or recompression.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, DocumentError> {
    image::load_from_memory(bytes).map_err(|e| DocumentError::Extraction {
        detail: format!("image decode failed: {e}"),
    })
}

/// Concatenate the text of every page, in page order.
fn extract_pdf_text(bytes: &[u8], password: Option<&str>) -> Result<String, DocumentError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| DocumentError::Extraction {
            detail: format!("cannot open PDF: {e:?}"),
        })?;

    let mut text = String::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let page_text = page.text().map_err(|e| DocumentError::Extraction {
            detail: format!("page {}: {e:?}", idx + 1),
        })?;
        text.push_str(&page_text.all());
    }

    if text.trim().is_empty() {
        warn!("PDF has no extractable text (scanned?)");
    }
    Ok(text)
}

/// Bind to `$PDFIUM_LIB_PATH` when set, otherwise to the system library.
fn bind_pdfium() -> Result<Pdfium, DocumentError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(p) if !p.is_empty() => {
            let path = PathBuf::from(&p);
            let lib = if path.is_dir() {
                PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(&path))
            } else {
                path
            };
            Pdfium::bind_to_library(&lib)
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| DocumentError::Extraction {
        detail: format!(
            "failed to bind pdfium: {e:?} (set {PDFIUM_LIB_PATH_ENV} to your libpdfium)"
        ),
    })?;

    Ok(Pdfium::new(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[tokio::test]
    async fn loads_text_upload() {
        let u = Upload::new("cv.txt", "text/plain", b"Go developer".to_vec());
        match load_document(&u, &LoadOptions::default()).await.unwrap() {
            LoadedContent::Text(t) => assert_eq!(t, "Go developer"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn decodes_png_upload() {
        let u = Upload::new("cv.png", "image/png", png_bytes());
        let content = load_document(&u, &LoadOptions::default()).await.unwrap();
        assert!(matches!(content, LoadedContent::Image(_)));
    }

    #[tokio::test]
    async fn pdf_only_rejects_images() {
        let u = Upload::new("cv.png", "image/png", png_bytes());
        let opts = LoadOptions {
            pdf_only: true,
            ..Default::default()
        };
        let err = load_document(&u, &opts).await.unwrap_err();
        assert_eq!(
            err,
            DocumentError::Unsupported {
                mime: "image/png".into()
            }
        );
    }

    #[tokio::test]
    async fn corrupt_image_is_extraction_failure() {
        let u = Upload::new("cv.jpg", "image/jpeg", b"\xFF\xD8\xFFnot really".to_vec());
        let err = load_document(&u, &LoadOptions::default()).await.unwrap_err();
        assert!(matches!(err, DocumentError::Extraction { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn unknown_mime_is_unsupported() {
        let u = Upload::new("cv.docx", "application/msword", vec![1, 2, 3]);
        let err = load_document(&u, &LoadOptions::default()).await.unwrap_err();
        assert!(matches!(err, DocumentError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn garbage_pdf_is_extraction_failure() {
        // Fails either at binding (no libpdfium) or at load; both are per-document.
        let u = Upload::new("cv.pdf", "application/pdf", b"not a pdf".to_vec());
        let err = load_document(&u, &LoadOptions::default()).await.unwrap_err();
        assert!(matches!(err, DocumentError::Extraction { .. }), "{err:?}");
    }
}
