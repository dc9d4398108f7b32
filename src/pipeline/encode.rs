//! Image encoding: decoded resume image → base64 PNG `ImageData`.
//!
//! Multimodal APIs take images as base64 embedded in the JSON body. PNG is
//! lossless, so re-encoding a decoded JPEG scan adds no further artefacts.
//! Dimensions are left untouched.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a resume image as a base64 PNG ready for the model.
pub fn encode_image(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} resume image → {} bytes base64",
        img.width(),
        img.height(),
        b64.len()
    );

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
