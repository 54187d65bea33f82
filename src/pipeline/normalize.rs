//! Image normalisation: sniff the format and flatten RGBA images to JPEG.
//!
//! OCR back-ends commonly reject or mis-handle images with an alpha channel,
//! and JPEG cannot carry one at all. RGBA images therefore have their alpha
//! channel dropped (not blended onto a background) and are re-encoded as
//! JPEG; every other payload is forwarded untouched so the service sees
//! exactly the bytes the user uploaded.
//!
//! The colour type is read from the image header, so only RGBA images are
//! fully decoded.
//!
//! ## Why spawn_blocking?
//!
//! Decoding and JPEG encoding are CPU-bound and can take hundreds of
//! milliseconds on a large scan. Running them on the blocking pool keeps the
//! Tokio worker threads free for the surrounding network I/O.

use crate::config::ImagePolicy;
use crate::error::OcrToolError;
use crate::pipeline::input::FileContent;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// Normalise the downloaded file according to `policy`.
///
/// Runs inside `spawn_blocking`.
pub async fn normalize(
    content: FileContent,
    policy: ImagePolicy,
    jpeg_quality: u8,
) -> Result<FileContent, OcrToolError> {
    tokio::task::spawn_blocking(move || normalize_blocking(content, policy, jpeg_quality))
        .await
        .map_err(|e| OcrToolError::Internal(format!("Normalise task panicked: {}", e)))?
}

/// Blocking implementation of [`normalize`].
pub fn normalize_blocking(
    content: FileContent,
    policy: ImagePolicy,
    jpeg_quality: u8,
) -> Result<FileContent, OcrToolError> {
    let format = match policy {
        ImagePolicy::Strict => image::guess_format(&content.bytes)
            .map_err(|e| OcrToolError::InvalidImage(e.to_string()))?,
        ImagePolicy::Sniff => match sniff_format(&content.bytes) {
            Some(format) => format,
            None => {
                info!(
                    "{} has no recognised image signature, forwarding unchanged",
                    content.filename
                );
                return Ok(content);
            }
        },
    };
    debug!("Detected {:?} signature in {}", format, content.filename);

    let header_err = |e: ImageError| match policy {
        ImagePolicy::Strict => OcrToolError::InvalidImage(e.to_string()),
        ImagePolicy::Sniff => OcrToolError::ConversionFailed(e.to_string()),
    };
    let decoder = ImageReader::with_format(Cursor::new(content.bytes.as_slice()), format)
        .into_decoder()
        .map_err(header_err)?;

    let color = decoder.color_type();
    if !is_rgba(color) {
        debug!("{} is {:?}, forwarding unchanged", content.filename, color);
        drop(decoder);
        return Ok(content);
    }

    let img = DynamicImage::from_decoder(decoder)
        .map_err(|e| OcrToolError::ConversionFailed(e.to_string()))?;
    flatten_to_jpeg(&img, &content.filename, jpeg_quality)
}

/// Detect a decodable image format from the file signature.
///
/// Returns `None` for non-images and for image formats this build cannot
/// decode; both are forwarded as-is under [`ImagePolicy::Sniff`].
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    match image::guess_format(bytes) {
        Ok(format) if format.reading_enabled() => Some(format),
        Ok(format) => {
            warn!("{:?} images are not decodable in this build, forwarding unchanged", format);
            None
        }
        Err(_) => None,
    }
}

/// RGB with an alpha channel, at any bit depth. Grey+alpha is left alone.
fn is_rgba(color: ColorType) -> bool {
    matches!(
        color,
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F
    )
}

/// Drop the alpha channel and re-encode as JPEG, renaming to `.jpg`.
fn flatten_to_jpeg(
    img: &DynamicImage,
    filename: &str,
    quality: u8,
) -> Result<FileContent, OcrToolError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| OcrToolError::ConversionFailed(e.to_string()))?;

    let renamed = replace_extension(filename, "jpg");
    info!(
        "Converted RGBA image {} → {} ({} bytes)",
        filename,
        renamed,
        buf.len()
    );
    Ok(FileContent::new(buf, renamed))
}

/// Swap the extension of `filename` for `ext`, appending one if absent.
pub fn replace_extension(filename: &str, ext: &str) -> String {
    if filename.is_empty() {
        return format!("file.{}", ext);
    }
    Path::new(filename)
        .with_extension(ext)
        .to_string_lossy()
        .into_owned()
}
