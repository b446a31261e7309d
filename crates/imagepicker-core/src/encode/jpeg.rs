//! JPEG encoding for compressed copies and crop output.

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use thiserror::Error;

use crate::decode::DecodedImage;

/// Errors that can occur during JPEG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// JPEG encoding failed
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),

    /// Writing the encoded bytes failed
    #[error("Failed to write JPEG: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode an RGB image to JPEG bytes.
///
/// `quality` is clamped to 1-100.
pub fn encode_jpeg(image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Cursor::new(Vec::new());
    write_jpeg_to(image, quality, &mut buffer)?;
    Ok(buffer.into_inner())
}

/// Encode an RGB image and write it to `path`, replacing any existing file.
pub fn write_jpeg(image: &DecodedImage, quality: u8, path: &Path) -> Result<(), EncodeError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_jpeg_to(image, quality, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn write_jpeg_to<W: Write>(
    image: &DecodedImage,
    quality: u8,
    writer: &mut W,
) -> Result<(), EncodeError> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 3;
    if image.pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: image.pixels.len(),
        });
    }

    let quality = quality.clamp(1, 100);
    JpegEncoder::new_with_quality(writer, quality)
        .write_image(&image.pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))
}


// ============================================================================
// Property-Based Tests
// ============================================================================
