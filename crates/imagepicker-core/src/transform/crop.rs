//! Image cropping with normalized coordinates.
//!
//! A crop region is expressed in the range 0.0 to 1.0 relative to the
//! image it is applied to, so a region chosen on a downsampled preview
//! applies unchanged to the full-resolution original.
//!
//! # Coordinate System
//!
//! - (0.0, 0.0) = top-left corner
//! - (1.0, 1.0) = bottom-right corner
//! - width/height are relative to the image dimensions

use serde::{Deserialize, Serialize};

use crate::decode::{ClipRect, DecodedImage};

/// Normalized crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for CropRegion {
    fn default() -> Self {
        Self::FULL
    }
}

impl CropRegion {
    /// The whole image.
    pub const FULL: CropRegion = CropRegion {
        left: 0.0,
        top: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Whether this region covers the whole image.
    pub fn is_full(&self) -> bool {
        self.left <= 0.0 && self.top <= 0.0 && self.width >= 1.0 && self.height >= 1.0
    }

    /// Resolve to pixels for an `image_width x image_height` image.
    ///
    /// Values outside 0.0..=1.0 are clamped, the region is clamped to the
    /// image bounds, and the result is at least 1x1.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> ClipRect {
        let src_w = image_width as f64;
        let src_h = image_height as f64;

        let px_left = (self.left.clamp(0.0, 1.0) * src_w).round() as u32;
        let px_top = (self.top.clamp(0.0, 1.0) * src_h).round() as u32;
        let px_width = (self.width.clamp(0.0, 1.0) * src_w).round() as u32;
        let px_height = (self.height.clamp(0.0, 1.0) * src_h).round() as u32;

        let left = px_left.min(image_width.saturating_sub(1));
        let top = px_top.min(image_height.saturating_sub(1));
        let right = (left + px_width).min(image_width).max(left + 1);
        let bottom = (top + px_height).min(image_height).max(top + 1);

        ClipRect::new(left, top, right, bottom)
    }
}

/// Apply a normalized crop to an image.
///
/// A full region returns a copy of the original.
pub fn apply_crop(image: &DecodedImage, region: &CropRegion) -> DecodedImage {
    if region.is_full() {
        return image.clone();
    }

    let rect = region.to_pixels(image.width, image.height);
    let out_width = rect.width();
    let out_height = rect.height();
    let row_bytes = (out_width * 3) as usize;

    let mut output = Vec::with_capacity(row_bytes * out_height as usize);
    for src_y in rect.top..rect.bottom {
        let start = ((src_y * image.width + rect.left) * 3) as usize;
        output.extend_from_slice(&image.pixels[start..start + row_bytes]);
    }

    DecodedImage {
        width: out_width,
        height: out_height,
        pixels: output,
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
