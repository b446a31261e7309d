//! Core types for image decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The source could not be opened or read.
    #[error("I/O error: {0}")]
    Io(String),

    /// Requested bounds must be non-zero.
    #[error("Invalid decode request: {width}x{height}")]
    InvalidRequest { width: u32, height: u32 },

    /// The source exceeds the configured pixel budget.
    #[error("Image too large: {width}x{height} exceeds {max_pixels} pixels")]
    TooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::Io(err.to_string())
    }
}

/// Filter type for image resizing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl Orientation {
    /// Clockwise rotation the sampler applies for this orientation.
    ///
    /// Only the pure rotations (codes 6, 3 and 8) rotate the raster; flips
    /// and the default code leave it untouched.
    pub fn rotation_degrees(self) -> u32 {
        match self {
            Orientation::Rotate90CW => 90,
            Orientation::Rotate180 => 180,
            Orientation::Rotate270CW => 270,
            _ => 0,
        }
    }

    /// Returns true if the sampler's rotation swaps width and height.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Orientation::Rotate90CW | Orientation::Rotate270CW)
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// Requested decode bounds, usually the measured size of the target view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleOptions {
    /// Requested minimum width in pixels.
    pub width: u32,
    /// Requested minimum height in pixels.
    pub height: u32,
    /// Upper bound on source pixels; `None` means unlimited.
    #[serde(default)]
    pub max_pixels: Option<u64>,
    /// Filter used when reducing by the sample size.
    #[serde(default)]
    pub filter: FilterType,
}

impl SampleOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            max_pixels: None,
            filter: FilterType::default(),
        }
    }

    /// Bounds for a view measured in density-independent units.
    pub fn from_view(width_dp: u32, height_dp: u32, density: f32) -> Self {
        Self::new(dp_to_pixels(width_dp, density), dp_to_pixels(height_dp, density))
    }

    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = Some(max_pixels);
        self
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }
}

fn dp_to_pixels(distance: u32, density: f32) -> u32 {
    (distance as f32 * density).round().max(0.0) as u32
}

/// Pixel rectangle in source coordinates (before orientation correction).
///
/// Edges follow the usual half-open convention: `right` and `bottom` are
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl ClipRect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Intersect with a `width x height` image. Returns `None` when nothing
    /// of the rectangle lies inside the image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<ClipRect> {
        let clamped = ClipRect {
            left: self.left.min(width),
            top: self.top.min(height),
            right: self.right.min(width),
            bottom: self.bottom.min(height),
        };
        if clamped.width() == 0 || clamped.height() == 0 {
            None
        } else {
            Some(clamped)
        }
    }
}

/// Diagnostic summary of one sampled decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleReport {
    /// Width of the decoded region before sampling.
    pub source_width: u32,
    /// Height of the decoded region before sampling.
    pub source_height: u32,
    /// Power-of-two reduction applied to both axes.
    pub sample_size: u32,
    /// Orientation read from the source.
    pub orientation: Orientation,
}

/// A decoded image with RGB pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    /// Length should be width * height * 3.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Create a new DecodedImage with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width * height * 3) as usize,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a DecodedImage from an image::RgbImage.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.into_raw();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// RGB value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        Some([self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]])
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(Orientation::from(1), Orientation::Normal);
        assert_eq!(Orientation::from(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from(99), Orientation::Normal);
        assert_eq!(Orientation::from(0), Orientation::Normal);
    }

    #[test]
    fn test_rotation_degrees() {
        assert_eq!(Orientation::from(6).rotation_degrees(), 90);
        assert_eq!(Orientation::from(3).rotation_degrees(), 180);
        assert_eq!(Orientation::from(8).rotation_degrees(), 270);

        // Flips and unknown codes are left alone
        for code in [0, 1, 2, 4, 5, 7, 42] {
            assert_eq!(Orientation::from(code).rotation_degrees(), 0, "code {}", code);
        }
    }

    #[test]
    fn test_orientation_swaps_dimensions() {
        assert!(Orientation::Rotate90CW.swaps_dimensions());
        assert!(Orientation::Rotate270CW.swaps_dimensions());
        assert!(!Orientation::Rotate180.swaps_dimensions());
        assert!(!Orientation::Normal.swaps_dimensions());
        assert!(!Orientation::Transpose.swaps_dimensions());
    }

    #[test]
    fn test_sample_options_from_view() {
        let opts = SampleOptions::from_view(300, 200, 2.75);
        assert_eq!(opts.width, 825);
        assert_eq!(opts.height, 550);
        assert_eq!(opts.max_pixels, None);
    }

    #[test]
    fn test_clip_rect_clamp() {
        let clip = ClipRect::new(10, 10, 500, 500);
        let clamped = clip.clamp_to(100, 50).unwrap();
        assert_eq!(clamped, ClipRect::new(10, 10, 100, 50));
        assert_eq!(clamped.width(), 90);
        assert_eq!(clamped.height(), 40);

        // Entirely outside
        assert!(ClipRect::new(200, 0, 300, 10).clamp_to(100, 50).is_none());
        // Degenerate
        assert!(ClipRect::new(5, 5, 5, 9).clamp_to(100, 50).is_none());
    }

    #[test]
    fn test_decoded_image_creation() {
        let pixels = vec![0u8; 100 * 50 * 3];
        let img = DecodedImage::new(100, 50, pixels);

        assert_eq!(img.width, 100);
        assert_eq!(img.height, 50);
        assert_eq!(img.pixel_count(), 5000);
        assert_eq!(img.byte_size(), 15000);
        assert!(!img.is_empty());
        assert_eq!(img.pixel(99, 49), Some([0, 0, 0]));
        assert_eq!(img.pixel(100, 0), None);
    }

    #[test]
    fn test_decoded_image_empty() {
        let img = DecodedImage::new(0, 0, vec![]);
        assert!(img.is_empty());
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::CorruptedFile("truncated".to_string());
        assert_eq!(err.to_string(), "Corrupted or incomplete image file: truncated");

        let err = DecodeError::InvalidFormat;
        assert_eq!(err.to_string(), "Invalid or unsupported image format");

        let err = DecodeError::TooLarge {
            width: 10,
            height: 10,
            max_pixels: 50,
        };
        assert_eq!(err.to_string(), "Image too large: 10x10 exceeds 50 pixels");
    }
}
