//! Sampled decoding with EXIF orientation correction.
//!
//! Decoding for display never needs more pixels than the target view can
//! show. The sampler probes the header for the native size, picks the
//! largest power-of-two reduction that keeps both axes at or above the
//! requested bounds, decodes, reduces, and finally rotates the raster
//! upright according to the EXIF orientation tag.

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageError, ImageReader};
use tracing::debug;

use super::{
    ClipRect, DecodeError, DecodedImage, ImageSource, Orientation, SampleOptions, SampleReport,
};

/// Compute the power-of-two sample size for a `width x height` source.
///
/// Starting at 1, the size doubles while both halved dimensions divided by
/// the current size still meet the request, so the reduced image is never
/// smaller than `req_width x req_height`. When the request already covers
/// the source the result is 1. Zero request bounds are treated as 1.
pub fn calculate_in_sample_size(width: u32, height: u32, req_width: u32, req_height: u32) -> u32 {
    let req_width = req_width.max(1);
    let req_height = req_height.max(1);
    let mut in_sample_size = 1u32;

    if height > req_height || width > req_width {
        let half_height = height / 2;
        let half_width = width / 2;

        while half_height / in_sample_size >= req_height && half_width / in_sample_size >= req_width
        {
            in_sample_size *= 2;
        }
    }

    in_sample_size
}

/// Read the native dimensions of the decode region without decoding pixels.
///
/// With a clip rectangle, the size of the clip (clamped to the image) is
/// returned instead of the full image size.
pub fn probe_dimensions(
    source: &ImageSource,
    clip: Option<ClipRect>,
) -> Result<(u32, u32), DecodeError> {
    let (width, height) = read_dimensions(source)?;
    let region = resolve_region(width, height, clip)?;
    Ok((region.width(), region.height()))
}

/// Decode `source` at the coarsest power-of-two resolution that still
/// covers `options`, with orientation correction applied.
pub fn decode_sampled(
    source: &ImageSource,
    clip: Option<ClipRect>,
    options: &SampleOptions,
) -> Result<DecodedImage, DecodeError> {
    decode_sampled_with_info(source, clip, options).map(|(image, _)| image)
}

/// Same as [`decode_sampled`], also reporting the decisions taken.
pub fn decode_sampled_with_info(
    source: &ImageSource,
    clip: Option<ClipRect>,
    options: &SampleOptions,
) -> Result<(DecodedImage, SampleReport), DecodeError> {
    if options.width == 0 || options.height == 0 {
        return Err(DecodeError::InvalidRequest {
            width: options.width,
            height: options.height,
        });
    }

    // Bounds-only probe
    let (full_width, full_height) = read_dimensions(source)?;
    if let Some(max_pixels) = options.max_pixels {
        if full_width as u64 * full_height as u64 > max_pixels {
            return Err(DecodeError::TooLarge {
                width: full_width,
                height: full_height,
                max_pixels,
            });
        }
    }
    let region = resolve_region(full_width, full_height, clip)?;

    let sample_size =
        calculate_in_sample_size(region.width(), region.height(), options.width, options.height);

    let mut img = decode_dynamic(source)?;
    if clip.is_some() {
        img = img.crop_imm(region.left, region.top, region.width(), region.height());
    }
    if sample_size > 1 {
        let target_width = (region.width() / sample_size).max(1);
        let target_height = (region.height() / sample_size).max(1);
        img = img.resize_exact(target_width, target_height, options.filter.to_image_filter());
    }

    let orientation = read_orientation(source);
    let decoded = DecodedImage::from_rgb_image(apply_orientation(img, orientation).into_rgb8());

    debug!(
        source = ?source,
        region_width = region.width(),
        region_height = region.height(),
        sample_size,
        rotation = orientation.rotation_degrees(),
        "sampled decode"
    );

    let report = SampleReport {
        source_width: region.width(),
        source_height: region.height(),
        sample_size,
        orientation,
    };
    Ok((decoded, report))
}

/// Decode the whole image at full resolution with orientation correction.
pub fn decode_oriented(source: &ImageSource) -> Result<DecodedImage, DecodeError> {
    let img = decode_dynamic(source)?;
    let orientation = read_orientation(source);
    Ok(DecodedImage::from_rgb_image(apply_orientation(img, orientation).into_rgb8()))
}

/// Read the EXIF orientation of `source`.
///
/// Returns `Orientation::Normal` if the source cannot be opened, carries no
/// EXIF data, or the tag cannot be read.
pub fn read_orientation(source: &ImageSource) -> Orientation {
    let mut reader = match source.open() {
        Ok(reader) => reader,
        Err(e) => {
            debug!(source = ?source, error = %e, "orientation lookup could not open source");
            return Orientation::Normal;
        }
    };

    match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Rotate clockwise for codes 6, 3 and 8; flips pass through untouched.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::Rotate270CW => img.rotate270(),
        Orientation::Normal
        | Orientation::FlipHorizontal
        | Orientation::FlipVertical
        | Orientation::Transpose
        | Orientation::Transverse => img,
    }
}

fn resolve_region(
    width: u32,
    height: u32,
    clip: Option<ClipRect>,
) -> Result<ClipRect, DecodeError> {
    match clip {
        None => Ok(ClipRect::new(0, 0, width, height)),
        Some(clip) => clip.clamp_to(width, height).ok_or(DecodeError::InvalidRequest {
            width: clip.width(),
            height: clip.height(),
        }),
    }
}

fn read_dimensions(source: &ImageSource) -> Result<(u32, u32), DecodeError> {
    let reader = ImageReader::new(source.open()?).with_guessed_format()?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }
    reader.into_dimensions().map_err(map_image_error)
}

fn decode_dynamic(source: &ImageSource) -> Result<DynamicImage, DecodeError> {
    let reader = ImageReader::new(source.open()?).with_guessed_format()?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }
    reader.decode().map_err(map_image_error)
}

fn map_image_error(err: ImageError) -> DecodeError {
    match err {
        ImageError::Unsupported(_) => DecodeError::InvalidFormat,
        ImageError::IoError(e) => DecodeError::Io(e.to_string()),
        other => DecodeError::CorruptedFile(other.to_string()),
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimensions_strategy() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=12_000, 1u32..=12_000)
    }

    fn request_strategy() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=4_000, 1u32..=4_000)
    }

    proptest! {
        /// Property: The sample size is always a power of two.
        #[test]
        fn prop_sample_size_is_power_of_two(
            (width, height) in dimensions_strategy(),
            (req_w, req_h) in request_strategy(),
        ) {
            let n = calculate_in_sample_size(width, height, req_w, req_h);
            prop_assert!(n.is_power_of_two(), "sample size {} is not a power of two", n);
        }

        /// Property: Sampling never drops below the request unless the
        /// source itself is smaller, in which case nothing is sampled.
        #[test]
        fn prop_sampled_dimensions_cover_request(
            (width, height) in dimensions_strategy(),
            (req_w, req_h) in request_strategy(),
        ) {
            let n = calculate_in_sample_size(width, height, req_w, req_h);
            if n > 1 {
                prop_assert!(width / n >= req_w, "width {}/{} < {}", width, n, req_w);
                prop_assert!(height / n >= req_h, "height {}/{} < {}", height, n, req_h);
            }
            if width <= req_w && height <= req_h {
                prop_assert_eq!(n, 1);
            }
        }

        /// Property: The chosen size is the coarsest that still qualifies.
        #[test]
        fn prop_sample_size_is_maximal(
            (width, height) in dimensions_strategy(),
            (req_w, req_h) in request_strategy(),
        ) {
            let n = calculate_in_sample_size(width, height, req_w, req_h);
            if width > req_w || height > req_h {
                let next = n * 2;
                prop_assert!(
                    (height / 2) / n < req_h || (width / 2) / n < req_w,
                    "doubling to {} would still satisfy the request", next
                );
            }
        }

        /// Property: Same input always produces the same sample size.
        #[test]
        fn prop_sample_size_deterministic(
            (width, height) in dimensions_strategy(),
            (req_w, req_h) in request_strategy(),
        ) {
            prop_assert_eq!(
                calculate_in_sample_size(width, height, req_w, req_h),
                calculate_in_sample_size(width, height, req_w, req_h)
            );
        }
    }
}
