//! Image decoding for previews and thumbnails.
//!
//! This module provides functionality for:
//! - Opening images through re-openable [`ImageSource`] handles
//! - Probing native dimensions without decoding pixels
//! - Sampled decoding at the coarsest power-of-two resolution that still
//!   covers the requested bounds
//! - EXIF orientation lookup and correction
//!
//! # Architecture
//!
//! Every function here is synchronous and blocking. Callers that must not
//! block (the edit session, the workflow coordinator) run decodes on the
//! blocking pool, one task per image.
//!
//! # Examples
//!
//! ```ignore
//! use imagepicker_core::decode::{decode_sampled, ImageSource, SampleOptions};
//!
//! let source = ImageSource::from_path("photo.jpg");
//! let preview = decode_sampled(&source, None, &SampleOptions::new(800, 600)).unwrap();
//! println!("Decoded {}x{} preview", preview.width, preview.height);
//! ```

mod sampler;
mod source;
mod types;

pub use sampler::{
    calculate_in_sample_size, decode_oriented, decode_sampled, decode_sampled_with_info,
    probe_dimensions, read_orientation,
};
pub use source::{ImageReadSeek, ImageSource};
pub use types::{
    ClipRect, DecodeError, DecodedImage, FilterType, Orientation, SampleOptions, SampleReport,
};
