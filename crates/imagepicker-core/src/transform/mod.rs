//! Normalized cropping for the edit session's crop step.
//!
//! # Coordinate System
//!
//! - Crop coordinates are normalized (0.0 to 1.0) relative to image dimensions
//! - Origin is top-left corner

mod crop;

pub use crop::{apply_crop, CropRegion};
