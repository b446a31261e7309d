//! Image encoding.
//!
//! JPEG is the only output format: compressed copies handed back to the
//! host and crop results written to scratch files are both JPEG.

mod jpeg;

pub use jpeg::{encode_jpeg, write_jpeg, EncodeError};
