use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;

/// Numeric failure codes reported to the host through `reject`.
///
/// Codes are unique across every failure domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    PermissionDenied = 101,
    Cancelled = 102,
    FileCreation = 103,
    UriCreation = 104,
    GalleryUri = 105,
    CaptureFailed = 106,
    DecodeFailed = 107,
    Io = 108,
    ContainerUnavailable = 109,
    EncodeFailed = 110,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

#[derive(Error, Debug)]
pub enum PickerError {
    #[error("Camera permission not granted")]
    PermissionDenied,

    #[error("Cancelled by user")]
    Cancelled,

    #[error("Error in creating image file: {0}")]
    FileCreation(String),

    #[error("Error getting URI for new image file: {0}")]
    UriCreation(String),

    #[error("{0}")]
    GalleryUri(String),

    #[error("Photo capture failed: {0}")]
    CaptureFailed(String),

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Picker container was closed before it became available")]
    ContainerUnavailable,

    #[error("Encode failed: {0}")]
    Encode(#[from] EncodeError),
}

impl PickerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PickerError::PermissionDenied => ErrorCode::PermissionDenied,
            PickerError::Cancelled => ErrorCode::Cancelled,
            PickerError::FileCreation(_) => ErrorCode::FileCreation,
            PickerError::UriCreation(_) => ErrorCode::UriCreation,
            PickerError::GalleryUri(_) => ErrorCode::GalleryUri,
            PickerError::CaptureFailed(_) => ErrorCode::CaptureFailed,
            PickerError::Decode(_) => ErrorCode::DecodeFailed,
            PickerError::Io(_) => ErrorCode::Io,
            PickerError::ContainerUnavailable => ErrorCode::ContainerUnavailable,
            PickerError::Encode(_) => ErrorCode::EncodeFailed,
        }
    }
}

pub type Result<T> = std::result::Result<T, PickerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let codes = [
            ErrorCode::PermissionDenied,
            ErrorCode::Cancelled,
            ErrorCode::FileCreation,
            ErrorCode::UriCreation,
            ErrorCode::GalleryUri,
            ErrorCode::CaptureFailed,
            ErrorCode::DecodeFailed,
            ErrorCode::Io,
            ErrorCode::ContainerUnavailable,
            ErrorCode::EncodeFailed,
        ];
        let mut values: Vec<u16> = codes.iter().map(|c| c.as_u16()).collect();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), codes.len());
    }

    #[test]
    fn test_error_maps_to_code() {
        assert_eq!(PickerError::PermissionDenied.code(), ErrorCode::PermissionDenied);
        assert_eq!(PickerError::Cancelled.code().as_u16(), 102);
        assert_eq!(
            PickerError::from(DecodeError::InvalidFormat).code(),
            ErrorCode::DecodeFailed
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(PickerError::from(io).code(), ErrorCode::Io);
    }

    #[test]
    fn test_error_messages() {
        let err = PickerError::CaptureFailed("lens covered".to_string());
        assert_eq!(err.to_string(), "Photo capture failed: lens covered");

        let err = PickerError::GalleryUri("Error in fetching URI of the file".to_string());
        assert_eq!(err.to_string(), "Error in fetching URI of the file");
        assert_eq!(ErrorCode::GalleryUri.to_string(), "105");
    }
}
