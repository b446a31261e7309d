//! Image Picker Core - capture, selection and preview decoding
//!
//! This crate provides the platform-independent part of the image picker:
//! sampled decoding with EXIF orientation correction, the callback registry
//! that bridges host UI lifecycles, the headless edit session and the
//! camera and gallery flows that tie them together.
//!
//! Hosts implement the collaborator traits in [`platform`] and drive an
//! [`ImagePicker`]; results come back through a [`Completion`].

pub mod completion;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod files;
pub mod model;
pub mod platform;
pub mod preview;
pub mod registry;
pub mod session;
pub mod transform;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use completion::{completion_channel, Completion, Picked, Rejection};
pub use config::{
    CameraParams, CancellationPolicy, CollisionPolicy, EditFlow, EditorParams, GalleryParams,
    ImageFileParams, PickerConfig,
};
pub use decode::{decode_sampled, DecodeError, DecodedImage, ImageSource, SampleOptions};
pub use error::{ErrorCode, PickerError};
pub use model::{ImageProp, PreviewState};
pub use platform::{CaptureOutcome, ContainerContext, EditAction, GalleryItem, Platform};
pub use registry::{CallbackId, CallbackRegistry};
pub use session::{DeleteOutcome, EditSession};
pub use workflow::ImagePicker;
