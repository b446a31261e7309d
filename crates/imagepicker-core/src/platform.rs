//! Collaborators the host implements.
//!
//! The picker never touches a camera, a gallery or a screen itself. A host
//! implements these traits for its platform and hands the result to
//! [`ImagePicker`](crate::ImagePicker). Any type implementing all of them
//! is a [`Platform`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::decode::{decode_oriented, ImageSource};
use crate::encode::write_jpeg;
use crate::error::PickerError;
use crate::registry::{CallbackId, CallbackRegistry};
use crate::session::EditSession;
use crate::transform::{apply_crop, CropRegion};

/// What the host's UI container provides once it exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerContext {
    /// App-private pictures directory.
    pub pictures_dir: PathBuf,
    /// Shared gallery directory, used for public captures.
    pub public_pictures_dir: PathBuf,
}

/// Creates the UI container a flow runs in.
pub trait ContainerHost {
    /// Create the container and, once it exists, call
    /// `registry.invoke(id, &context)`.
    ///
    /// Cancelling `id` instead (or never invoking it) aborts the flow.
    fn open_container(&self, id: CallbackId, registry: Arc<CallbackRegistry<ContainerContext>>);
}

#[allow(async_fn_in_trait)]
pub trait Permissions {
    fn has_camera_permission(&self) -> bool;

    /// Ask the user; resolves to whether permission was granted.
    async fn request_camera_permission(&self) -> bool;
}

/// Result of one capture attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Saved(PathBuf),
    BackPressed,
    Failed(String),
}

#[allow(async_fn_in_trait)]
pub trait Camera {
    /// Capture a photo into `target`.
    async fn capture(&self, target: &Path) -> CaptureOutcome;
}

/// One entry returned by the gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryItem {
    /// Host identifier, for messages.
    pub uri: String,
    /// Local path, if the item could be resolved to one.
    pub path: Option<PathBuf>,
}

impl GalleryItem {
    pub fn resolved(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            uri: path.display().to_string(),
            path: Some(path),
        }
    }

    pub fn unresolved(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            path: None,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait Gallery {
    /// Let the user pick images. An empty list means the user backed out.
    async fn pick(&self, allow_multiple: bool) -> Vec<GalleryItem>;
}

pub trait MediaIndex {
    /// Announce a new file to the system media index.
    fn scan_file(&self, path: &Path, mime_type: &str);
}

/// A user action on the edit screen.
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    Select(usize),
    Caption(String),
    Crop(CropRegion),
    Undo,
    Delete,
    Send,
    Back,
}

#[allow(async_fn_in_trait)]
pub trait EditorUi {
    /// Show `session` and wait for the next user action.
    async fn next_action(&self, session: &EditSession) -> EditAction;
}

/// Everything a flow needs from the host.
pub trait Platform: ContainerHost + Permissions + Camera + Gallery + MediaIndex + EditorUi {}

impl<T> Platform for T where
    T: ContainerHost + Permissions + Camera + Gallery + MediaIndex + EditorUi
{
}

/// Produces a cropped copy of an image. Runs on the blocking pool.
pub trait Cropper: Send + Sync {
    fn crop(
        &self,
        source: &Path,
        region: &CropRegion,
        destination: &Path,
    ) -> Result<(), PickerError>;
}

/// Crops the upright image and writes it as JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegCropper {
    pub quality: u8,
}

impl Default for JpegCropper {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

impl Cropper for JpegCropper {
    fn crop(
        &self,
        source: &Path,
        region: &CropRegion,
        destination: &Path,
    ) -> Result<(), PickerError> {
        let image = decode_oriented(&ImageSource::from_path(source))?;
        let cropped = apply_crop(&image, region);
        write_jpeg(&cropped, self.quality, destination)?;
        Ok(())
    }
}
