//! Per-image state of an edit session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::decode::DecodedImage;

/// Progress of an image's preview decodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewState {
    #[default]
    Pending,
    Ready,
    /// The last decode failed; the message is for display only.
    Failed(String),
}

/// One image selected for the session.
///
/// Both raster caches are either empty or were decoded from the current
/// [`effective_location`](Self::effective_location).
#[derive(Debug, Clone)]
pub struct ImageProp {
    file_path: PathBuf,
    original: PathBuf,
    edited: Option<PathBuf>,
    full_size: Option<Arc<DecodedImage>>,
    thumbnail: Option<Arc<DecodedImage>>,
    pub caption: String,
    state: PreviewState,
}

impl ImageProp {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            file_path: path.clone(),
            original: path,
            edited: None,
            full_size: None,
            thumbnail: None,
            caption: String::new(),
            state: PreviewState::Pending,
        }
    }

    /// Stable key of this image within a session.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn original(&self) -> &Path {
        &self.original
    }

    pub fn edited(&self) -> Option<&Path> {
        self.edited.as_deref()
    }

    /// The edited location if present, else the original.
    pub fn effective_location(&self) -> &Path {
        self.edited.as_deref().unwrap_or(&self.original)
    }

    pub fn full_size(&self) -> Option<&Arc<DecodedImage>> {
        self.full_size.as_ref()
    }

    pub fn thumbnail(&self) -> Option<&Arc<DecodedImage>> {
        self.thumbnail.as_ref()
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn has_edit(&self) -> bool {
        self.edited.is_some()
    }

    /// Replace the edited location, deleting the previous temporary edit.
    pub fn set_edited(&mut self, path: PathBuf) {
        self.invalidate();
        if let Some(previous) = self.edited.replace(path) {
            if Some(&previous) != self.edited.as_ref() {
                remove_temp(&previous);
            }
        }
    }

    /// Drop the edit and fall back to the original. Returns whether an
    /// edit was present.
    pub fn clear_edit(&mut self) -> bool {
        match self.edited.take() {
            Some(previous) => {
                self.invalidate();
                remove_temp(&previous);
                true
            }
            None => false,
        }
    }

    /// Delete any temporary edit. Used when the image leaves the session.
    pub fn discard(&mut self) {
        self.clear_edit();
    }

    /// Store a full-size decode taken from `location`.
    ///
    /// Ignored if `location` is no longer effective. Returns whether the
    /// raster was stored.
    pub fn store_full_size(&mut self, location: &Path, image: Arc<DecodedImage>) -> bool {
        if !self.accepts(location) {
            return false;
        }
        self.full_size = Some(image);
        self.refresh_state();
        true
    }

    /// Store a thumbnail decode taken from `location`.
    pub fn store_thumbnail(&mut self, location: &Path, image: Arc<DecodedImage>) -> bool {
        if !self.accepts(location) {
            return false;
        }
        self.thumbnail = Some(image);
        self.refresh_state();
        true
    }

    /// Record a failed decode of `location`.
    pub fn mark_failed(&mut self, location: &Path, message: String) -> bool {
        if !self.accepts(location) {
            return false;
        }
        self.state = PreviewState::Failed(message);
        true
    }

    fn accepts(&self, location: &Path) -> bool {
        let current = self.effective_location() == location;
        if !current {
            warn!(
                image = %self.file_path.display(),
                stale = %location.display(),
                "discarding decode of a location that is no longer current"
            );
        }
        current
    }

    fn refresh_state(&mut self) {
        if matches!(self.state, PreviewState::Failed(_)) {
            return;
        }
        if self.full_size.is_some() && self.thumbnail.is_some() {
            self.state = PreviewState::Ready;
        }
    }

    fn invalidate(&mut self) {
        self.full_size = None;
        self.thumbnail = None;
        self.state = PreviewState::Pending;
    }
}

fn remove_temp(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed temporary edit"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove temporary edit"),
    }
}
