//! Headless edit session.
//!
//! Holds the images selected for editing, the current selection and every
//! edit made so far. A UI drives it through [`EditAction`]s; previews are
//! decoded in the background and land in the owning [`ImageProp`] only if
//! that image still points at the location they were decoded from.
//!
//! [`EditAction`]: crate::platform::EditAction

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::completion::Picked;
use crate::config::{EditorParams, PreviewBounds};
use crate::error::PickerError;
use crate::files::create_timestamped_file;
use crate::model::ImageProp;
use crate::platform::Cropper;
use crate::preview::{PreviewKind, PreviewLoader, PreviewResult};
use crate::transform::CropRegion;

/// Settings an edit session runs with.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub editor: EditorParams,
    pub preview: PreviewBounds,
    /// Where crop output is written.
    pub scratch_dir: PathBuf,
    pub file_name_prefix: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            editor: EditorParams::default(),
            preview: PreviewBounds::default(),
            scratch_dir: std::env::temp_dir(),
            file_name_prefix: "IMG".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Deletion is turned off for this session.
    NotAllowed,
    /// The image was removed; `selected` is the new selection.
    Removed { selected: usize },
    /// The last image was removed.
    Emptied,
}

/// A preview result that reached the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEvent {
    pub key: PathBuf,
    pub kind: PreviewKind,
    /// `false` if the result was stale and dropped.
    pub applied: bool,
}

#[derive(Debug)]
pub struct EditSession {
    images: Vec<ImageProp>,
    selected: usize,
    options: SessionOptions,
    previews: PreviewLoader,
}

impl EditSession {
    /// Start a session over `paths` and queue their preview decodes.
    ///
    /// Must be called within a Tokio runtime. Duplicate paths are dropped
    /// and the list is cut to `max_selection` when that is non-zero.
    pub fn new(paths: Vec<PathBuf>, options: SessionOptions) -> Self {
        let mut unique: Vec<PathBuf> = Vec::with_capacity(paths.len());
        for path in paths {
            if unique.contains(&path) {
                debug!(path = %path.display(), "dropping duplicate selection");
            } else {
                unique.push(path);
            }
        }

        let max = options.editor.max_selection;
        if max > 0 && unique.len() > max {
            warn!(
                discarded = unique.len() - max,
                max_selection = max,
                "more images than the editor accepts; extra images discarded"
            );
            unique.truncate(max);
        }

        let mut session = Self {
            images: unique.into_iter().map(ImageProp::new).collect(),
            selected: 0,
            options,
            previews: PreviewLoader::new(),
        };
        for index in 0..session.images.len() {
            session.schedule_previews(index);
        }
        info!(count = session.images.len(), "edit session started");
        session
    }

    pub fn images(&self) -> &[ImageProp] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn params(&self) -> &EditorParams {
        &self.options.editor
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&ImageProp> {
        self.images.get(self.selected)
    }

    /// Move the selection. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.images.len() {
            debug!(index, len = self.images.len(), "ignoring out-of-range selection");
            return false;
        }
        self.selected = index;
        true
    }

    pub fn set_caption(&mut self, text: impl Into<String>) -> bool {
        if !self.options.editor.allow_caption {
            warn!("captions are disabled for this session; ignoring caption");
            return false;
        }
        match self.images.get_mut(self.selected) {
            Some(image) => {
                image.caption = text.into();
                true
            }
            None => false,
        }
    }

    /// Make `path` the selected image's edited location.
    pub fn apply_edit(&mut self, path: PathBuf) -> bool {
        let index = self.selected;
        match self.images.get_mut(index) {
            Some(image) => {
                image.set_edited(path);
                self.schedule_previews(index);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.selected().is_some_and(ImageProp::has_edit)
    }

    /// Revert the selected image to its original.
    pub fn undo(&mut self) -> bool {
        let index = self.selected;
        let reverted = self.images.get_mut(index).is_some_and(ImageProp::clear_edit);
        if reverted {
            self.schedule_previews(index);
        }
        reverted
    }

    pub fn delete_selected(&mut self) -> DeleteOutcome {
        if !self.options.editor.allow_deletion {
            return DeleteOutcome::NotAllowed;
        }
        if self.selected >= self.images.len() {
            return DeleteOutcome::Emptied;
        }

        let mut removed = self.images.remove(self.selected);
        removed.discard();
        debug!(path = %removed.file_path().display(), "removed image from session");

        if self.images.is_empty() {
            return DeleteOutcome::Emptied;
        }
        self.selected = self.selected.min(self.images.len() - 1);
        DeleteOutcome::Removed {
            selected: self.selected,
        }
    }

    /// Crop the selected image's original into a new scratch file and make
    /// that the edited location.
    pub async fn crop_selected(
        &mut self,
        region: CropRegion,
        cropper: Arc<dyn Cropper>,
    ) -> Result<PathBuf, PickerError> {
        let source = self
            .selected()
            .map(|image| image.original().to_path_buf())
            .ok_or_else(|| {
                PickerError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no image selected",
                ))
            })?;
        let destination =
            create_timestamped_file(&self.options.scratch_dir, &self.options.file_name_prefix)
                .map_err(|e| PickerError::FileCreation(e.to_string()))?;

        let target = destination.clone();
        let result = tokio::task::spawn_blocking(move || cropper.crop(&source, &region, &target))
            .await
            .map_err(|e| PickerError::Io(std::io::Error::other(e)))
            .and_then(|r| r);

        match result {
            Ok(()) => {
                self.apply_edit(destination.clone());
                Ok(destination)
            }
            Err(e) => {
                let _ = std::fs::remove_file(&destination);
                Err(e)
            }
        }
    }

    /// Wait for the next preview decode and apply it.
    pub async fn next_preview(&mut self) -> Option<PreviewEvent> {
        let result = self.previews.next().await?;
        Some(self.apply_preview(result))
    }

    /// Apply every preview that has already finished. Returns how many
    /// results were taken.
    pub fn drain_previews(&mut self) -> usize {
        let mut taken = 0;
        while let Some(result) = self.previews.try_next() {
            self.apply_preview(result);
            taken += 1;
        }
        taken
    }

    pub fn pending_previews(&self) -> usize {
        self.previews.len()
    }

    /// Effective locations in order, with captions when they are enabled.
    pub fn finish(&self) -> Picked {
        let paths = self
            .images
            .iter()
            .map(|image| image.effective_location().to_path_buf())
            .collect();
        let captions = self
            .options
            .editor
            .allow_caption
            .then(|| self.images.iter().map(|image| image.caption.clone()).collect());
        Picked { paths, captions }
    }

    /// Delete every temporary edit and stop pending decodes.
    pub fn discard(mut self) {
        self.previews.abort_all();
        for image in &mut self.images {
            image.discard();
        }
    }

    fn schedule_previews(&mut self, index: usize) {
        let Some(image) = self.images.get(index) else {
            return;
        };
        let key = image.file_path().to_path_buf();
        let location = image.effective_location().to_path_buf();
        let bounds = self.options.preview;

        self.previews.spawn(
            key.clone(),
            location.clone(),
            PreviewKind::FullSize,
            bounds.full_size_options(),
        );
        self.previews
            .spawn(key, location, PreviewKind::Thumbnail, bounds.thumbnail_options());
    }

    fn apply_preview(&mut self, result: PreviewResult) -> PreviewEvent {
        let PreviewResult {
            key,
            location,
            kind,
            outcome,
        } = result;

        let applied = match self.images.iter_mut().find(|image| image.file_path() == key) {
            None => {
                debug!(key = %key.display(), "preview for an image no longer in the session");
                false
            }
            Some(image) => match outcome {
                Ok(raster) => match kind {
                    PreviewKind::FullSize => image.store_full_size(&location, raster),
                    PreviewKind::Thumbnail => image.store_thumbnail(&location, raster),
                },
                Err(e) => {
                    warn!(path = %location.display(), error = %e, "preview decode failed");
                    image.mark_failed(&location, e.to_string())
                }
            },
        };

        PreviewEvent { key, kind, applied }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PreviewState;
    use crate::platform::JpegCropper;
    use crate::testing::{split_image, write_file};
    use std::path::Path;

    struct Fixture {
        dir: tempfile::TempDir,
        paths: Vec<PathBuf>,
    }

    fn fixture(count: usize) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let paths = (0..count)
            .map(|i| write_file(dir.path(), &format!("img{i}.png"), &split_image(64, 32)))
            .collect();
        Fixture { dir, paths }
    }

    fn options(dir: &Path) -> SessionOptions {
        SessionOptions {
            scratch_dir: dir.to_path_buf(),
            preview: PreviewBounds {
                full_width: 32,
                full_height: 16,
                thumbnail_size: 8,
                max_pixels: None,
            },
            ..SessionOptions::default()
        }
    }

    async fn settle(session: &mut EditSession) {
        while session.next_preview().await.is_some() {}
    }

    #[tokio::test]
    async fn test_new_truncates_to_max_selection() {
        let fx = fixture(4);
        let mut opts = options(fx.dir.path());
        opts.editor.max_selection = 2;

        let session = EditSession::new(fx.paths.clone(), opts);
        assert_eq!(session.len(), 2);
        assert_eq!(session.images()[1].file_path(), fx.paths[1]);
    }

    #[tokio::test]
    async fn test_zero_max_selection_is_unlimited() {
        let fx = fixture(3);
        let mut opts = options(fx.dir.path());
        opts.editor.max_selection = 0;

        let session = EditSession::new(fx.paths.clone(), opts);
        assert_eq!(session.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicates_are_dropped() {
        let fx = fixture(1);
        let paths = vec![fx.paths[0].clone(), fx.paths[0].clone()];
        let session = EditSession::new(paths, options(fx.dir.path()));
        assert_eq!(session.len(), 1);
    }

    #[tokio::test]
    async fn test_previews_fill_both_caches() {
        let fx = fixture(2);
        let mut session = EditSession::new(fx.paths.clone(), options(fx.dir.path()));
        assert_eq!(session.pending_previews(), 4);

        settle(&mut session).await;

        for image in session.images() {
            assert_eq!(image.state(), &PreviewState::Ready);
            let full = image.full_size().unwrap();
            assert_eq!((full.width, full.height), (32, 16));
            let thumb = image.thumbnail().unwrap();
            assert_eq!((thumb.width, thumb.height), (16, 8));
        }
    }

    #[tokio::test]
    async fn test_decode_failure_marks_only_that_image() {
        let fx = fixture(2);
        let broken = write_file(fx.dir.path(), "broken.jpg", b"\xFF\xD8 not really");
        let paths = vec![fx.paths[0].clone(), broken, fx.paths[1].clone()];

        let mut session = EditSession::new(paths, options(fx.dir.path()));
        settle(&mut session).await;

        assert_eq!(session.images()[0].state(), &PreviewState::Ready);
        assert!(matches!(session.images()[1].state(), PreviewState::Failed(_)));
        assert_eq!(session.images()[2].state(), &PreviewState::Ready);
    }

    #[tokio::test]
    async fn test_stale_preview_is_discarded() {
        let fx = fixture(1);
        let mut session = EditSession::new(fx.paths.clone(), options(fx.dir.path()));

        // The decodes of the original are still queued when the edit lands
        let edit = write_file(fx.dir.path(), "edit.png", &split_image(16, 16));
        session.apply_edit(edit.clone());

        let mut events = Vec::new();
        while let Some(event) = session.next_preview().await {
            events.push(event);
        }

        assert_eq!(events.len(), 4);
        assert_eq!(events.iter().filter(|e| e.applied).count(), 2);
        let image = &session.images()[0];
        assert_eq!(image.effective_location(), edit);
        let full = image.full_size().unwrap();
        assert_eq!((full.width, full.height), (16, 16));
    }

    #[tokio::test]
    async fn test_caption_requires_allow_caption() {
        let fx = fixture(2);
        let mut session = EditSession::new(fx.paths.clone(), options(fx.dir.path()));
        assert!(session.select(1));
        assert!(session.set_caption("sunset"));
        assert_eq!(session.finish().captions, Some(vec![String::new(), "sunset".to_string()]));

        let mut opts = options(fx.dir.path());
        opts.editor.allow_caption = false;
        let mut session = EditSession::new(fx.paths.clone(), opts);
        assert!(!session.set_caption("ignored"));
        assert_eq!(session.finish().captions, None);
    }

    #[tokio::test]
    async fn test_select_out_of_range_is_ignored() {
        let fx = fixture(2);
        let mut session = EditSession::new(fx.paths.clone(), options(fx.dir.path()));
        assert!(!session.select(5));
        assert_eq!(session.selected_index(), 0);
    }

    #[tokio::test]
    async fn test_undo_reverts_and_deletes_edit() {
        let fx = fixture(1);
        let mut session = EditSession::new(fx.paths.clone(), options(fx.dir.path()));
        assert!(!session.can_undo());
        assert!(!session.undo());

        let edit = write_file(fx.dir.path(), "edit.png", &split_image(16, 16));
        session.apply_edit(edit.clone());
        assert!(session.can_undo());

        assert!(session.undo());
        assert!(!edit.exists());
        assert_eq!(session.finish().paths, fx.paths);
    }

    #[tokio::test]
    async fn test_delete_moves_selection() {
        let fx = fixture(3);
        let mut session = EditSession::new(fx.paths.clone(), options(fx.dir.path()));

        // Middle image: selection stays at the same index
        session.select(1);
        assert_eq!(session.delete_selected(), DeleteOutcome::Removed { selected: 1 });
        assert_eq!(session.selected().unwrap().file_path(), fx.paths[2]);

        // Last image: selection moves back
        assert_eq!(session.delete_selected(), DeleteOutcome::Removed { selected: 0 });
        assert_eq!(session.selected().unwrap().file_path(), fx.paths[0]);

        assert_eq!(session.delete_selected(), DeleteOutcome::Emptied);
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_delete_not_allowed() {
        let fx = fixture(2);
        let mut opts = options(fx.dir.path());
        opts.editor.allow_deletion = false;
        let mut session = EditSession::new(fx.paths.clone(), opts);

        assert_eq!(session.delete_selected(), DeleteOutcome::NotAllowed);
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_temporary_edit() {
        let fx = fixture(2);
        let mut session = EditSession::new(fx.paths.clone(), options(fx.dir.path()));
        let edit = write_file(fx.dir.path(), "edit.png", &split_image(16, 16));
        session.apply_edit(edit.clone());

        session.delete_selected();
        assert!(!edit.exists());
        assert!(fx.paths[0].exists());
    }

    #[tokio::test]
    async fn test_crop_replaces_effective_location() {
        let fx = fixture(1);
        let mut session = EditSession::new(fx.paths.clone(), options(fx.dir.path()));

        let cropped = session
            .crop_selected(CropRegion::new(0.0, 0.0, 0.5, 1.0), Arc::new(JpegCropper::default()))
            .await
            .unwrap();

        let name = cropped.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("IMG-") && name.ends_with(".JPEG"));
        assert_eq!(session.selected().unwrap().effective_location(), cropped);
        assert_eq!(image::open(&cropped).unwrap().width(), 32);

        // A second crop starts from the original again and replaces the first
        let second = session
            .crop_selected(CropRegion::new(0.5, 0.0, 0.5, 1.0), Arc::new(JpegCropper::default()))
            .await
            .unwrap();
        assert!(!cropped.exists());
        assert_eq!(session.selected().unwrap().effective_location(), second);
    }

    #[tokio::test]
    async fn test_crop_failure_leaves_session_unchanged() {
        let fx = fixture(1);
        let broken = write_file(fx.dir.path(), "broken.jpg", b"nope");
        let scratch = fx.dir.path().join("scratch");
        let mut opts = options(fx.dir.path());
        opts.scratch_dir = scratch.clone();
        let mut session = EditSession::new(vec![broken.clone()], opts);

        let result = session
            .crop_selected(CropRegion::FULL, Arc::new(JpegCropper::default()))
            .await;

        assert!(result.is_err());
        assert_eq!(session.selected().unwrap().effective_location(), broken);
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_discard_deletes_every_edit() {
        let fx = fixture(2);
        let mut session = EditSession::new(fx.paths.clone(), options(fx.dir.path()));
        let first = write_file(fx.dir.path(), "e0.png", &split_image(8, 8));
        let second = write_file(fx.dir.path(), "e1.png", &split_image(8, 8));
        session.apply_edit(first.clone());
        session.select(1);
        session.apply_edit(second.clone());

        assert_eq!(session.finish().paths, vec![first.clone(), second.clone()]);
        session.discard();
        assert!(!first.exists() && !second.exists());
        assert!(fx.paths.iter().all(|p| p.exists()));
    }
}
