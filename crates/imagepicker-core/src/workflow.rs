//! Camera and gallery flows.
//!
//! [`ImagePicker`] strings the collaborators together: it waits for the
//! host's container, acquires images from the camera or the gallery, runs
//! the optional edit session, copies the results out and reports exactly
//! one outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::completion::{complete, Completion, Picked};
use crate::config::{
    CameraParams, CancellationPolicy, EditFlow, EditorParams, GalleryParams, ImageFileParams,
    PickerConfig, PreviewBounds,
};
use crate::error::PickerError;
use crate::files::{copy_image_files, create_capture_target};
use crate::platform::{
    CaptureOutcome, ContainerContext, Cropper, EditAction, GalleryItem, JpegCropper, Platform,
};
use crate::registry::{CallbackId, CallbackRegistry};
use crate::session::{DeleteOutcome, EditSession, SessionOptions};

const JPEG_MIME: &str = "image/jpeg";

enum EditorExit {
    Sent(Picked),
    Back,
}

pub struct ImagePicker<P> {
    platform: P,
    registry: Arc<CallbackRegistry<ContainerContext>>,
    files: ImageFileParams,
    editor: Option<EditorParams>,
    cancellation: CancellationPolicy,
    cropper: Arc<dyn Cropper>,
    scratch_dir: PathBuf,
    preview: PreviewBounds,
}

impl<P: Platform> ImagePicker<P> {
    /// `editor_params` of `None` skips the edit session.
    pub fn new(
        platform: P,
        file_params: ImageFileParams,
        editor_params: Option<EditorParams>,
        cancellation: CancellationPolicy,
    ) -> Self {
        Self {
            platform,
            registry: Arc::new(CallbackRegistry::new()),
            files: file_params,
            editor: editor_params,
            cancellation,
            cropper: Arc::new(JpegCropper::default()),
            scratch_dir: std::env::temp_dir(),
            preview: PreviewBounds::default(),
        }
    }

    pub fn from_config(platform: P, config: &PickerConfig) -> Self {
        Self::new(
            platform,
            config.files.clone(),
            config.editor.clone(),
            config.cancellation,
        )
        .with_scratch_dir(config.scratch_dir())
        .with_preview_bounds(config.preview)
    }

    pub fn with_cropper(mut self, cropper: Arc<dyn Cropper>) -> Self {
        self.cropper = cropper;
        self
    }

    pub fn with_scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_dir = dir;
        self
    }

    pub fn with_preview_bounds(mut self, bounds: PreviewBounds) -> Self {
        self.preview = bounds;
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Continuations waiting for a container.
    pub fn registry(&self) -> &Arc<CallbackRegistry<ContainerContext>> {
        &self.registry
    }

    /// Run the camera flow and report through `completion`.
    pub async fn run_camera_workflow<C: Completion + ?Sized>(
        &self,
        params: &CameraParams,
        completion: &C,
    ) {
        let result = self.start_camera_flow(params).await;
        log_outcome("camera", &result);
        complete(completion, result);
    }

    /// Run the gallery flow and report through `completion`.
    pub async fn run_gallery_workflow<C: Completion + ?Sized>(
        &self,
        params: &GalleryParams,
        completion: &C,
    ) {
        let result = self.start_gallery_flow(params).await;
        log_outcome("gallery", &result);
        complete(completion, result);
    }

    pub async fn start_camera_flow(&self, params: &CameraParams) -> Result<Picked, PickerError> {
        let container = self.open_container().await?;
        let mut permission_checked = false;

        loop {
            let target = self.capture_target(&container, params)?;
            if params.save_to_gallery && !params.save_as_public {
                self.platform.scan_file(&target, JPEG_MIME);
            }

            if !permission_checked {
                if let Err(e) = self.ensure_camera_permission().await {
                    remove_file(&target);
                    return Err(e);
                }
                permission_checked = true;
            }

            match self.platform.capture(&target).await {
                CaptureOutcome::Saved(path) => {
                    if path != target {
                        remove_file(&target);
                    }
                    info!(path = %path.display(), "photo captured");
                    let Some(editor) = &self.editor else {
                        return self.copy_out(vec![path], None).await;
                    };
                    match self.run_editor(vec![path.clone()], EditFlow::FromCamera, editor).await? {
                        EditorExit::Sent(picked) => return Ok(picked),
                        EditorExit::Back => {
                            remove_file(&path);
                            info!("editor closed, returning to camera");
                        }
                    }
                }
                CaptureOutcome::BackPressed => {
                    remove_file(&target);
                    return self.cancelled();
                }
                CaptureOutcome::Failed(message) => {
                    remove_file(&target);
                    return Err(PickerError::CaptureFailed(message));
                }
            }
        }
    }

    pub async fn start_gallery_flow(&self, params: &GalleryParams) -> Result<Picked, PickerError> {
        let _container = self.open_container().await?;

        loop {
            let items = self.platform.pick(params.allow_multiple).await;
            if items.is_empty() {
                return self.cancelled();
            }
            let paths = resolve_items(items, params.allow_multiple)?;
            info!(count = paths.len(), "images picked from gallery");

            let Some(editor) = &self.editor else {
                return self.copy_out(paths, None).await;
            };
            match self.run_editor(paths, EditFlow::FromGallery, editor).await? {
                EditorExit::Sent(picked) => return Ok(picked),
                EditorExit::Back => info!("editor closed, relaunching gallery"),
            }
        }
    }

    async fn open_container(&self) -> Result<ContainerContext, PickerError> {
        let (tx, rx) = oneshot::channel();
        let id = self.registry.register(move |context: &ContainerContext| {
            let _ = tx.send(context.clone());
        });
        let _pending = PendingContainer {
            registry: &self.registry,
            id,
        };
        self.platform.open_container(id, Arc::clone(&self.registry));
        rx.await.map_err(|_| PickerError::ContainerUnavailable)
    }

    fn capture_target(
        &self,
        container: &ContainerContext,
        params: &CameraParams,
    ) -> Result<PathBuf, PickerError> {
        let dir = if params.save_as_public {
            &container.public_pictures_dir
        } else {
            &container.pictures_dir
        };
        let relative = params
            .relative_directory
            .as_deref()
            .or(self.files.relative_directory.as_deref());
        create_capture_target(dir, relative, &self.files.file_name_prefix)
    }

    async fn ensure_camera_permission(&self) -> Result<(), PickerError> {
        if self.platform.has_camera_permission() {
            return Ok(());
        }
        info!("requesting camera permission");
        if self.platform.request_camera_permission().await {
            Ok(())
        } else {
            Err(PickerError::PermissionDenied)
        }
    }

    async fn run_editor(
        &self,
        paths: Vec<PathBuf>,
        flow: EditFlow,
        editor: &EditorParams,
    ) -> Result<EditorExit, PickerError> {
        let options = SessionOptions {
            editor: editor.clone().with_flow(flow),
            preview: self.preview,
            scratch_dir: self.scratch_dir.clone(),
            file_name_prefix: self.files.file_name_prefix.clone(),
        };
        let mut session = EditSession::new(paths, options);

        loop {
            session.drain_previews();
            let action = self.platform.next_action(&session).await;
            debug!(?action, selected = session.selected_index(), "editor action");

            match action {
                EditAction::Select(index) => {
                    session.select(index);
                }
                EditAction::Caption(text) => {
                    session.set_caption(text);
                }
                EditAction::Crop(region) => {
                    if let Err(e) = session.crop_selected(region, Arc::clone(&self.cropper)).await {
                        warn!(error = %e, "crop failed");
                    }
                }
                EditAction::Undo => {
                    session.undo();
                }
                EditAction::Delete => match session.delete_selected() {
                    DeleteOutcome::Emptied => {
                        session.discard();
                        return Ok(EditorExit::Back);
                    }
                    DeleteOutcome::NotAllowed => debug!("deletion is disabled"),
                    DeleteOutcome::Removed { .. } => {}
                },
                EditAction::Send => {
                    let picked = session.finish();
                    let copied = self.copy_out(picked.paths, picked.captions).await;
                    session.discard();
                    return copied.map(EditorExit::Sent);
                }
                EditAction::Back => {
                    session.discard();
                    return Ok(EditorExit::Back);
                }
            }
        }
    }

    /// Copy on the blocking pool; compression decodes and re-encodes.
    async fn copy_out(
        &self,
        paths: Vec<PathBuf>,
        captions: Option<Vec<String>>,
    ) -> Result<Picked, PickerError> {
        let params = self.files.clone();
        let paths = tokio::task::spawn_blocking(move || {
            copy_image_files(&params.directory_to_copy, &paths, &params)
        })
        .await
        .map_err(|e| PickerError::Io(std::io::Error::other(e)))??;
        Ok(Picked { paths, captions })
    }

    fn cancelled(&self) -> Result<Picked, PickerError> {
        match self.cancellation {
            CancellationPolicy::ResolveEmpty => Ok(Picked::empty()),
            CancellationPolicy::Reject => Err(PickerError::Cancelled),
        }
    }
}

/// Drops the container continuation if the flow goes away before the
/// host answers.
struct PendingContainer<'a> {
    registry: &'a CallbackRegistry<ContainerContext>,
    id: CallbackId,
}

impl Drop for PendingContainer<'_> {
    fn drop(&mut self) {
        if self.registry.cancel(self.id) {
            debug!(id = %self.id, "container continuation dropped");
        }
    }
}

fn resolve_items(
    mut items: Vec<GalleryItem>,
    allow_multiple: bool,
) -> Result<Vec<PathBuf>, PickerError> {
    if !allow_multiple && items.len() > 1 {
        warn!(count = items.len(), "single selection returned several items; keeping the first");
        items.truncate(1);
    }

    items
        .into_iter()
        .map(|item| {
            item.path.ok_or_else(|| {
                warn!(uri = %item.uri, "gallery item has no local path");
                let message = if allow_multiple {
                    "Error in fetching URIs of some files"
                } else {
                    "Error in fetching URI of the file"
                };
                PickerError::GalleryUri(message.to_string())
            })
        })
        .collect()
}

fn remove_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove file");
        }
    }
}

fn log_outcome(flow: &str, result: &Result<Picked, PickerError>) {
    match result {
        Ok(picked) => info!(flow, count = picked.paths.len(), "flow resolved"),
        Err(e) => warn!(flow, code = %e.code(), error = %e, "flow rejected"),
    }
}
