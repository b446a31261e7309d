//! Terminal implementation of the picker collaborators.
//!
//! The "gallery" is the list of files given on the command line, the
//! "camera" copies a source file into the capture target, and the editor
//! reads actions from a script or from stdin.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use imagepicker_core::platform::{Camera, ContainerHost, EditorUi, Gallery, MediaIndex, Permissions};
use imagepicker_core::transform::CropRegion;
use imagepicker_core::{
    CallbackId, CallbackRegistry, CaptureOutcome, ContainerContext, EditAction, EditSession,
    GalleryItem, PreviewState,
};
use tracing::{info, warn};

use crate::commands::describe;

const HELP: &str =
    "actions: select N | caption TEXT | crop LEFT TOP WIDTH HEIGHT | undo | delete | send | back";

pub struct TerminalPlatform {
    context: ContainerContext,
    selection: Vec<PathBuf>,
    picks: AtomicUsize,
    camera_source: Option<PathBuf>,
    permission_granted: bool,
    interactive: bool,
    script: Mutex<VecDeque<EditAction>>,
}

impl TerminalPlatform {
    pub fn new(pictures_dir: PathBuf) -> Self {
        Self {
            context: ContainerContext {
                public_pictures_dir: pictures_dir.join("public"),
                pictures_dir,
            },
            selection: Vec::new(),
            picks: AtomicUsize::new(0),
            camera_source: None,
            permission_granted: true,
            interactive: false,
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_selection(mut self, files: Vec<PathBuf>) -> Self {
        self.selection = files;
        self
    }

    pub fn with_camera_source(mut self, source: PathBuf) -> Self {
        self.camera_source = Some(source);
        self
    }

    pub fn with_permission(mut self, granted: bool) -> Self {
        self.permission_granted = granted;
        self
    }

    /// Ask for editor actions on stdin once the script runs out.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_script(self, script: Option<&str>) -> Result<Self> {
        if let Some(script) = script {
            let actions = parse_script(script)?;
            *self.script.lock().unwrap_or_else(|e| e.into_inner()) = actions.into();
        }
        Ok(self)
    }

    fn next_scripted(&self) -> Option<EditAction> {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }
}

impl ContainerHost for TerminalPlatform {
    fn open_container(&self, id: CallbackId, registry: Arc<CallbackRegistry<ContainerContext>>) {
        registry.invoke(id, &self.context);
    }
}

impl Permissions for TerminalPlatform {
    fn has_camera_permission(&self) -> bool {
        self.permission_granted
    }

    async fn request_camera_permission(&self) -> bool {
        if self.interactive {
            let answer = read_line("Allow camera access? [y/N] ").await;
            return matches!(answer.as_deref().map(str::trim), Some("y" | "Y" | "yes"));
        }
        self.permission_granted
    }
}

impl Camera for TerminalPlatform {
    async fn capture(&self, target: &Path) -> CaptureOutcome {
        let Some(source) = &self.camera_source else {
            return CaptureOutcome::Failed("no camera source given".to_string());
        };
        match std::fs::copy(source, target) {
            Ok(_) => CaptureOutcome::Saved(target.to_path_buf()),
            Err(e) => CaptureOutcome::Failed(format!("{}: {e}", source.display())),
        }
    }
}

impl Gallery for TerminalPlatform {
    async fn pick(&self, allow_multiple: bool) -> Vec<GalleryItem> {
        let round = self.picks.fetch_add(1, Ordering::SeqCst);
        let files = if round == 0 {
            self.selection.clone()
        } else if self.interactive {
            let line = read_line("Pick again (paths separated by spaces, empty to cancel): ").await;
            line.unwrap_or_default()
                .split_whitespace()
                .map(PathBuf::from)
                .collect()
        } else {
            Vec::new()
        };

        let take = if allow_multiple { files.len() } else { files.len().min(1) };
        files
            .into_iter()
            .take(take)
            .map(|path| match path.canonicalize() {
                Ok(resolved) => GalleryItem::resolved(resolved),
                Err(_) => GalleryItem::unresolved(path.display().to_string()),
            })
            .collect()
    }
}

impl MediaIndex for TerminalPlatform {
    fn scan_file(&self, path: &Path, mime_type: &str) {
        info!(path = %path.display(), mime_type, "media index notified");
    }
}

impl EditorUi for TerminalPlatform {
    async fn next_action(&self, session: &EditSession) -> EditAction {
        if let Some(action) = self.next_scripted() {
            return action;
        }
        if !self.interactive {
            return EditAction::Send;
        }

        print_session(session);
        loop {
            let Some(line) = read_line("> ").await else {
                return EditAction::Back;
            };
            match parse_action(&line) {
                Ok(action) => return action,
                Err(e) => println!("{e}\n{HELP}"),
            }
        }
    }
}

fn print_session(session: &EditSession) {
    println!();
    for (index, image) in session.images().iter().enumerate() {
        let marker = if index == session.selected_index() { '*' } else { ' ' };
        let state = match image.state() {
            PreviewState::Pending => "loading".to_string(),
            PreviewState::Ready => match image.full_size() {
                Some(full) => format!("{}x{}", full.width, full.height),
                None => "ready".to_string(),
            },
            PreviewState::Failed(message) => format!("failed: {message}"),
        };
        let edited = if image.has_edit() { " (edited)" } else { "" };
        println!(
            "{marker} {index}: {}{edited} [{state}] {}",
            describe(image.file_path()),
            image.caption
        );
    }
    if session.params().allow_caption {
        println!("  caption hint: {}", session.params().caption_placeholder);
    }
    println!("{HELP}");
}

async fn read_line(prompt: &'static str) -> Option<String> {
    let read = tokio::task::spawn_blocking(move || {
        use std::io::Write;
        print!("{prompt}");
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|n| (n, line))
    })
    .await;

    match read {
        Ok(Ok((0, _))) => None,
        Ok(Ok((_, line))) => Some(line),
        Ok(Err(e)) => {
            warn!(error = %e, "failed to read stdin");
            None
        }
        Err(e) => {
            warn!(error = %e, "stdin reader did not complete");
            None
        }
    }
}

/// Parse `;`-separated editor actions.
pub fn parse_script(script: &str) -> Result<Vec<EditAction>> {
    script
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_action)
        .collect()
}

pub fn parse_action(line: &str) -> Result<EditAction> {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let action = match verb {
        "select" | "s" => {
            let index = rest
                .parse()
                .with_context(|| format!("Invalid image index '{rest}'"))?;
            EditAction::Select(index)
        }
        "caption" | "c" => EditAction::Caption(rest.to_string()),
        "crop" => {
            let values = rest
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .with_context(|| format!("Invalid crop '{rest}'"))?;
            let &[left, top, width, height] = values.as_slice() else {
                bail!("crop takes LEFT TOP WIDTH HEIGHT as fractions of the image");
            };
            EditAction::Crop(CropRegion::new(left, top, width, height))
        }
        "undo" | "u" => EditAction::Undo,
        "delete" | "d" => EditAction::Delete,
        "send" | "done" => EditAction::Send,
        "back" | "b" => EditAction::Back,
        other => bail!("Unknown action '{other}'"),
    };
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!(parse_action("select 2").unwrap(), EditAction::Select(2));
        assert_eq!(
            parse_action("caption  a day at the beach ").unwrap(),
            EditAction::Caption("a day at the beach".to_string())
        );
        assert_eq!(
            parse_action("crop 0 0.25 0.5 0.5").unwrap(),
            EditAction::Crop(CropRegion::new(0.0, 0.25, 0.5, 0.5))
        );
        assert_eq!(parse_action("undo").unwrap(), EditAction::Undo);
        assert_eq!(parse_action("d").unwrap(), EditAction::Delete);
        assert_eq!(parse_action("done").unwrap(), EditAction::Send);
        assert_eq!(parse_action("back").unwrap(), EditAction::Back);
    }

    #[test]
    fn test_parse_action_errors() {
        assert!(parse_action("select two").is_err());
        assert!(parse_action("crop 0 0 1").is_err());
        assert!(parse_action("rotate 90").is_err());
    }

    #[test]
    fn test_parse_script() {
        let actions = parse_script("caption hi; select 1 ;; send").unwrap();
        assert_eq!(
            actions,
            vec![
                EditAction::Caption("hi".to_string()),
                EditAction::Select(1),
                EditAction::Send,
            ]
        );
        assert!(parse_script("send; jump").is_err());
    }

    #[tokio::test]
    async fn test_gallery_marks_missing_files_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.jpg");
        std::fs::write(&present, b"x").unwrap();
        let missing = dir.path().join("missing.jpg");

        let platform = TerminalPlatform::new(dir.path().to_path_buf())
            .with_selection(vec![present.clone(), missing]);

        let items = platform.pick(true).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].path, Some(present.canonicalize().unwrap()));
        assert_eq!(items[1].path, None);

        // A relaunch without a terminal cancels
        assert!(platform.pick(true).await.is_empty());
    }

    #[tokio::test]
    async fn test_single_pick_keeps_first() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        std::fs::write(&a, b"x").unwrap();
        std::fs::write(&b, b"y").unwrap();

        let platform = TerminalPlatform::new(dir.path().to_path_buf()).with_selection(vec![a, b]);
        assert_eq!(platform.pick(false).await.len(), 1);
    }

    #[tokio::test]
    async fn test_camera_copies_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();
        let target = dir.path().join("IMG-1.JPEG");

        let platform = TerminalPlatform::new(dir.path().to_path_buf()).with_camera_source(source);
        assert_eq!(platform.capture(&target).await, CaptureOutcome::Saved(target.clone()));
        assert_eq!(std::fs::read(&target).unwrap(), b"jpeg bytes");

        let no_camera = TerminalPlatform::new(dir.path().to_path_buf());
        assert!(matches!(no_camera.capture(&target).await, CaptureOutcome::Failed(_)));
    }
}
