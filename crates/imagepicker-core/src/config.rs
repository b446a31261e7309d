//! Picker options and the aggregate TOML configuration.
//!
//! Every struct uses serde defaults, so a config file only needs to name
//! the values it changes:
//!
//! ```toml
//! cancellation = "reject"
//! scratch_dir = "/tmp/picker"
//!
//! [files]
//! directory_to_copy = "picked"
//! compression = 85
//!
//! [editor]
//! max_selection = 5
//! allow_caption = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::SampleOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which flow opened the editor. Decides what Back does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditFlow {
    /// Back discards the capture and returns to the camera.
    FromCamera = 1,
    /// Back relaunches the gallery.
    FromGallery = 2,
}

/// What a user cancellation (empty pick, back out of capture) reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationPolicy {
    /// Resolve with an empty list.
    #[default]
    ResolveEmpty,
    /// Reject with `Cancelled`.
    Reject,
}

/// What to do when a copy destination already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Reuse an identical file, otherwise pick a free `name-N.ext`.
    #[default]
    Rename,
    /// Keep whatever is already there and return its path.
    SkipExisting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    /// Announce the capture to the media index.
    pub save_to_gallery: bool,
    /// Write the capture to the public gallery directory.
    pub save_as_public: bool,
    /// Subdirectory of the pictures directory for captures.
    pub relative_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorParams {
    /// Set by the coordinator when it opens the editor.
    #[serde(skip)]
    pub editor_flow: Option<EditFlow>,
    pub allow_caption: bool,
    pub caption_placeholder: String,
    pub allow_addition: bool,
    pub allow_deletion: bool,
    /// Upper bound on images in one session; 0 means unlimited.
    pub max_selection: usize,
    pub nav_button_tint: Rgb,
    pub nav_bar_tint: Rgb,
    pub background_color: Rgb,
}

impl Default for EditorParams {
    fn default() -> Self {
        Self {
            editor_flow: None,
            allow_caption: true,
            caption_placeholder: "Enter a caption".to_string(),
            allow_addition: true,
            allow_deletion: true,
            max_selection: 10,
            nav_button_tint: Rgb(11, 110, 244),
            nav_bar_tint: Rgb::WHITE,
            background_color: Rgb::WHITE,
        }
    }
}

impl EditorParams {
    pub fn with_flow(mut self, flow: EditFlow) -> Self {
        self.editor_flow = Some(flow);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageFileParams {
    /// Where picked images are copied before resolving.
    pub directory_to_copy: PathBuf,
    pub file_name_prefix: String,
    /// Subdirectory used for camera captures.
    pub relative_directory: Option<PathBuf>,
    /// Re-encode copies as JPEG at this quality (1-100).
    pub compression: Option<u8>,
    pub collision: CollisionPolicy,
}

impl Default for ImageFileParams {
    fn default() -> Self {
        Self {
            directory_to_copy: PathBuf::from("picked"),
            file_name_prefix: "IMG".to_string(),
            relative_directory: None,
            compression: None,
            collision: CollisionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryParams {
    pub allow_multiple: bool,
}

/// Preview decode bounds for an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewBounds {
    pub full_width: u32,
    pub full_height: u32,
    pub thumbnail_size: u32,
    pub max_pixels: Option<u64>,
}

impl Default for PreviewBounds {
    fn default() -> Self {
        Self {
            full_width: 1080,
            full_height: 1920,
            thumbnail_size: 96,
            max_pixels: None,
        }
    }
}

impl PreviewBounds {
    pub fn full_size_options(&self) -> SampleOptions {
        self.with_limit(SampleOptions::new(self.full_width, self.full_height))
    }

    pub fn thumbnail_options(&self) -> SampleOptions {
        self.with_limit(SampleOptions::new(self.thumbnail_size, self.thumbnail_size))
    }

    fn with_limit(&self, options: SampleOptions) -> SampleOptions {
        match self.max_pixels {
            Some(max) => options.with_max_pixels(max),
            None => options,
        }
    }
}

/// Everything a host needs to construct an [`ImagePicker`](crate::ImagePicker).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub cancellation: CancellationPolicy,
    /// Where crop output is written; the system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
    pub camera: CameraParams,
    /// `None` skips the edit session entirely.
    pub editor: Option<EditorParams>,
    pub files: ImageFileParams,
    pub gallery: GalleryParams,
    pub preview: PreviewBounds,
}

impl PickerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_defaults() {
        let params = EditorParams::default();
        assert!(params.allow_caption);
        assert!(params.allow_deletion);
        assert_eq!(params.caption_placeholder, "Enter a caption");
        assert_eq!(params.max_selection, 10);
        assert_eq!(params.nav_button_tint, Rgb(11, 110, 244));
        assert_eq!(params.editor_flow, None);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = PickerConfig::from_toml_str("").unwrap();
        assert_eq!(config, PickerConfig::default());
        assert_eq!(config.cancellation, CancellationPolicy::ResolveEmpty);
        assert_eq!(config.files.file_name_prefix, "IMG");
        assert!(config.editor.is_none());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = PickerConfig::from_toml_str(
            r#"
            cancellation = "reject"

            [files]
            directory_to_copy = "out"
            compression = 70
            collision = "skip_existing"

            [editor]
            max_selection = 3
            allow_caption = false

            [gallery]
            allow_multiple = true
            "#,
        )
        .unwrap();

        assert_eq!(config.cancellation, CancellationPolicy::Reject);
        assert_eq!(config.files.directory_to_copy, PathBuf::from("out"));
        assert_eq!(config.files.compression, Some(70));
        assert_eq!(config.files.collision, CollisionPolicy::SkipExisting);
        assert_eq!(config.files.file_name_prefix, "IMG");
        let editor = config.editor.unwrap();
        assert_eq!(editor.max_selection, 3);
        assert!(!editor.allow_caption);
        assert!(editor.allow_deletion);
        assert!(config.gallery.allow_multiple);
    }

    #[test]
    fn test_written_defaults_load_back() {
        let config = PickerConfig {
            editor: Some(EditorParams::default()),
            ..PickerConfig::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("caption_placeholder = \"Enter a caption\""));
        assert_eq!(PickerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let result = PickerConfig::from_toml_str("cancellation = \"sometimes\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = PickerConfig::load(Path::new("/nonexistent/picker.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_preview_options_carry_limit() {
        let bounds = PreviewBounds {
            max_pixels: Some(1_000),
            ..PreviewBounds::default()
        };
        assert_eq!(bounds.thumbnail_options().width, 96);
        assert_eq!(bounds.full_size_options().max_pixels, Some(1_000));
    }
}
