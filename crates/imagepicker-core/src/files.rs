//! Copying picked images out and creating capture targets.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::config::{CollisionPolicy, ImageFileParams};
use crate::decode::{decode_oriented, ImageSource};
use crate::encode::encode_jpeg;
use crate::error::PickerError;

/// Copy each of `sources` into `dir` and return the destination paths in
/// the same order.
///
/// `dir` is created if missing. With `params.compression` set, each image
/// is decoded upright and re-encoded as JPEG at that quality.
pub fn copy_image_files<P: AsRef<Path>>(
    dir: &Path,
    sources: &[P],
    params: &ImageFileParams,
) -> Result<Vec<PathBuf>, PickerError> {
    fs::create_dir_all(dir)?;

    let copied = sources
        .iter()
        .map(|source| copy_one(dir, source.as_ref(), params))
        .collect::<Result<Vec<_>, _>>()?;

    info!(count = copied.len(), dir = %dir.display(), "copied picked images");
    Ok(copied)
}

fn copy_one(dir: &Path, source: &Path, params: &ImageFileParams) -> Result<PathBuf, PickerError> {
    let name = source.file_name().ok_or_else(|| {
        PickerError::FileCreation(format!("{} has no file name", source.display()))
    })?;
    let mut destination = dir.join(name);
    if params.compression.is_some() && !is_jpeg_name(&destination) {
        destination.set_extension("jpg");
    }

    if params.collision == CollisionPolicy::SkipExisting && destination.exists() {
        debug!(destination = %destination.display(), "destination exists, skipping copy");
        return Ok(destination);
    }

    let bytes = match params.compression {
        Some(quality) => {
            let image = decode_oriented(&ImageSource::from_path(source))?;
            encode_jpeg(&image, quality)?
        }
        None => fs::read(source)?,
    };

    let destination = free_destination(&destination, &bytes)?;
    if !destination.exists() {
        fs::write(&destination, &bytes)?;
        debug!(
            source = %source.display(),
            destination = %destination.display(),
            "copied image"
        );
    }
    Ok(destination)
}

/// First of `name.ext`, `name-1.ext`, `name-2.ext`, ... that is either free
/// or already holds exactly `bytes`.
fn free_destination(preferred: &Path, bytes: &[u8]) -> Result<PathBuf, PickerError> {
    let stem = preferred
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = preferred
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut candidate = preferred.to_path_buf();
    let mut suffix = 0u32;
    loop {
        if !candidate.exists() {
            return Ok(candidate);
        }
        if fs::read(&candidate)? == bytes {
            debug!(destination = %candidate.display(), "identical file already present");
            return Ok(candidate);
        }
        suffix += 1;
        candidate = preferred.with_file_name(format!("{stem}-{suffix}{extension}"));
    }
}

fn is_jpeg_name(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

pub(crate) fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Create an empty, uniquely named `{prefix}-{millis}*.JPEG` file in `dir`.
pub fn create_timestamped_file(dir: &Path, prefix: &str) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let file = tempfile::Builder::new()
        .prefix(&format!("{prefix}-{}", unix_millis()))
        .suffix(".JPEG")
        .tempfile_in(dir)?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}

/// Create the file a camera capture is written into.
///
/// The file lives in `dir`, or `dir/relative` when given. A target that
/// resolves outside that directory is removed and reported as
/// `UriCreation`.
pub fn create_capture_target(
    dir: &Path,
    relative: Option<&Path>,
    prefix: &str,
) -> Result<PathBuf, PickerError> {
    let dir = match relative {
        Some(relative) => dir.join(relative),
        None => dir.to_path_buf(),
    };
    let path = create_timestamped_file(&dir, prefix)
        .map_err(|e| PickerError::FileCreation(format!("{}: {e}", dir.display())))?;
    if let Err(e) = check_inside(&dir, &path) {
        let _ = fs::remove_file(&path);
        return Err(e);
    }
    debug!(path = %path.display(), "created capture target");
    Ok(path)
}

fn check_inside(dir: &Path, path: &Path) -> Result<(), PickerError> {
    let uri_error =
        |e: std::io::Error| PickerError::UriCreation(format!("{}: {e}", path.display()));
    let root = dir.canonicalize().map_err(uri_error)?;
    let resolved = path.canonicalize().map_err(uri_error)?;
    if resolved.parent() != Some(root.as_path()) {
        return Err(PickerError::UriCreation(format!(
            "{} is outside {}",
            resolved.display(),
            root.display()
        )));
    }
    Ok(())
}
