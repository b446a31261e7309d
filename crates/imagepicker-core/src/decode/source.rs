//! Re-openable handles to encoded image bytes.
//!
//! The sampler reads a source three times (header probe, pixel decode,
//! EXIF lookup), so a source is a handle that can be opened repeatedly
//! rather than a one-shot stream.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A buffered, seekable reader over encoded image bytes.
pub trait ImageReadSeek: BufRead + Seek + Send {}

impl<T: BufRead + Seek + Send> ImageReadSeek for T {}

/// Stable handle to an encoded image.
#[derive(Clone)]
pub enum ImageSource {
    /// A file on disk.
    Path(PathBuf),
    /// Shared in-memory bytes.
    Memory(Arc<[u8]>),
}

impl ImageSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ImageSource::Path(path.into())
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        ImageSource::Memory(bytes.into())
    }

    /// Open a fresh reader positioned at the start of the image.
    pub fn open(&self) -> std::io::Result<Box<dyn ImageReadSeek>> {
        match self {
            ImageSource::Path(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
            ImageSource::Memory(bytes) => Ok(Box::new(Cursor::new(Arc::clone(bytes)))),
        }
    }

    /// Filesystem path, if this source has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ImageSource::Path(path) => Some(path),
            ImageSource::Memory(_) => None,
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ImageSource::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Memory(bytes.into())
    }
}
