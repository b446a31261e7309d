//! Background preview decodes for an edit session.
//!
//! Every decode is a blocking task in one [`JoinSet`] owned by the session.
//! Results carry the image key and the location they were decoded from so
//! the session can drop those that went stale in the meantime. Dropping the
//! loader aborts whatever is still queued.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::decode::{decode_sampled, DecodeError, DecodedImage, ImageSource, SampleOptions};

/// Which raster a decode produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewKind {
    FullSize,
    Thumbnail,
}

/// A finished decode.
#[derive(Debug)]
pub struct PreviewResult {
    /// `file_path` of the image the decode was requested for.
    pub key: PathBuf,
    /// Location the pixels were read from.
    pub location: PathBuf,
    pub kind: PreviewKind,
    pub outcome: Result<Arc<DecodedImage>, DecodeError>,
}

#[derive(Debug, Default)]
pub struct PreviewLoader {
    tasks: JoinSet<PreviewResult>,
}

impl PreviewLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a sampled decode of `location`. Must be called within a Tokio
    /// runtime.
    pub fn spawn(
        &mut self,
        key: PathBuf,
        location: PathBuf,
        kind: PreviewKind,
        options: SampleOptions,
    ) {
        debug!(key = %key.display(), ?kind, "queueing preview decode");
        self.tasks.spawn_blocking(move || {
            let outcome =
                decode_sampled(&ImageSource::from_path(&location), None, &options).map(Arc::new);
            PreviewResult {
                key,
                location,
                kind,
                outcome,
            }
        });
    }

    /// Wait for the next finished decode. `None` once nothing is queued.
    pub async fn next(&mut self) -> Option<PreviewResult> {
        loop {
            match self.tasks.join_next().await? {
                Ok(result) => return Some(result),
                Err(e) => warn!(error = %e, "preview task did not complete"),
            }
        }
    }

    /// A finished decode, if one is ready, without waiting.
    pub fn try_next(&mut self) -> Option<PreviewResult> {
        loop {
            match self.tasks.try_join_next()? {
                Ok(result) => return Some(result),
                Err(e) => warn!(error = %e, "preview task did not complete"),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn abort_all(&mut self) {
        self.tasks.abort_all();
    }
}
