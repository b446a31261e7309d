//! How results reach the host.
//!
//! A flow ends by calling exactly one of [`Completion::resolve`] or
//! [`Completion::reject`]. Hosts that prefer awaiting a value can use
//! [`completion_channel`].

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::warn;

use crate::error::{ErrorCode, PickerError};

/// Final output of a successful flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Picked {
    pub paths: Vec<PathBuf>,
    /// One caption per path; `Some` only when the editor ran with captions on.
    pub captions: Option<Vec<String>>,
}

impl Picked {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// A failed flow as the host sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub message: String,
    pub code: ErrorCode,
}

impl From<&PickerError> for Rejection {
    fn from(err: &PickerError) -> Self {
        Self {
            message: err.to_string(),
            code: err.code(),
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for Rejection {}

/// Host-side receiver of a flow's outcome.
pub trait Completion {
    fn resolve(&self, paths: Vec<PathBuf>, captions: Option<Vec<String>>);
    fn reject(&self, message: String, code: ErrorCode);
}

/// Deliver `result` through `completion`.
pub fn complete<C: Completion + ?Sized>(completion: &C, result: Result<Picked, PickerError>) {
    match result {
        Ok(picked) => completion.resolve(picked.paths, picked.captions),
        Err(err) => completion.reject(err.to_string(), err.code()),
    }
}

/// Sending half of [`completion_channel`].
#[derive(Debug)]
pub struct CompletionSender {
    tx: Mutex<Option<oneshot::Sender<Result<Picked, Rejection>>>>,
}

impl CompletionSender {
    fn send(&self, value: Result<Picked, Rejection>) {
        let tx = self.tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        match tx {
            Some(tx) => {
                if tx.send(value).is_err() {
                    warn!("completion receiver dropped before the result arrived");
                }
            }
            None => warn!("completion already delivered; ignoring second result"),
        }
    }
}

impl Completion for CompletionSender {
    fn resolve(&self, paths: Vec<PathBuf>, captions: Option<Vec<String>>) {
        self.send(Ok(Picked { paths, captions }));
    }

    fn reject(&self, message: String, code: ErrorCode) {
        self.send(Err(Rejection { message, code }));
    }
}

/// Receiving half of [`completion_channel`].
#[derive(Debug)]
pub struct CompletionReceiver {
    rx: oneshot::Receiver<Result<Picked, Rejection>>,
}

impl Future for CompletionReceiver {
    type Output = Result<Picked, Rejection>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(Rejection::from(&PickerError::ContainerUnavailable))
            })
        })
    }
}

/// A one-shot completion whose result can be awaited.
///
/// If the sender is dropped without completing, the receiver yields a
/// `ContainerUnavailable` rejection.
pub fn completion_channel() -> (CompletionSender, CompletionReceiver) {
    let (tx, rx) = oneshot::channel();
    (
        CompletionSender {
            tx: Mutex::new(Some(tx)),
        },
        CompletionReceiver { rx },
    )
}
