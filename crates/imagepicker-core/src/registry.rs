//! One-shot continuation registry.
//!
//! A flow that must wait for the host to create its UI container stores a
//! continuation here and hands the returned id to the host. When the
//! container exists the host invokes the id, which removes the entry and
//! runs it with the container context.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Key of a registered continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallbackId(pub u32);

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Callback<C> = Box<dyn FnOnce(&C) + Send>;

struct Entries<C> {
    next: u32,
    callbacks: HashMap<CallbackId, Callback<C>>,
}

/// Registry of pending continuations keyed by [`CallbackId`].
///
/// Ids start at 0 and are never reused for the life of the registry.
pub struct CallbackRegistry<C> {
    entries: Mutex<Entries<C>>,
}

impl<C> Default for CallbackRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CallbackRegistry<C> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Entries {
                next: 0,
                callbacks: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries<C>> {
        // A panicking callback never runs under the lock, so a poisoned
        // guard still holds consistent state.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store `callback` and return its id.
    pub fn register(&self, callback: impl FnOnce(&C) + Send + 'static) -> CallbackId {
        let mut entries = self.lock();
        let id = CallbackId(entries.next);
        entries.next += 1;
        entries.callbacks.insert(id, Box::new(callback));
        debug!(%id, "registered continuation");
        id
    }

    /// Remove and run the continuation for `id`.
    ///
    /// Returns `false` if no continuation is pending under `id`.
    pub fn invoke(&self, id: CallbackId, context: &C) -> bool {
        let callback = self.lock().callbacks.remove(&id);
        match callback {
            Some(callback) => {
                debug!(%id, "invoking continuation");
                callback(context);
                true
            }
            None => {
                debug!(%id, "no pending continuation");
                false
            }
        }
    }

    /// Drop the continuation for `id` without running it.
    pub fn cancel(&self, id: CallbackId) -> bool {
        self.lock().callbacks.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: CallbackId) -> bool {
        self.lock().callbacks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C> fmt::Debug for CallbackRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.lock();
        f.debug_struct("CallbackRegistry")
            .field("next", &entries.next)
            .field("pending", &entries.callbacks.len())
            .finish()
    }
}
