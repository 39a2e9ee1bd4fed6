use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::traits::audio_callback::AudioDataCallback;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Token returned by registration and used to unregister.
///
/// Handles are unique across every registry in the process, so a handle
/// from one registry never removes an entry from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle(u64);

impl CallbackHandle {
    fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

struct Entry {
    handle: CallbackHandle,
    observer: Weak<dyn AudioDataCallback>,
}

/// Ordered, non-owning set of observers.
///
/// The lock is held across both mutation and fan-out, so once
/// [`unregister`](Self::unregister) returns the observer is never invoked
/// again. Observers whose last `Arc` has been dropped are skipped and
/// pruned on the next registration.
#[derive(Default)]
pub struct CallbackRegistry {
    entries: Mutex<Vec<Entry>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer. Registering the same observer twice delivers to it twice.
    pub fn register<C: AudioDataCallback + 'static>(&self, observer: &Arc<C>) -> CallbackHandle {
        let observer: Weak<dyn AudioDataCallback> =
            Arc::downgrade(observer) as Weak<dyn AudioDataCallback>;
        let handle = CallbackHandle::next();

        let mut entries = self.entries.lock();
        entries.retain(|entry| entry.observer.strong_count() > 0);
        entries.push(Entry { handle, observer });
        handle
    }

    /// Remove the entry for `handle`. Unknown handles are ignored.
    pub fn unregister(&self, handle: CallbackHandle) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.handle != handle);
        entries.len() != before
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of registered observers that are still alive.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.observer.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke `deliver` on every live observer in registration order.
    /// Returns how many observers were reached.
    pub fn for_each(&self, mut deliver: impl FnMut(&dyn AudioDataCallback)) -> usize {
        let entries = self.entries.lock();
        let mut reached = 0;
        for entry in entries.iter() {
            if let Some(observer) = entry.observer.upgrade() {
                deliver(observer.as_ref());
                reached += 1;
            }
        }
        reached
    }
}
