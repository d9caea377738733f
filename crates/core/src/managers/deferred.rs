//! Two-phase dispatch

use std::sync::Arc;

use parking_lot::Mutex;

use super::{walk, DispatchManager, Slots};
use crate::events::Event;
use crate::listeners::ListenerHandle;

/// A match collected by `raise`, fired by `flush`
type Pending = (ListenerHandle, Arc<dyn Event>);

/// Manager that separates matching from invocation
///
/// [`raise`](DispatchManager::raise) only walks the registered listeners
/// and queues the matches. [`flush`](DispatchManager::flush), driven once
/// per update tick, fires the queue in the order it was collected. Reactions
/// may therefore freely change registrations of this type; nothing they do
/// affects the walk that found them.
///
/// A queued listener that is paused, removed or destroyed before the flush
/// is skipped.
#[derive(Default)]
pub struct DeferredManager {
    slots: Mutex<Slots>,
    pending: Mutex<Vec<Pending>>,
}

impl DeferredManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of matches waiting for the next flush
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }
}

impl DispatchManager for DeferredManager {
    fn add(&self, listener: ListenerHandle) {
        self.slots.lock().push(listener);
    }

    fn remove(&self, listener: &ListenerHandle) {
        self.slots.lock().remove(listener);
    }

    fn raise(&self, event: &dyn Event) {
        let mut matches = Vec::new();
        walk(&self.slots, event, |listener| matches.push(listener));

        if matches.is_empty() {
            return;
        }

        let raised: Arc<dyn Event> = Arc::from(event.clone_event());
        let mut pending = self.pending.lock();
        pending.extend(
            matches
                .into_iter()
                .map(|listener| (listener, Arc::clone(&raised))),
        );
    }

    fn flush(&self) {
        let pending = std::mem::take(&mut *self.pending.lock());
        if pending.is_empty() {
            return;
        }
        tracing::trace!("Flushing {} deferred matches", pending.len());

        for (listener, event) in pending {
            if listener.is_registered() && !listener.is_destroyed() {
                listener.raise(event.as_ref());
            }
        }
    }

    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}
