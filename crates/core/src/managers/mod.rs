//! Dispatch managers
//!
//! A manager keeps the registered listeners of one event type and decides
//! how a raised event reaches them. Two strategies are provided:
//!
//! - [`ImmediateManager`]: invoke matching listeners while walking
//! - [`DeferredManager`]: collect matches on raise, invoke them on `flush`
//!
//! Managers hold [`ListenerHandle`]s only. Listeners are owned by their
//! factory; a handle whose listener is gone is simply dropped on the next
//! walk.
//!
//! # Re-entrancy
//!
//! Reactions may add, remove, pause or destroy listeners of the very type
//! being dispatched, or raise further events. Walks therefore never hold a
//! lock while a reaction runs, and removals during a walk leave a hole that
//! is compacted once the outermost walk ends. Entries added during a walk
//! are not visited by it.

mod deferred;
mod immediate;

use parking_lot::Mutex;

use crate::events::Event;
use crate::listeners::{ListenerHandle, Probe};

pub use deferred::DeferredManager;
pub use immediate::ImmediateManager;

/// Per-type listener collection and matching strategy
pub trait DispatchManager: Send + Sync {
    /// Register a listener
    fn add(&self, listener: ListenerHandle);

    /// Unregister a listener
    fn remove(&self, listener: &ListenerHandle);

    /// Dispatch (or, for deferred managers, collect) a raised event
    fn raise(&self, event: &dyn Event);

    /// Invoke collected matches; a no-op for immediate managers
    fn flush(&self) {}

    /// Number of registered listeners, including ones awaiting reaping
    fn len(&self) -> usize;

    /// Check if no listener is registered
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registered listeners with walk-safe removal
#[derive(Default)]
pub(crate) struct Slots {
    /// Registration order; `None` marks an entry removed during a walk
    entries: Vec<Option<ListenerHandle>>,
    /// Nesting depth of walks in progress
    walking: u32,
}

impl Slots {
    pub(crate) fn push(&mut self, listener: ListenerHandle) {
        if self.position(&listener).is_some() {
            tracing::trace!("Listener already registered, ignoring");
            return;
        }
        self.entries.push(Some(listener));
    }

    pub(crate) fn remove(&mut self, listener: &ListenerHandle) -> bool {
        match self.position(listener) {
            Some(index) => {
                self.unlink(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    fn position(&self, listener: &ListenerHandle) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.as_ref() == Some(listener))
    }

    /// Start a walk, returning the number of entries it covers
    fn begin_walk(&mut self) -> usize {
        self.walking += 1;
        self.entries.len()
    }

    fn get(&self, index: usize) -> Option<ListenerHandle> {
        self.entries.get(index).cloned().flatten()
    }

    fn unlink(&mut self, index: usize) {
        if self.walking > 0 {
            self.entries[index] = None;
        } else {
            self.entries.remove(index);
        }
    }

    fn end_walk(&mut self) {
        self.walking -= 1;
        if self.walking == 0 {
            self.entries.retain(Option::is_some);
        }
    }
}

/// Walk registered listeners, reaping destroyed ones and reporting matches
///
/// The slot lock is only held between listeners, never while `on_match`
/// runs.
pub(crate) fn walk(
    slots: &Mutex<Slots>,
    event: &dyn Event,
    mut on_match: impl FnMut(ListenerHandle),
) {
    let end = slots.lock().begin_walk();

    for index in 0..end {
        let entry = slots.lock().get(index);
        let Some(listener) = entry else {
            continue;
        };

        match listener.probe(event) {
            Probe::Match => on_match(listener),
            Probe::NoMatch => {}
            Probe::Destroyed => {
                slots.lock().unlink(index);
                listener.reap();
            }
            Probe::Gone => {
                slots.lock().unlink(index);
            }
        }
    }

    slots.lock().end_walk();
}
