//! Listener storage owned by a factory

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use slotmap::SlotMap;

use super::{Listener, ListenerHandle, ListenerKey};

/// Arena contents, shared with every handle through a weak reference
#[derive(Default)]
pub(crate) struct ArenaInner {
    pub(crate) listeners: SlotMap<ListenerKey, Listener>,
    /// Insertion order, for stable iteration and persistence
    pub(crate) order: Vec<ListenerKey>,
    /// Factory level pause depth
    pub(crate) pause_depth: u16,
}

impl ArenaInner {
    pub(crate) fn remove(&mut self, key: ListenerKey) -> Option<Listener> {
        let listener = self.listeners.remove(key)?;
        self.order.retain(|k| *k != key);
        Some(listener)
    }

    /// Live listeners in insertion order
    pub(crate) fn iter(&self) -> impl Iterator<Item = (ListenerKey, &Listener)> {
        self.order
            .iter()
            .filter_map(|key| self.listeners.get(*key).map(|l| (*key, l)))
    }
}

/// Owning listener arena
///
/// Dropping the arena drops every listener; outstanding handles stop
/// resolving.
#[derive(Default)]
pub(crate) struct ListenerArena {
    inner: Arc<Mutex<ArenaInner>>,
}

impl ListenerArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ArenaInner> {
        self.inner.lock()
    }

    /// Store a listener and return its handle
    pub(crate) fn insert(&self, listener: Listener) -> ListenerHandle {
        let key = {
            let mut inner = self.inner.lock();
            let key = inner.listeners.insert(listener);
            inner.order.push(key);
            key
        };
        self.handle(key)
    }

    pub(crate) fn handle(&self, key: ListenerKey) -> ListenerHandle {
        ListenerHandle::new(Arc::downgrade(&self.inner), key)
    }

    /// Check whether a handle points into this arena
    pub(crate) fn owns(&self, handle: &ListenerHandle) -> bool {
        handle.belongs_to(&self.inner)
    }

    /// Handles of all listeners in insertion order
    pub(crate) fn handles(&self) -> Vec<ListenerHandle> {
        let keys: Vec<ListenerKey> = self.inner.lock().order.clone();
        keys.into_iter().map(|key| self.handle(key)).collect()
    }

    /// Unlink a listener, handing ownership back to the caller
    pub(crate) fn remove(&self, key: ListenerKey) -> Option<Listener> {
        self.inner.lock().remove(key)
    }

    /// Unlink every listener
    pub(crate) fn drain(&self) -> Vec<Listener> {
        let mut inner = self.inner.lock();
        let order = std::mem::take(&mut inner.order);
        order
            .into_iter()
            .filter_map(|key| inner.listeners.remove(key))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}
