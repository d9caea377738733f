//! Factories - owners of listeners
//!
//! Application code creates one [`Factory`] per logical owner (an NPC, a UI
//! subtree, a quest) and registers listeners through it. The factory owns
//! every listener it created, pauses and resumes them as a group, persists
//! them, and withdraws them from dispatch when dropped.

use tidings_record::Record;

use crate::error::{LoadError, LoadResult};
use crate::events::{dispatch, Event};
use crate::listeners::{Listener, ListenerArena, ListenerHandle, Reaction, ScriptedCallback};
use crate::scripts::{ScriptDescriptor, ScriptError};

/// Persisted field holding the factory pause depth
const FIELD_PAUSE: &str = "fps";

/// Owner of a group of listeners
///
/// All methods take `&self`; a factory may be shared (e.g. in an `Arc`) and
/// used from inside reactions.
#[derive(Default)]
pub struct Factory {
    arena: ListenerArena,
}

impl Factory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a listener for `pattern`
    ///
    /// If the factory is paused the listener starts paused at the same
    /// depth; otherwise it is registered with its type's manager right away.
    pub fn add(&self, pattern: Box<dyn Event>, reaction: Reaction) -> ListenerHandle {
        self.insert(Listener::new(pattern, reaction))
    }

    /// Create a listener with a native closure
    pub fn add_native<E, F>(&self, pattern: E, callback: F) -> ListenerHandle
    where
        E: Event,
        F: Fn(&ListenerHandle, &dyn Event) + Send + Sync + 'static,
    {
        self.add(Box::new(pattern), Reaction::native(callback))
    }

    /// Create a listener calling a script method
    pub fn add_script<E: Event>(
        &self,
        pattern: E,
        descriptor: ScriptDescriptor,
    ) -> Result<ListenerHandle, ScriptError> {
        let callback = ScriptedCallback::connect(descriptor)?;
        Ok(self.add(Box::new(pattern), Reaction::Scripted(callback)))
    }

    /// Take ownership of a prepared listener
    ///
    /// Its pause depth is raised to at least the factory's.
    pub fn insert(&self, mut listener: Listener) -> ListenerHandle {
        listener.registered = false;
        let handle = {
            let depth = self.arena.lock().pause_depth;
            listener.pause_depth = listener.pause_depth.max(depth);
            self.arena.insert(listener)
        };

        if handle.pause_depth() == 0 {
            dispatch::add(handle.clone());
        }
        handle
    }

    /// Unlink a listener and hand it back
    ///
    /// The listener is withdrawn from its manager first. Returns `None` if
    /// the handle does not belong to this factory or is already gone.
    pub fn remove(&self, handle: &ListenerHandle) -> Option<Listener> {
        if !self.arena.owns(handle) {
            tracing::warn!("Tried to remove a listener owned by another factory");
            return None;
        }

        if handle.is_registered() {
            dispatch::remove(handle);
        }
        let mut listener = self.arena.remove(handle.key())?;
        listener.registered = false;
        Some(listener)
    }

    /// Destroy every listener
    ///
    /// Listeners are only marked; managers reap them on their next walk, so
    /// this is safe to call from inside a reaction.
    pub fn clear(&self) {
        let mut inner = self.arena.lock();
        for (_, listener) in inner.listeners.iter_mut() {
            listener.pattern.set_repeat(0);
        }
    }

    /// Pause every listener one more level
    ///
    /// Rejected with a warning if the depth would overflow.
    pub fn pause(&self) {
        {
            let mut inner = self.arena.lock();
            let Some(depth) = inner.pause_depth.checked_add(1) else {
                tracing::warn!("Factory pause depth {} cannot nest further", inner.pause_depth);
                return;
            };
            inner.pause_depth = depth;
        }
        for handle in self.arena.handles() {
            handle.pause(1);
        }
    }

    /// Undo one [`pause`](Self::pause)
    pub fn resume(&self) {
        {
            let mut inner = self.arena.lock();
            if inner.pause_depth == 0 {
                tracing::warn!("Factory resumed without matching pause");
                return;
            }
            inner.pause_depth -= 1;
        }
        for handle in self.arena.handles() {
            handle.resume();
        }
    }

    pub fn pause_depth(&self) -> u16 {
        self.arena.lock().pause_depth
    }

    pub fn is_paused(&self) -> bool {
        self.pause_depth() > 0
    }

    /// First listener with the given lookup id
    pub fn get_by_id(&self, id: &str) -> Option<ListenerHandle> {
        let inner = self.arena.lock();
        let key = inner
            .iter()
            .find(|(_, l)| l.id() == Some(id))
            .map(|(key, _)| key);
        drop(inner);
        key.map(|key| self.arena.handle(key))
    }

    /// Handles of all listeners, in insertion order
    pub fn listeners(&self) -> Vec<ListenerHandle> {
        self.arena.handles()
    }

    /// Number of owned listeners, destroyed ones included until reaped
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the pause depth and every listener that is not destroyed
    pub fn put_state(&self, record: &mut Record) {
        let inner = self.arena.lock();
        record.put_u16(FIELD_PAUSE, inner.pause_depth);

        for (_, listener) in inner.iter() {
            if listener.is_destroyed() {
                continue;
            }
            let mut entry = Record::new();
            listener.put_state(&mut entry);
            record.put_record("", entry);
        }
    }

    /// Load listeners written by [`put_state`](Self::put_state)
    ///
    /// Loaded listeners are appended; those not paused are registered. The
    /// factory takes over the saved pause depth and listeners it already
    /// owned are paused or resumed by the difference, so they stay in step
    /// with it. The load is all or nothing: on failure nothing changes and
    /// the caller must abandon the surrounding load.
    pub fn get_state(&self, record: &Record) -> Result<(), LoadError> {
        let (pause_depth, listeners) = load_listeners(record).inspect_err(|e| {
            tracing::error!("Loading listeners failed: {}", e);
        })?;

        let existing = self.arena.handles();
        let previous = std::mem::replace(&mut self.arena.lock().pause_depth, pause_depth);
        if pause_depth > previous {
            for handle in &existing {
                handle.pause(pause_depth - previous);
            }
        } else {
            for handle in &existing {
                for _ in pause_depth..previous {
                    handle.resume();
                }
            }
        }

        for listener in listeners {
            let handle = self.arena.insert(listener);
            if handle.pause_depth() == 0 {
                dispatch::add(handle);
            }
        }
        Ok(())
    }
}

fn load_listeners(record: &Record) -> LoadResult<(u16, Vec<Listener>)> {
    let mut reader = record.reader();
    let pause_depth = reader.get_u16(FIELD_PAUSE);
    reader.finish()?;

    let mut listeners = Vec::new();
    while let Some(field) = reader.next_field() {
        let Some(entry) = field.value.as_record() else {
            return Err(LoadError::UnexpectedField(field.name.clone()));
        };
        listeners.push(Listener::load(entry)?);
    }
    Ok((pause_depth, listeners))
}

impl Drop for Factory {
    fn drop(&mut self) {
        for handle in self.arena.handles() {
            if handle.is_registered() {
                dispatch::remove(&handle);
            }
        }
        // listeners drop outside the arena lock
        let listeners = self.arena.drain();
        drop(listeners);
    }
}
