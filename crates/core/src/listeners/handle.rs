//! Non-owning listener handles

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::arena::ArenaInner;
use super::{Listener, ListenerKey, ListenerKind, NativeCallback, Probe, Reaction, ScriptedCallback};
use crate::events::{dispatch, Event, RepeatCount};
use crate::scripts::{ScriptDescriptor, ScriptError};
use crate::EventError;

/// Reference to a listener owned by a factory
///
/// Handles are cheap to clone and never keep a listener alive. Once the
/// listener is removed, reaped or its factory dropped, accessors return
/// `None` (or a neutral value) and mutators do nothing.
///
/// Every method locks the owning arena only for its own duration, so
/// handles may be used freely from inside reactions.
#[derive(Clone)]
pub struct ListenerHandle {
    arena: Weak<Mutex<ArenaInner>>,
    key: ListenerKey,
}

enum ResumeStep {
    /// Resume without a matching pause
    Unbalanced { registered: bool },
    StillPaused,
    Register,
}

impl ListenerHandle {
    pub(crate) fn new(arena: Weak<Mutex<ArenaInner>>, key: ListenerKey) -> Self {
        Self { arena, key }
    }

    pub(crate) fn belongs_to(&self, arena: &Arc<Mutex<ArenaInner>>) -> bool {
        std::ptr::eq(self.arena.as_ptr(), Arc::as_ptr(arena))
    }

    /// Key inside the owning arena
    pub fn key(&self) -> ListenerKey {
        self.key
    }

    fn with<R>(&self, f: impl FnOnce(&mut Listener) -> R) -> Option<R> {
        let arena = self.arena.upgrade()?;
        let mut inner = arena.lock();
        let result = inner.listeners.get_mut(self.key).map(f);
        result
    }

    /// Check whether the listener still exists
    pub fn is_alive(&self) -> bool {
        self.with(|_| ()).is_some()
    }

    pub fn id(&self) -> Option<String> {
        self.with(|l| l.id.clone()).flatten()
    }

    /// Set the lookup id used by [`Factory::get_by_id`](crate::Factory::get_by_id)
    pub fn set_id(&self, id: &str) {
        self.with(|l| l.id = Some(id.to_string()));
    }

    /// Registered name of the pattern event's type
    pub fn type_name(&self) -> Option<&'static str> {
        self.with(|l| l.pattern.name())
    }

    pub fn kind(&self) -> Option<ListenerKind> {
        self.with(|l| l.kind)
    }

    /// Remaining repeat count, `0` once gone
    pub fn repeat(&self) -> RepeatCount {
        self.with(|l| l.pattern.repeat()).unwrap_or(0)
    }

    pub fn set_repeat(&self, count: RepeatCount) {
        self.with(|l| l.pattern.set_repeat(count));
    }

    /// Mark the listener destroyed
    ///
    /// Nothing is unlinked right away; the next manager walk reaps it. Safe
    /// to call from anywhere, including the listener's own reaction.
    pub fn destroy(&self) {
        self.set_repeat(0);
    }

    /// Destroyed or already gone
    pub fn is_destroyed(&self) -> bool {
        self.repeat() == 0
    }

    pub fn is_registered(&self) -> bool {
        self.with(|l| l.registered).unwrap_or(false)
    }

    pub(crate) fn set_registered(&self, registered: bool) {
        self.with(|l| l.registered = registered);
    }

    pub fn pause_depth(&self) -> u16 {
        self.with(|l| l.pause_depth).unwrap_or(0)
    }

    pub fn is_paused(&self) -> bool {
        self.pause_depth() > 0
    }

    /// Pause the listener `level` times
    ///
    /// The first pause withdraws it from its manager. Each level needs its
    /// own [`resume`](Self::resume). A pause that would overflow the depth
    /// is rejected with a warning.
    pub fn pause(&self, level: u16) {
        if level == 0 {
            return;
        }

        let withdraw = self.with(|l| {
            let Some(depth) = l.pause_depth.checked_add(level) else {
                return Err(l.pause_depth);
            };
            let first = l.pause_depth == 0;
            l.pause_depth = depth;
            Ok(first && l.registered)
        });

        match withdraw {
            Some(Ok(true)) => dispatch::remove(self),
            Some(Err(depth)) => tracing::warn!(
                "Listener {:?} at pause depth {} cannot be paused {} more times",
                self.id().unwrap_or_default(),
                depth,
                level
            ),
            Some(Ok(false)) | None => {}
        }
    }

    /// Undo one level of pause, registering again at depth zero
    ///
    /// Resuming an unpaused listener logs a warning and registers it if it
    /// somehow is not.
    pub fn resume(&self) {
        let step = self.with(|l| {
            if l.pause_depth == 0 {
                return ResumeStep::Unbalanced {
                    registered: l.registered,
                };
            }
            l.pause_depth -= 1;
            if l.pause_depth == 0 {
                ResumeStep::Register
            } else {
                ResumeStep::StillPaused
            }
        });

        match step {
            Some(ResumeStep::Unbalanced { registered }) => {
                tracing::warn!(
                    "Listener {:?} resumed without matching pause",
                    self.id().unwrap_or_default()
                );
                if !registered {
                    dispatch::add(self.clone());
                }
            }
            Some(ResumeStep::Register) => dispatch::add(self.clone()),
            Some(ResumeStep::StillPaused) | None => {}
        }
    }

    /// Compare the pattern event with `event`
    pub fn equals(&self, event: &dyn Event) -> bool {
        self.with(|l| l.pattern.equals(event)).unwrap_or(false)
    }

    /// Fire the listener for a raised event
    ///
    /// Runs the pattern's repeat step and invokes the reaction without
    /// holding any lock. Returns the repeat count left afterwards; `0` means
    /// the listener is done and will be reaped. A listener without reaction
    /// logs a warning and destroys itself.
    pub fn raise(&self, event: &dyn Event) -> RepeatCount {
        let prepared = self.with(|l| {
            let Some(reaction) = l.reaction.clone() else {
                l.pattern.set_repeat(0);
                return Err(l.id.clone().unwrap_or_default());
            };
            if l.pattern.repeat() == 0 {
                return Ok(None);
            }
            l.pattern.do_repeat(event);
            Ok(Some(reaction))
        });

        match prepared {
            Some(Ok(Some(reaction))) => {
                reaction.invoke(self, event);
                self.repeat()
            }
            Some(Err(id)) => {
                tracing::warn!("{}", EventError::ReactionMissing(id));
                0
            }
            Some(Ok(None)) | None => 0,
        }
    }

    /// Attach a native reaction, e.g. after loading
    pub fn connect_native(&self, callback: NativeCallback) {
        self.with(|l| {
            l.kind = ListenerKind::Native;
            l.reaction = Some(Reaction::Native(callback));
        });
    }

    /// Attach a scripted reaction resolved through the script pool
    pub fn connect_script(&self, descriptor: ScriptDescriptor) -> Result<(), ScriptError> {
        let callback = ScriptedCallback::connect(descriptor)?;
        self.with(|l| {
            l.kind = ListenerKind::Scripted;
            l.reaction = Some(Reaction::Scripted(callback));
        });
        Ok(())
    }

    /// Script descriptor of a scripted reaction
    pub fn descriptor(&self) -> Option<ScriptDescriptor> {
        self.with(|l| l.reaction.as_ref().and_then(|r| r.descriptor().cloned()))
            .flatten()
    }

    /// Classify the listener for a manager walk
    pub(crate) fn probe(&self, event: &dyn Event) -> Probe {
        self.with(|l| {
            if l.pattern.is_exhausted() {
                Probe::Destroyed
            } else if !l.registered || l.pause_depth > 0 {
                // stale entry left behind while the type was unregistered
                Probe::Gone
            } else if l.pattern.equals(event) {
                Probe::Match
            } else {
                Probe::NoMatch
            }
        })
        .unwrap_or(Probe::Gone)
    }

    /// Drop a destroyed listener from its arena
    pub(crate) fn reap(&self) {
        let Some(arena) = self.arena.upgrade() else {
            return;
        };
        let removed = arena.lock().remove(self.key);
        if let Some(listener) = removed {
            tracing::trace!("Reaped listener {:?}", listener.id);
            // dropped here, outside the arena lock
            drop(listener);
        }
    }
}

impl PartialEq for ListenerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && Weak::ptr_eq(&self.arena, &other.arena)
    }
}

impl Eq for ListenerHandle {}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("key", &self.key)
            .field("alive", &self.is_alive())
            .finish()
    }
}
