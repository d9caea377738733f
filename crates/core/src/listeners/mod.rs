//! Listeners - event patterns bound to reactions
//!
//! A [`Listener`] pairs a pattern event with a [`Reaction`] and tracks its
//! own lifecycle: an optional lookup id, a nested pause depth and whether it
//! is currently registered with its dispatch manager.
//!
//! Listeners live in an arena owned by a [`Factory`](crate::Factory). Every
//! other part of the system (managers, reactions, application code) refers
//! to them through a [`ListenerHandle`], a generation checked key that
//! simply stops resolving once the listener is gone.
//!
//! # Example
//!
//! ```ignore
//! use tidings_core::Factory;
//!
//! let factory = Factory::new();
//! let listener = factory.add_native(SoundFinished::new("door.ogg"), |me, _event| {
//!     tracing::info!("Door closed");
//!     me.destroy();
//! });
//! listener.set_id("door");
//! ```

mod arena;
mod handle;
mod listener;
mod reaction;

use slotmap::new_key_type;

pub(crate) use arena::ListenerArena;
pub use handle::ListenerHandle;
pub use listener::Listener;
pub use reaction::{NativeCallback, Reaction, ScriptedCallback};

new_key_type! {
    /// Key of a listener inside its factory's arena
    pub struct ListenerKey;
}

/// Persisted listener kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ListenerKind {
    /// Process-local callback, reconnected by hand after a load
    Native = 0,
    /// Call into the script engine, reconnected automatically
    Scripted = 1,
}

impl ListenerKind {
    /// Parse a persisted tag
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ListenerKind::Native),
            1 => Some(ListenerKind::Scripted),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// What a manager walk finds behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    /// Alive and matching the raised event
    Match,
    /// Alive, different event
    NoMatch,
    /// Repeat count ran out; reap it
    Destroyed,
    /// Listener or its factory no longer exists, or it was withdrawn
    Gone,
}
