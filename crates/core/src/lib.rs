//! tidings core - typed game events
//!
//! An in-process publish/subscribe system for game content. Domains
//! (audio, UI, the game clock) register their event kinds once at start-up
//! and raise events; application code owns [`Factory`]s of listeners that
//! react to them.
//!
//! - [`events`] - event trait, type registry and the dispatch facade
//! - [`listeners`] - listeners, handles and reactions
//! - [`managers`] - immediate and deferred dispatch strategies
//! - [`scripts`] - scripted reactions and the script pool
//! - [`time`] - game clock and time events
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tidings_core::{events, Factory, ImmediateManager};
//!
//! events::register_event_type::<SoundFinished>(Arc::new(ImmediateManager::new()))?;
//!
//! let factory = Factory::new();
//! factory.add_native(SoundFinished::new("door.ogg"), |_, _| {
//!     tracing::info!("Door closed");
//! });
//!
//! tidings_core::raise(&SoundFinished::new("door.ogg"));
//! tidings_core::update();
//! ```

pub mod config;
mod error;
pub mod events;
mod factory;
pub mod listeners;
pub mod logging;
pub mod managers;
pub mod scripts;
pub mod time;

pub use error::{EventError, LoadError, LoadResult};
pub use factory::Factory;

// Dispatch facade
pub use events::dispatch::{raise, update};
pub use events::{
    register_event_type, register_type, Event, EventType, EventTypeId, RepeatCount, REPEAT_FOREVER,
};

pub use listeners::{
    Listener, ListenerHandle, ListenerKind, NativeCallback, Reaction, ScriptedCallback,
};
pub use managers::{DeferredManager, DispatchManager, ImmediateManager};

pub use config::{ClockConfig, ConfigError, ConfigResult, EventsConfig};

pub use scripts::{
    set_script_engine, ScriptArg, ScriptDescriptor, ScriptEngine, ScriptError, ScriptInstance,
};

// Record store used by `Event::put_state` / `get_state`
pub use tidings_record as record;
