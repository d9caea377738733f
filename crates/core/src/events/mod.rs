//! Game events
//!
//! An event is a comparable value describing "something happened": a sound
//! finished, a widget was activated, game time advanced. The same type is
//! used in two roles:
//!
//! - as the *raised* value, constructed by the producing domain and passed
//!   to [`dispatch::raise`];
//! - as the *pattern* owned by a listener, which decides whether a raised
//!   event concerns it and how many more times it may fire.
//!
//! # Architecture
//!
//! ```text
//! domain → dispatch::raise → registry (type id → manager) → manager → listeners
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tidings_core::events::{register_event_type, Event, EventType, RepeatCount};
//! use tidings_core::managers::ImmediateManager;
//!
//! #[derive(Debug, Clone, Default)]
//! struct SoundFinished {
//!     sample: String,
//!     repeat: RepeatCount,
//! }
//!
//! impl Event for SoundFinished {
//!     fn name(&self) -> &'static str { Self::NAME }
//!     fn matches(&self, raised: &dyn Event) -> bool {
//!         raised.downcast_ref::<Self>().is_some_and(|e| e.sample == self.sample)
//!     }
//!     fn repeat(&self) -> RepeatCount { self.repeat }
//!     fn set_repeat(&mut self, count: RepeatCount) { self.repeat = count; }
//! }
//!
//! impl EventType for SoundFinished {
//!     const NAME: &'static str = "audio_event";
//! }
//!
//! register_event_type::<SoundFinished>(Arc::new(ImmediateManager::new()))?;
//! ```

pub mod dispatch;
pub mod registry;
mod typed;
mod types;

use std::any::Any;
use std::fmt;

use tidings_record::{Record, RecordReader};

pub use registry::{
    id_of, instantiate, is_type_registered, manager_for, register_type, remove_type,
    EventConstructor, TypeRegistry,
};
pub use typed::{register_event_type, EventType};
pub use types::{EventTypeId, RepeatCount, REPEAT_FOREVER};

/// Persisted field holding the event's type name
pub(crate) const FIELD_TYPE: &str = "etp";

/// Persisted field holding the event's repeat count
pub(crate) const FIELD_REPEAT: &str = "erp";

/// Object-safe cloning and downcasting support
///
/// Implemented automatically for every `Event + Clone`.
pub trait EventClone {
    /// Clone into a new boxed event
    fn clone_event(&self) -> Box<dyn Event>;

    /// Access as `Any` for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl<T: Event + Clone> EventClone for T {
    fn clone_event(&self) -> Box<dyn Event> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A typed, comparable occurrence
pub trait Event: EventClone + fmt::Debug + Send + Sync + 'static {
    /// Registered type name, used for registry lookups and persistence
    fn name(&self) -> &'static str;

    /// Check whether a raised event concerns this pattern
    ///
    /// Only called with events of the same concrete type; use
    /// [`downcast_ref`](trait.Event.html#method.downcast_ref) to get at
    /// the fields.
    fn matches(&self, raised: &dyn Event) -> bool;

    /// Remaining repeat count
    fn repeat(&self) -> RepeatCount;

    /// Overwrite the repeat count
    fn set_repeat(&mut self, count: RepeatCount);

    /// Called when the owning listener fires, before its reaction runs
    ///
    /// Counts down positive repeat values. Event kinds that need to update
    /// their own state on repeat (e.g. advance an alarm) override this.
    fn do_repeat(&mut self, _raised: &dyn Event) {
        let count = self.repeat();
        if count > 0 {
            self.set_repeat(count - 1);
        }
    }

    /// Save event specific fields
    fn put_state(&self, _record: &mut Record) {}

    /// Load event specific fields, in the order `put_state` wrote them
    ///
    /// Failures are reported through the reader's success flag.
    fn get_state(&mut self, _reader: &mut RecordReader<'_>) {}
}

impl dyn Event {
    /// Downcast to a concrete event type
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Compare with another event
    ///
    /// Events of different concrete types never compare equal.
    pub fn equals(&self, other: &dyn Event) -> bool {
        Any::type_id(self.as_any()) == Any::type_id(other.as_any()) && self.matches(other)
    }

    /// Numeric type id from the registry
    ///
    /// Logs a warning and returns an error if the type is not registered.
    pub fn event_type_id(&self) -> Result<EventTypeId, crate::EventError> {
        registry::id_of(self.name())
    }

    /// Check whether the repeat count ran out
    pub fn is_exhausted(&self) -> bool {
        self.repeat() == 0
    }
}

/// Write the shared event header followed by the event's own fields
pub(crate) fn put_event(event: &dyn Event, record: &mut Record) {
    record.put_string(FIELD_TYPE, event.name());
    record.put_i32(FIELD_REPEAT, event.repeat());
    event.put_state(record);
}

/// Rebuild an event from a record written by [`put_event`]
///
/// Fails with the type name if it cannot be instantiated. The reader's
/// success flag reflects any field level failure.
pub(crate) fn get_event(reader: &mut RecordReader<'_>) -> Result<Box<dyn Event>, String> {
    let type_name = reader.get_string(FIELD_TYPE);
    let mut event = registry::instantiate(&type_name).ok_or(type_name)?;
    let repeat = reader.get_i32(FIELD_REPEAT);
    event.set_repeat(repeat);
    event.get_state(reader);
    Ok(event)
}
