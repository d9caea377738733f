//! Statically named event kinds
//!
//! Most domains define one concrete struct per event kind. Implementing
//! [`EventType`] gives the kind a fixed registry name and lets
//! [`register_event_type`] derive the load-time constructor from `Default`.

use std::sync::Arc;

use super::registry::{register_type, EventConstructor};
use super::{Event, EventTypeId};
use crate::managers::DispatchManager;
use crate::EventError;

/// Trait for event kinds with a fixed type name
pub trait EventType: Event + Default {
    /// The registry name (e.g., "time_event")
    const NAME: &'static str;
}

/// Helper function to register a typed event kind
///
/// Blank instances for loading are created with `E::default()`.
pub fn register_event_type<E: EventType>(
    manager: Arc<dyn DispatchManager>,
) -> Result<EventTypeId, EventError> {
    let make_default: EventConstructor = Arc::new(|| -> Box<dyn Event> { Box::new(E::default()) });
    register_type(E::NAME, manager, make_default)
}
