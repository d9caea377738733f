//! Global dispatch facade
//!
//! Routes listeners and raised events to the manager registered for their
//! type. Unknown types are logged and otherwise ignored; a domain that was
//! not initialised yet must never take the caller down.

use std::sync::Arc;

use super::{registry, Event};
use crate::listeners::ListenerHandle;
use crate::managers::DispatchManager;

fn manager_named(name: &str) -> Option<Arc<dyn DispatchManager>> {
    let id = registry::id_of(name).ok()?;
    registry::manager_for(id)
}

/// Register a listener with the manager of its pattern's type
///
/// Marks the listener registered on success.
pub fn add(listener: ListenerHandle) {
    let Some(name) = listener.type_name() else {
        return;
    };
    let Some(manager) = manager_named(name) else {
        return;
    };
    listener.set_registered(true);
    manager.add(listener);
}

/// Withdraw a listener from the manager of its pattern's type
///
/// Marks the listener unregistered.
pub fn remove(listener: &ListenerHandle) {
    let Some(name) = listener.type_name() else {
        return;
    };
    listener.set_registered(false);
    if let Some(manager) = manager_named(name) {
        manager.remove(listener);
    }
}

/// Raise an event
///
/// Immediate managers fire matching listeners before this returns; deferred
/// managers fire them on the next [`update`].
pub fn raise(event: &dyn Event) {
    let Some(manager) = manager_named(event.name()) else {
        return;
    };
    tracing::trace!("Raising {:?}", event);
    manager.raise(event);
}

/// Flush every registered manager once
///
/// Call once per update tick, after the domains raised their events.
pub fn update() {
    for manager in registry::managers() {
        manager.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::{unique_name, Ping};

    #[test]
    fn test_unknown_type_is_ignored() {
        let name = unique_name("nobody");
        raise(&Ping::new(name, 1));
    }
}
