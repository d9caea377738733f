//! Event type registry - name → (id, manager, constructor)
//!
//! Every event producing domain registers its kinds once at start-up. The
//! registry hands out small numeric ids in registration order; the id table
//! never reclaims a slot, so a stale id can never alias a different type.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use super::{Event, EventTypeId};
use crate::managers::DispatchManager;
use crate::EventError;

/// Constructor for blank events, used when restoring saved listeners
pub type EventConstructor = Arc<dyn Fn() -> Box<dyn Event> + Send + Sync>;

/// Registered event type
struct TypeEntry {
    /// Unique type name
    name: String,
    /// Numeric id (index into the id table)
    id: EventTypeId,
    /// Manager dispatching this type
    manager: Arc<dyn DispatchManager>,
    /// Creates blank instances of this type
    make_default: EventConstructor,
}

/// Global event type registry
static REGISTRY: LazyLock<RwLock<TypeRegistry>> =
    LazyLock::new(|| RwLock::new(TypeRegistry::new()));

/// Table of registered event types
///
/// The process-wide instance is reached through the free functions of this
/// module; separate instances are only useful for tests.
pub struct TypeRegistry {
    /// Lookup by name; `None` marks a removed type
    named: HashMap<String, Option<EventTypeId>>,

    /// Entries by id; `None` marks a removed slot
    types: Vec<Option<TypeEntry>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            named: HashMap::new(),
            types: Vec::new(),
        }
    }

    /// Register a type, or return the id of the already active entry
    ///
    /// A previously removed name gets a fresh id.
    pub fn register(
        &mut self,
        name: &str,
        manager: Arc<dyn DispatchManager>,
        make_default: EventConstructor,
    ) -> Result<EventTypeId, EventError> {
        if let Some(Some(id)) = self.named.get(name) {
            return Ok(*id);
        }

        if self.types.len() >= EventTypeId::INVALID.index() {
            tracing::error!("Cannot register event type '{}': registry full", name);
            return Err(EventError::RegistryFull(name.to_string()));
        }

        let id = EventTypeId::new(self.types.len() as u8);
        self.types.push(Some(TypeEntry {
            name: name.to_string(),
            id,
            manager,
            make_default,
        }));
        self.named.insert(name.to_string(), Some(id));

        tracing::debug!("Registered event type '{}' with id {}", name, id);
        Ok(id)
    }

    /// Remove a type; its id slot stays reserved
    ///
    /// Returns `true` if an active entry was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(slot) = self.named.get_mut(name) else {
            return false;
        };
        let Some(id) = slot.take() else {
            return false;
        };

        if let Some(entry) = self.types.get_mut(id.index()) {
            *entry = None;
        }
        tracing::debug!("Removed event type '{}' (id {})", name, id);
        true
    }

    /// Get the id of an active type
    pub fn id_of(&self, name: &str) -> Result<EventTypeId, EventError> {
        match self.named.get(name) {
            Some(Some(id)) => Ok(*id),
            _ => {
                tracing::warn!("Event type '{}' not registered", name);
                Err(EventError::UnknownType(name.to_string()))
            }
        }
    }

    /// Get the manager for an id
    pub fn manager_for(&self, id: EventTypeId) -> Option<Arc<dyn DispatchManager>> {
        match self.types.get(id.index()) {
            Some(Some(entry)) => {
                debug_assert_eq!(entry.id, id);
                Some(Arc::clone(&entry.manager))
            }
            _ => {
                tracing::warn!("Event id {} not registered", id);
                None
            }
        }
    }

    /// Get the blank-event constructor for a type name
    pub fn constructor(&self, name: &str) -> Option<EventConstructor> {
        let id = self.id_of(name).ok()?;
        self.types
            .get(id.index())
            .and_then(Option::as_ref)
            .map(|entry| Arc::clone(&entry.make_default))
    }

    /// Check if a name has an active entry
    pub fn contains(&self, name: &str) -> bool {
        matches!(self.named.get(name), Some(Some(_)))
    }

    /// Number of active types
    pub fn len(&self) -> usize {
        self.types.iter().flatten().count()
    }

    /// Check if no type is active
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of active types, in id order
    pub fn names(&self) -> Vec<String> {
        self.types
            .iter()
            .flatten()
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Distinct managers of active types, in id order
    pub fn managers(&self) -> Vec<Arc<dyn DispatchManager>> {
        let mut managers: Vec<Arc<dyn DispatchManager>> = Vec::new();
        for entry in self.types.iter().flatten() {
            if !managers.iter().any(|m| Arc::ptr_eq(m, &entry.manager)) {
                managers.push(Arc::clone(&entry.manager));
            }
        }
        managers
    }

    fn entry(&self, id: EventTypeId) -> Option<&TypeEntry> {
        self.types.get(id.index()).and_then(Option::as_ref)
    }
}

/// Register an event type with the global registry
///
/// # Arguments
/// * `name` - Unique type name (e.g., "time_event")
/// * `manager` - Manager that dispatches events of this type
/// * `make_default` - Creates blank events when loading saved listeners
///
/// Registering an active name again is a no-op returning the existing id.
pub fn register_type(
    name: &str,
    manager: Arc<dyn DispatchManager>,
    make_default: EventConstructor,
) -> Result<EventTypeId, EventError> {
    REGISTRY.write().register(name, manager, make_default)
}

/// Remove an event type from the global registry
pub fn remove_type(name: &str) -> bool {
    REGISTRY.write().remove(name)
}

/// Get the id of a registered type
pub fn id_of(name: &str) -> Result<EventTypeId, EventError> {
    REGISTRY.read().id_of(name)
}

/// Get the manager registered for an id
pub fn manager_for(id: EventTypeId) -> Option<Arc<dyn DispatchManager>> {
    REGISTRY.read().manager_for(id)
}

/// Create a blank event of the named type
///
/// Returns `None` (logged) if the type is not registered.
pub fn instantiate(name: &str) -> Option<Box<dyn Event>> {
    // Constructor runs outside the lock
    let make_default = REGISTRY.read().constructor(name)?;
    Some(make_default())
}

/// Check if a type name is registered
pub fn is_type_registered(name: &str) -> bool {
    REGISTRY.read().contains(name)
}

/// Name of the type registered under `id`
pub fn type_name(id: EventTypeId) -> Option<String> {
    REGISTRY.read().entry(id).map(|entry| entry.name.clone())
}

/// Distinct managers of all active types
pub(crate) fn managers() -> Vec<Arc<dyn DispatchManager>> {
    REGISTRY.read().managers()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::{unique_name, Ping};
    use crate::managers::{DeferredManager, ImmediateManager};

    fn ping_constructor(name: &'static str) -> EventConstructor {
        Arc::new(move || -> Box<dyn Event> { Box::new(Ping::new(name, 0)) })
    }

    fn immediate() -> Arc<dyn DispatchManager> {
        Arc::new(ImmediateManager::new())
    }

    #[test]
    fn test_ids_are_sequential_and_unique() {
        let mut registry = TypeRegistry::new();

        let a = registry.register("a", immediate(), ping_constructor("a")).unwrap();
        let b = registry.register("b", immediate(), ping_constructor("b")).unwrap();

        assert_eq!(a.get(), 0);
        assert_eq!(b.get(), 1);
        assert_eq!(registry.id_of("a"), Ok(a));
        assert_eq!(registry.id_of("b"), Ok(b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_active_is_noop() {
        let mut registry = TypeRegistry::new();
        let first = immediate();

        let id = registry.register("a", Arc::clone(&first), ping_constructor("a")).unwrap();
        let again = registry.register("a", immediate(), ping_constructor("a")).unwrap();

        assert_eq!(id, again);
        let manager = registry.manager_for(id).unwrap();
        assert!(Arc::ptr_eq(&manager, &first));
    }

    #[test]
    fn test_remove_then_lookup_fails() {
        let mut registry = TypeRegistry::new();
        let id = registry.register("a", immediate(), ping_constructor("a")).unwrap();

        assert!(registry.remove("a"));
        assert_eq!(
            registry.id_of("a"),
            Err(EventError::UnknownType("a".to_string()))
        );
        assert!(registry.manager_for(id).is_none());
        assert!(registry.constructor("a").is_none());
        assert!(!registry.remove("a"));
    }

    #[test]
    fn test_reregister_gets_fresh_id() {
        let mut registry = TypeRegistry::new();
        let old = registry.register("a", immediate(), ping_constructor("a")).unwrap();
        registry.register("b", immediate(), ping_constructor("b")).unwrap();

        registry.remove("a");
        let new = registry.register("a", immediate(), ping_constructor("a")).unwrap();

        assert_ne!(old, new);
        assert_eq!(new.get(), 2);
        // the old slot stays empty instead of aliasing the new entry
        assert!(registry.manager_for(old).is_none());
        assert_eq!(registry.names(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_out_of_range_id() {
        let registry = TypeRegistry::new();
        assert!(registry.manager_for(EventTypeId::new(3)).is_none());
        assert!(registry.manager_for(EventTypeId::INVALID).is_none());
    }

    #[test]
    fn test_registry_full() {
        let mut registry = TypeRegistry::new();
        for i in 0..255 {
            let name = format!("t{}", i);
            assert!(registry.register(&name, immediate(), ping_constructor("t")).is_ok());
        }
        assert_eq!(
            registry.register("overflow", immediate(), ping_constructor("t")),
            Err(EventError::RegistryFull("overflow".to_string()))
        );
    }

    #[test]
    fn test_managers_are_deduplicated() {
        let mut registry = TypeRegistry::new();
        let shared: Arc<dyn DispatchManager> = Arc::new(DeferredManager::new());

        registry.register("a", Arc::clone(&shared), ping_constructor("a")).unwrap();
        registry.register("b", Arc::clone(&shared), ping_constructor("b")).unwrap();
        registry.register("c", immediate(), ping_constructor("c")).unwrap();

        assert_eq!(registry.managers().len(), 2);
    }

    #[test]
    fn test_global_instantiate() {
        let name = unique_name("instantiate");
        register_type(name, immediate(), ping_constructor(name)).unwrap();

        let event = instantiate(name).unwrap();
        assert_eq!(event.name(), name);
        assert!(is_type_registered(name));

        let id = id_of(name).unwrap();
        assert_eq!(type_name(id).as_deref(), Some(name));

        assert!(remove_type(name));
        assert!(instantiate(name).is_none());
    }
}
