//! In-place dispatch

use parking_lot::Mutex;

use super::{walk, DispatchManager, Slots};
use crate::events::Event;
use crate::listeners::ListenerHandle;

/// Manager that invokes matching listeners while walking its collection
///
/// Suitable for domains whose reactions do not need isolation from the walk
/// that found them. A listener destroyed during a raise is skipped by the
/// rest of that raise and reaped by the next one.
#[derive(Default)]
pub struct ImmediateManager {
    slots: Mutex<Slots>,
}

impl ImmediateManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DispatchManager for ImmediateManager {
    fn add(&self, listener: ListenerHandle) {
        self.slots.lock().push(listener);
    }

    fn remove(&self, listener: &ListenerHandle) {
        self.slots.lock().remove(listener);
    }

    fn raise(&self, event: &dyn Event) {
        walk(&self.slots, event, |listener| {
            listener.raise(event);
        });
    }

    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::events::testing::Ping;
    use crate::listeners::{Listener, ListenerArena, Reaction};

    fn insert(arena: &ListenerArena, key: u32, reaction: Reaction) -> ListenerHandle {
        let handle = arena.insert(Listener::new(Box::new(Ping::new("imm", key)), reaction));
        handle.set_registered(true);
        handle
    }

    fn counting(arena: &ListenerArena, key: u32, hits: &Arc<AtomicU32>) -> ListenerHandle {
        let hits = Arc::clone(hits);
        insert(
            arena,
            key,
            Reaction::native(move |_, _| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_invokes_only_matches() {
        let arena = ListenerArena::new();
        let manager = ImmediateManager::new();
        let hits = Arc::new(AtomicU32::new(0));

        manager.add(counting(&arena, 1, &hits));
        manager.add(counting(&arena, 2, &hits));

        manager.raise(&Ping::new("imm", 1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_destroyed_listener_is_reaped_on_next_raise() {
        let arena = ListenerArena::new();
        let manager = ImmediateManager::new();
        let hits = Arc::new(AtomicU32::new(0));

        let listener = counting(&arena, 1, &hits);
        manager.add(listener.clone());
        listener.destroy();

        manager.raise(&Ping::new("imm", 1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(manager.len(), 0);
        assert!(!listener.is_alive());
    }

    #[test]
    fn test_duplicate_add_is_ignored() {
        let arena = ListenerArena::new();
        let manager = ImmediateManager::new();
        let hits = Arc::new(AtomicU32::new(0));

        let listener = counting(&arena, 1, &hits);
        manager.add(listener.clone());
        manager.add(listener.clone());

        manager.raise(&Ping::new("imm", 1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_gone_listener_is_dropped() {
        let manager = ImmediateManager::new();
        let hits = Arc::new(AtomicU32::new(0));
        {
            let arena = ListenerArena::new();
            manager.add(counting(&arena, 1, &hits));
        }

        manager.raise(&Ping::new("imm", 1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_nested_raise_keeps_outer_walk_intact() {
        let arena = ListenerArena::new();
        let manager = Arc::new(ImmediateManager::new());
        let hits = Arc::new(AtomicU32::new(0));

        let victim = counting(&arena, 1, &hits);
        let remover = {
            let manager = Arc::clone(&manager);
            let victim = victim.clone();
            insert(
                &arena,
                2,
                Reaction::native(move |_, _| manager.remove(&victim)),
            )
        };
        let relay = {
            let manager = Arc::clone(&manager);
            insert(
                &arena,
                1,
                Reaction::native(move |_, _| manager.raise(&Ping::new("imm", 2))),
            )
        };

        manager.add(relay);
        manager.add(remover);
        manager.add(victim.clone());

        // relay raises key 2 mid-walk; the remover unlinks the victim
        // before the outer walk reaches it
        manager.raise(&Ping::new("imm", 1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(manager.len(), 2);

        manager.raise(&Ping::new("imm", 1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(victim.is_alive());
    }

    #[test]
    fn test_withdrawn_listener_is_unlinked_not_fired() {
        let arena = ListenerArena::new();
        let manager = ImmediateManager::new();
        let hits = Arc::new(AtomicU32::new(0));

        let listener = counting(&arena, 1, &hits);
        manager.add(listener.clone());
        // withdrawn without the manager being told
        listener.set_registered(false);

        manager.raise(&Ping::new("imm", 1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(manager.len(), 0);
        assert!(listener.is_alive());
    }
}
