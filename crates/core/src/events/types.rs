//! Event system types

use std::fmt;

/// How often a pattern event may still fire
///
/// `-1` (or any negative value) repeats forever, `n > 0` fires `n` more
/// times and `0` marks the owning listener as destroyed.
pub type RepeatCount = i32;

/// Repeat count for listeners that never expire
pub const REPEAT_FOREVER: RepeatCount = -1;

/// Numeric id of a registered event type
///
/// Ids are only valid for the lifetime of the registry that handed them
/// out. Never persist them; persist the type name instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventTypeId(u8);

impl EventTypeId {
    /// Reserved for "not found"
    pub const INVALID: EventTypeId = EventTypeId(u8::MAX);

    pub(crate) fn new(id: u8) -> Self {
        Self(id)
    }

    /// Raw id value
    pub fn get(self) -> u8 {
        self.0
    }

    /// Slot index in the registry's id table
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Check whether this is the "not found" sentinel
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl Default for EventTypeId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for EventTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
