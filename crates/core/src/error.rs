//! Error types for the event subsystem

use tidings_record::{RecordError, ValueKind};

use crate::scripts::ScriptError;

/// Recoverable event subsystem errors
///
/// These are logged where they occur; callers of the dispatch facade never
/// see them. They are returned from the registry API so that domains can
/// react during start-up.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventError {
    /// No active registry entry for this type name
    #[error("Event type '{0}' not registered")]
    UnknownType(String),

    /// No active registry entry for this numeric id
    #[error("Event id {0} not registered")]
    UnknownTypeId(u8),

    /// All 255 event type ids have been handed out
    #[error("Event type registry is full, cannot register '{0}'")]
    RegistryFull(String),

    /// Listener fired without a reaction attached
    #[error("Listener '{0}' has no reaction connected")]
    ReactionMissing(String),
}

/// Failure while restoring listener or factory state
///
/// Partially restored event state is unsafe to run, so any of these aborts
/// the load that produced it.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Record structure is malformed
    #[error("Malformed record: {0}")]
    Record(#[from] RecordError),

    /// Persisted listener kind tag is not known
    #[error("Unknown listener kind {0}")]
    UnknownListenerKind(u8),

    /// Persisted listener carries no pattern event
    #[error("Listener '{0}' has no event")]
    MissingEvent(String),

    /// Event type name cannot be instantiated through the registry
    #[error("Could not load event of type '{0}'")]
    UnknownEventType(String),

    /// Scripted reaction could not be reconnected
    #[error("Restoring callback failed for '{id}': {source}")]
    ScriptReconnect {
        id: String,
        #[source]
        source: ScriptError,
    },

    /// Scripted listener saved without a script descriptor
    #[error("Scripted listener '{0}' has no script to reconnect")]
    ScriptMissing(String),

    /// Persisted script argument has a kind scripts cannot receive
    #[error("Unsupported script argument of kind {0:?}")]
    InvalidScriptArgument(ValueKind),

    /// Collection entry is not a nested record
    #[error("Expected listener record but found field '{0}'")]
    UnexpectedField(String),
}

/// Result type for load operations
pub type LoadResult<T> = Result<T, LoadError>;
