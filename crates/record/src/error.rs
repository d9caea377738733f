//! Error types for record access

use crate::ValueKind;

/// Error raised while reading a record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    /// No field with the given name after the read cursor
    #[error("Field not found: {0}")]
    MissingField(String),

    /// Field exists but holds a different type
    #[error("Field '{name}' has type {found:?}, expected {expected:?}")]
    TypeMismatch {
        name: String,
        expected: ValueKind,
        found: ValueKind,
    },
}
