//! Field values

use serde::{Deserialize, Serialize};

use crate::Record;

/// Typed payload of a record field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    I32(i32),
    F32(f32),
    String(String),
    Record(Record),
}

/// Discriminant of a [`Value`], used in error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    U8,
    U16,
    U32,
    I32,
    F32,
    String,
    Record,
}

impl Value {
    /// Get the kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::U8(_) => ValueKind::U8,
            Value::U16(_) => ValueKind::U16,
            Value::U32(_) => ValueKind::U32,
            Value::I32(_) => ValueKind::I32,
            Value::F32(_) => ValueKind::F32,
            Value::String(_) => ValueKind::String,
            Value::Record(_) => ValueKind::Record,
        }
    }

    /// Borrow the nested record, if this is one
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}
