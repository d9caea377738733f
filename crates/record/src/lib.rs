//! tidings record - persisted state container
//!
//! An ordered list of named, typed fields. Fields may be nested records, and
//! names may repeat or be empty, which is how unnamed collections (the
//! listeners of a factory, for example) are written out.
//!
//! Reading goes through a [`RecordReader`]: a forward cursor with a sticky
//! success flag. Getters never fail loudly; they return a default value and
//! the caller checks [`RecordReader::success`] (or [`RecordReader::finish`])
//! once the read pass is complete.
//!
//! # Example
//!
//! ```
//! use tidings_record::Record;
//!
//! let mut record = Record::new();
//! record.put_string("lid", "door_bell");
//! record.put_u16("lps", 2);
//!
//! let mut reader = record.reader();
//! assert_eq!(reader.get_string("lid"), "door_bell");
//! assert_eq!(reader.get_u16("lps"), 2);
//! assert!(reader.success());
//! ```

mod error;
mod value;

use serde::{Deserialize, Serialize};

pub use error::RecordError;
pub use value::{Value, ValueKind};

/// A single named field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name (may be empty for collection entries)
    pub name: String,
    /// Field payload
    pub value: Value,
}

/// Ordered key/value record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Vec<Field>,
}

static EMPTY: Record = Record { fields: Vec::new() };

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record holds no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Remove all fields
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Iterate over fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Start a read pass at the first field
    pub fn reader(&self) -> RecordReader<'_> {
        RecordReader {
            record: self,
            pos: 0,
            error: None,
        }
    }

    /// Append a field with an arbitrary value
    pub fn put(&mut self, name: &str, value: Value) {
        self.fields.push(Field {
            name: name.to_string(),
            value,
        });
    }

    pub fn put_bool(&mut self, name: &str, value: bool) {
        self.put(name, Value::Bool(value));
    }

    pub fn put_u8(&mut self, name: &str, value: u8) {
        self.put(name, Value::U8(value));
    }

    pub fn put_u16(&mut self, name: &str, value: u16) {
        self.put(name, Value::U16(value));
    }

    pub fn put_u32(&mut self, name: &str, value: u32) {
        self.put(name, Value::U32(value));
    }

    pub fn put_i32(&mut self, name: &str, value: i32) {
        self.put(name, Value::I32(value));
    }

    pub fn put_f32(&mut self, name: &str, value: f32) {
        self.put(name, Value::F32(value));
    }

    pub fn put_string(&mut self, name: &str, value: &str) {
        self.put(name, Value::String(value.to_string()));
    }

    /// Append a nested record
    pub fn put_record(&mut self, name: &str, value: Record) {
        self.put(name, Value::Record(value));
    }
}

/// Generates a typed getter that records the first failure and falls back
/// to the type's default value.
macro_rules! getter {
    ($(#[$doc:meta])* $fn_name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $fn_name(&mut self, name: &str) -> $ty {
            match self.fetch(name) {
                Ok(Value::$variant(v)) => v.clone(),
                Ok(other) => self.fail(RecordError::TypeMismatch {
                    name: name.to_string(),
                    expected: ValueKind::$variant,
                    found: other.kind(),
                }),
                Err(e) => self.fail(e),
            }
        }
    };
}

/// Forward cursor over a [`Record`]
///
/// Named lookups search from the cursor onwards, so fields are expected in
/// the order they were written. A successful lookup moves the cursor past
/// the matched field.
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    record: &'a Record,
    pos: usize,
    error: Option<RecordError>,
}

impl<'a> RecordReader<'a> {
    fn fetch(&mut self, name: &str) -> Result<&'a Value, RecordError> {
        let record: &'a Record = self.record;
        let rest = &record.fields[self.pos.min(record.fields.len())..];

        match rest.iter().position(|f| f.name == name) {
            Some(offset) => {
                self.pos += offset + 1;
                Ok(&rest[offset].value)
            }
            None => Err(RecordError::MissingField(name.to_string())),
        }
    }

    fn fail<T: Default>(&mut self, error: RecordError) -> T {
        if self.error.is_none() {
            self.error = Some(error);
        }
        T::default()
    }

    getter!(
        /// Read a boolean field
        get_bool, Bool, bool
    );
    getter!(get_u8, U8, u8);
    getter!(get_u16, U16, u16);
    getter!(get_u32, U32, u32);
    getter!(get_i32, I32, i32);
    getter!(get_f32, F32, f32);
    getter!(
        /// Read a string field
        get_string, String, String
    );

    /// Read a nested record
    ///
    /// On failure an empty record is returned.
    pub fn get_record(&mut self, name: &str) -> &'a Record {
        match self.fetch(name) {
            Ok(Value::Record(r)) => r,
            Ok(other) => {
                let error = RecordError::TypeMismatch {
                    name: name.to_string(),
                    expected: ValueKind::Record,
                    found: other.kind(),
                };
                self.fail::<()>(error);
                &EMPTY
            }
            Err(e) => {
                self.fail::<()>(e);
                &EMPTY
            }
        }
    }

    /// Return the field under the cursor and advance, regardless of its name
    ///
    /// This is the iteration protocol for unnamed collections.
    pub fn next_field(&mut self) -> Option<&'a Field> {
        let record: &'a Record = self.record;
        let field = record.fields.get(self.pos)?;
        self.pos += 1;
        Some(field)
    }

    /// Check whether more fields remain after the cursor
    pub fn has_remaining(&self) -> bool {
        self.pos < self.record.fields.len()
    }

    /// Whether every read so far succeeded
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    /// First failure encountered, if any
    pub fn error(&self) -> Option<&RecordError> {
        self.error.as_ref()
    }

    /// Finish a read pass, turning the success flag into a `Result`
    pub fn finish(&self) -> Result<(), RecordError> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_in_order() {
        let mut record = Record::new();
        record.put_string("name", "bell");
        record.put_i32("count", -1);
        record.put_bool("flag", true);

        let mut reader = record.reader();
        assert_eq!(reader.get_string("name"), "bell");
        assert_eq!(reader.get_i32("count"), -1);
        assert!(reader.get_bool("flag"));
        assert!(reader.success());
        assert!(!reader.has_remaining());
    }

    #[test]
    fn test_missing_field_is_sticky() {
        let mut record = Record::new();
        record.put_u16("a", 7);

        let mut reader = record.reader();
        assert_eq!(reader.get_u16("b"), 0);
        assert_eq!(reader.get_u16("a"), 7);
        assert!(!reader.success());
        assert_eq!(
            reader.finish(),
            Err(RecordError::MissingField("b".to_string()))
        );
    }

    #[test]
    fn test_type_mismatch() {
        let mut record = Record::new();
        record.put_string("a", "text");

        let mut reader = record.reader();
        assert_eq!(reader.get_u32("a"), 0);
        match reader.error() {
            Some(RecordError::TypeMismatch {
                expected, found, ..
            }) => {
                assert_eq!(*expected, ValueKind::U32);
                assert_eq!(*found, ValueKind::String);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unnamed_collection() {
        let mut record = Record::new();
        record.put_u16("fps", 1);
        for i in 0..3 {
            let mut entry = Record::new();
            entry.put_u32("n", i);
            record.put_record("", entry);
        }

        let mut reader = record.reader();
        assert_eq!(reader.get_u16("fps"), 1);

        let mut seen = Vec::new();
        while let Some(field) = reader.next_field() {
            let Value::Record(entry) = &field.value else {
                panic!("expected record");
            };
            seen.push(entry.reader().get_u32("n"));
        }
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_nested_record_missing_returns_empty() {
        let record = Record::new();
        let mut reader = record.reader();
        assert!(reader.get_record("child").is_empty());
        assert!(!reader.success());
    }

    #[test]
    fn test_json_encoding_preserves_fields() {
        let mut inner = Record::new();
        inner.put_f32("scale", 5.0);
        let mut record = Record::new();
        record.put_u8("ltp", 1);
        record.put_record("", inner);

        let json = serde_json::to_string(&record).unwrap();
        let parsed: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
