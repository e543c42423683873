//! Output records and row decorations.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Key carrying the row CSS class.
pub const ROW_CLASS_KEY: &str = "DT_RowClass";
/// Key carrying the row identifier.
pub const ROW_ID_KEY: &str = "DT_RowId";
/// Key carrying the arbitrary row payload.
pub const ROW_DATA_KEY: &str = "DT_RowData";

/// A record key: a column name in alias mode, a position in index mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Name(String),
    Index(usize),
}

impl From<&str> for RecordKey {
    fn from(name: &str) -> Self {
        RecordKey::Name(name.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(name: String) -> Self {
        RecordKey::Name(name)
    }
}

impl From<usize> for RecordKey {
    fn from(index: usize) -> Self {
        RecordKey::Index(index)
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKey::Name(name) => write!(f, "{}", name),
            RecordKey::Index(index) => write!(f, "{}", index),
        }
    }
}

/// One output row, in insertion order.
///
/// Serializes as a JSON array when every key is a position (index mode with
/// no decorations), and as an object otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(RecordKey, Value)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Record::default()
    }

    /// Appends an entry, replacing any existing entry with the same key.
    pub fn insert(&mut self, key: impl Into<RecordKey>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Looks up an entry.
    pub fn get(&self, key: impl Into<RecordKey>) -> Option<&Value> {
        let key = key.into();
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Returns `true` if the record has an entry for `key`.
    pub fn contains_key(&self, key: impl Into<RecordKey>) -> bool {
        self.get(key).is_some()
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &RecordKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Returns the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the record has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_positional(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, (k, _))| *k == RecordKey::Index(i))
    }

    /// Converts the record into a JSON value.
    pub fn to_value(&self) -> Value {
        if self.is_positional() {
            Value::Array(self.entries.iter().map(|(_, v)| v.clone()).collect())
        } else {
            Value::Object(
                self.entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            )
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_positional() {
            let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
            for (_, value) in &self.entries {
                seq.serialize_element(value)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.entries.len()))?;
            for (key, value) in &self.entries {
                map.serialize_entry(&key.to_string(), value)?;
            }
            map.end()
        }
    }
}

type Decorator<R, T> = Box<dyn Fn(&R) -> T>;

/// Optional per-row callbacks producing the `DT_Row*` entries.
///
/// An unset slot means the entry is left out of the record entirely.
pub struct RowDecorators<R> {
    row_class: Option<Decorator<R, String>>,
    row_id: Option<Decorator<R, Value>>,
    row_data: Option<Decorator<R, Value>>,
}

impl<R> Default for RowDecorators<R> {
    fn default() -> Self {
        RowDecorators {
            row_class: None,
            row_id: None,
            row_data: None,
        }
    }
}

impl<R> RowDecorators<R> {
    /// Creates decorators with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_row_class<F>(&mut self, f: F)
    where
        F: Fn(&R) -> String + 'static,
    {
        self.row_class = Some(Box::new(f));
    }

    pub fn set_row_id<F>(&mut self, f: F)
    where
        F: Fn(&R) -> Value + 'static,
    {
        self.row_id = Some(Box::new(f));
    }

    pub fn set_row_data<F>(&mut self, f: F)
    where
        F: Fn(&R) -> Value + 'static,
    {
        self.row_data = Some(Box::new(f));
    }

    /// Returns `true` if no slot is set.
    pub fn is_empty(&self) -> bool {
        self.row_class.is_none() && self.row_id.is_none() && self.row_data.is_none()
    }

    /// Writes the decoration entries for `row` into `record`.
    pub fn decorate(&self, row: &R, record: &mut Record) {
        if let Some(row_class) = &self.row_class {
            record.insert(ROW_CLASS_KEY, Value::String(row_class(row)));
        }
        if let Some(row_id) = &self.row_id {
            record.insert(ROW_ID_KEY, row_id(row));
        }
        if let Some(row_data) = &self.row_data {
            record.insert(ROW_DATA_KEY, row_data(row));
        }
    }
}

impl<R> std::fmt::Debug for RowDecorators<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowDecorators")
            .field("row_class", &self.row_class.is_some())
            .field("row_id", &self.row_id.is_some())
            .field("row_data", &self.row_data.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_replaces_existing_key() {
        let mut record = Record::new();
        record.insert("name", json!("a"));
        record.insert("name", json!("b"));
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("name"), Some(&json!("b")));
    }

    #[test]
    fn positional_record_serializes_as_array() {
        let mut record = Record::new();
        record.insert(0usize, json!(1));
        record.insert(1usize, json!("Ada"));
        assert_eq!(serde_json::to_value(&record).unwrap(), json!([1, "Ada"]));
        assert_eq!(record.to_value(), json!([1, "Ada"]));
    }

    #[test]
    fn empty_record_serializes_as_array() {
        let record = Record::new();
        assert_eq!(serde_json::to_string(&record).unwrap(), "[]");
        assert_eq!(record.to_value(), json!([]));
    }

    #[test]
    fn named_record_serializes_as_object() {
        let mut record = Record::new();
        record.insert("id", json!(1));
        record.insert("name", json!("Ada"));
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"id":1,"name":"Ada"}"#
        );
    }

    #[test]
    fn decorated_index_record_serializes_as_object() {
        let mut record = Record::new();
        record.insert(ROW_ID_KEY, json!("row_1"));
        record.insert(0usize, json!(1));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"DT_RowId": "row_1", "0": 1})
        );
    }

    #[test]
    fn empty_decorators_add_nothing() {
        let decorators: RowDecorators<Value> = RowDecorators::new();
        let mut record = Record::new();
        decorators.decorate(&json!({"id": 1}), &mut record);
        assert!(record.is_empty());
        assert!(decorators.is_empty());
    }

    #[test]
    fn decorators_in_fixed_order() {
        let mut decorators: RowDecorators<Value> = RowDecorators::new();
        decorators.set_row_data(|row| json!({"pk": row["id"]}));
        decorators.set_row_id(|row| json!(format!("row_{}", row["id"])));
        decorators.set_row_class(|_| "odd".to_string());

        let mut record = Record::new();
        decorators.decorate(&json!({"id": 3}), &mut record);

        let keys: Vec<String> = record.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec![ROW_CLASS_KEY, ROW_ID_KEY, ROW_DATA_KEY]);
        assert_eq!(record.get(ROW_ID_KEY), Some(&json!("row_3")));
        assert_eq!(record.get(ROW_DATA_KEY), Some(&json!({"pk": 3})));
    }
}
