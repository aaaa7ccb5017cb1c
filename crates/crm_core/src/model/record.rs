//! Record snapshots and field patches.
//!
//! # Responsibility
//! - Hold one record's attribute values as a JSON object keyed by field name.
//! - Express partial updates as patches touching only named fields.
//!
//! # Invariants
//! - `Record::id` never changes through a patch; an `id` key in a patch is ignored.
//! - Applying a patch overwrites only the keys it contains.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Stable record identifier within one object type.
pub type RecordId = Uuid;

/// Snapshot of one record as known to the client side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub object_name_singular: String,
    /// Creation timestamp in epoch milliseconds, when known.
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub values: Map<String, Value>,
}

impl Record {
    /// Creates an empty record with a generated id.
    pub fn new(object_name_singular: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), object_name_singular)
    }

    /// Creates an empty record with a caller-provided id.
    pub fn with_id(id: RecordId, object_name_singular: impl Into<String>) -> Self {
        Self {
            id,
            object_name_singular: object_name_singular.into(),
            created_at: None,
            values: Map::new(),
        }
    }

    /// Builder-style value assignment.
    pub fn with_value(mut self, field_name: impl Into<String>, value: Value) -> Self {
        self.values.insert(field_name.into(), value);
        self
    }

    /// Returns the raw value of one field, `Value::Null` when absent.
    pub fn get(&self, field_name: &str) -> &Value {
        self.values.get(field_name).unwrap_or(&Value::Null)
    }

    /// Returns one field as a string slice when it holds a JSON string.
    pub fn get_str(&self, field_name: &str) -> Option<&str> {
        self.values.get(field_name).and_then(Value::as_str)
    }

    /// Merges a patch into this snapshot.
    pub fn apply_patch(&mut self, patch: &RecordPatch) {
        for (key, value) in patch.iter() {
            if key == "id" {
                continue;
            }
            self.values.insert(key.clone(), value.clone());
        }
    }
}

/// Partial set of field values sent through the update boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordPatch {
    values: Map<String, Value>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch touching exactly one field.
    pub fn single(field_name: impl Into<String>, value: Value) -> Self {
        let mut patch = Self::new();
        patch.set(field_name, value);
        patch
    }

    pub fn set(&mut self, field_name: impl Into<String>, value: Value) {
        self.values.insert(field_name.into(), value);
    }

    pub fn get(&self, field_name: &str) -> Option<&Value> {
        self.values.get(field_name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Field names in sorted order.
    pub fn field_names(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl From<Map<String, Value>> for RecordPatch {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}
