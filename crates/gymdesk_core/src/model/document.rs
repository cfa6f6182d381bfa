//! Document record and field helpers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Store-assigned document identifier (UUID v4 text).
pub type DocumentId = String;

/// Free-form field mapping carried by a document.
pub type Fields = Map<String, Value>;

/// Serialized name of the identifier field.
pub const FIELD_ID: &str = "id";
/// Serialized name of the creation timestamp (epoch milliseconds).
pub const FIELD_CREATED_AT: &str = "createdAt";
/// Serialized name of the last-update timestamp (epoch milliseconds).
pub const FIELD_UPDATED_AT: &str = "updatedAt";

const RESERVED_FIELDS: &[&str] = &[FIELD_ID, FIELD_CREATED_AT, FIELD_UPDATED_AT];

/// One record inside a collection.
///
/// Serializes as a flat JSON object: system fields side by side with the
/// caller's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    /// Unix epoch milliseconds; never changes after creation.
    pub created_at: i64,
    /// Unix epoch milliseconds; refreshed by every successful update.
    pub updated_at: i64,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    /// Looks up a field by name, including the system-owned ones.
    pub fn get(&self, name: &str) -> Option<Cow<'_, Value>> {
        match name {
            FIELD_ID => Some(Cow::Owned(Value::String(self.id.clone()))),
            FIELD_CREATED_AT => Some(Cow::Owned(Value::from(self.created_at))),
            FIELD_UPDATED_AT => Some(Cow::Owned(Value::from(self.updated_at))),
            other => self.fields.get(other).map(Cow::Borrowed),
        }
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn f64_field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(Value::as_bool)
    }

    /// Flattens the document back into one JSON object.
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + RESERVED_FIELDS.len());
        object.insert(FIELD_ID.to_string(), Value::String(self.id.clone()));
        object.insert(FIELD_CREATED_AT.to_string(), Value::from(self.created_at));
        object.insert(FIELD_UPDATED_AT.to_string(), Value::from(self.updated_at));
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}

/// Returns whether `name` is one of the store-owned fields.
pub fn is_reserved_field(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
}

/// Removes store-owned keys from caller input; returns the removed names.
pub fn strip_reserved_fields(fields: &mut Fields) -> Vec<&'static str> {
    RESERVED_FIELDS
        .iter()
        .copied()
        .filter(|name| fields.remove(*name).is_some())
        .collect()
}

/// Converts a `json!({...})` literal into a field map.
///
/// Non-object values yield an empty map.
pub fn fields_from(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}
