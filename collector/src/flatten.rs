//! Flattening of nested attribute values into delimiter-joined field names.

use serde::Serialize;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fmt,
};

/// A scalar field value of an emitted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Float(f64),
    Bool(bool),
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::String(v) => f.write_str(v),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

pub type Fields = BTreeMap<String, FieldValue>;

/// Walks `value` and stores every leaf in `fields` under its key path.
///
/// Object entries extend `prefix` with `delimiter` and their key (just the key while the
/// prefix is empty). Numbers become `f64`. Arrays are kept as their compact JSON text and
/// `null` leaves are dropped. When two paths flatten to the same name the later one wins.
pub fn flatten_into(prefix: &str, value: &Value, delimiter: &str, fields: &mut Fields) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                if prefix.is_empty() {
                    flatten_into(key, nested, delimiter, fields);
                } else {
                    flatten_into(&format!("{prefix}{delimiter}{key}"), nested, delimiter, fields);
                }
            }
        }
        Value::Number(number) => {
            if let Some(number) = number.as_f64() {
                fields.insert(prefix.to_string(), FieldValue::Float(number));
            }
        }
        Value::Bool(flag) => {
            fields.insert(prefix.to_string(), FieldValue::Bool(*flag));
        }
        Value::String(text) => {
            fields.insert(prefix.to_string(), FieldValue::String(text.clone()));
        }
        Value::Array(_) => {
            fields.insert(prefix.to_string(), FieldValue::String(value.to_string()));
        }
        Value::Null => {}
    }
}

/// Flattens `value` into a fresh field mapping with an empty prefix.
pub fn flatten(value: &Value, delimiter: &str) -> Fields {
    let mut fields = Fields::new();
    flatten_into("", value, delimiter, &mut fields);
    fields
}
