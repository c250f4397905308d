//! Free-form record metadata
//!
//! Metadata is an explicit mapping from string keys to a constrained variant
//! type rather than an unchecked dynamic bag: strings, numbers, booleans, and
//! nested mappings are representable, everything else is dropped on ingest.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Map(BTreeMap<String, MetadataValue>),
}

pub type MetadataMap = BTreeMap<String, MetadataValue>;

impl MetadataValue {
    /// Convert a JSON value, returning `None` for unsupported shapes
    /// (arrays, null).
    pub fn from_json_value(v: &JsonValue) -> Option<MetadataValue> {
        match v {
            JsonValue::Bool(b) => Some(MetadataValue::Bool(*b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(MetadataValue::Int(i))
                } else {
                    n.as_f64().map(MetadataValue::Float)
                }
            }
            JsonValue::String(s) => Some(MetadataValue::Str(s.clone())),
            JsonValue::Object(map) => Some(MetadataValue::Map(metadata_from_json_map(map))),
            JsonValue::Null | JsonValue::Array(_) => None,
        }
    }
}

fn metadata_from_json_map(map: &serde_json::Map<String, JsonValue>) -> MetadataMap {
    map.iter()
        .filter_map(|(k, v)| MetadataValue::from_json_value(v).map(|mv| (k.clone(), mv)))
        .collect()
}

/// Parse a metadata JSONB column. Non-object payloads and unsupported entry
/// shapes collapse to an empty/partial map rather than an error.
pub fn metadata_from_json(v: &JsonValue) -> MetadataMap {
    match v {
        JsonValue::Object(map) => metadata_from_json_map(map),
        _ => MetadataMap::new(),
    }
}

/// Serialize a metadata map for JSONB storage.
pub fn metadata_to_json(map: &MetadataMap) -> JsonValue {
    serde_json::to_value(map).unwrap_or_else(|_| JsonValue::Object(serde_json::Map::new()))
}
