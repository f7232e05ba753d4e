//! Rebuilding documents from stored rows.
//!
//! Reads favour availability: a row whose metadata cannot be parsed is still
//! returned, with empty metadata, and the parse failure is kept on the result
//! so that listing code can report it.

use serde_json::Value;

use crate::types::{Document, Metadata, StoredRow};

/// A document rebuilt from a row, plus the metadata parse failure if any.
#[derive(Debug, Clone)]
pub struct Reconstructed {
    pub document: Document,
    pub metadata_error: Option<String>,
}

impl Reconstructed {
    pub fn is_malformed(&self) -> bool {
        self.metadata_error.is_some()
    }
}

/// Turn a stored row into a document.
///
/// `metadata["id"]` is always overwritten with the row id, so the returned id
/// matches the storage key whatever the metadata says.
pub fn reconstruct(row: StoredRow) -> Reconstructed {
    let (mut metadata, metadata_error) = match parse_metadata(row.metadata.as_deref()) {
        Ok(map) => (map, None),
        Err(reason) => (Metadata::new(), Some(reason)),
    };
    metadata.insert(crate::types::ID_KEY.to_string(), Value::String(row.id));

    Reconstructed {
        document: Document::with_metadata(row.content, metadata),
        metadata_error,
    }
}

fn parse_metadata(raw: Option<&str>) -> Result<Metadata, String> {
    let raw = raw.ok_or_else(|| "metadata column is NULL".to_string())?;
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("metadata is not an object: {}", kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
