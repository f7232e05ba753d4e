//! Data types for documents, stored rows, and pages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata attached to a document. Always an object, possibly empty.
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key holding a document's identifier.
pub const ID_KEY: &str = "id";
/// Metadata key linking a chunk to the document it was cut from.
pub const SOURCE_ID_KEY: &str = "source_id";

/// A unit of text plus its metadata.
///
/// The identifier is kept in `metadata["id"]` so it travels with the
/// metadata through the splitter and into storage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// A document with empty metadata and no identifier yet.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// The identifier, if one has been assigned. Blank ids count as absent.
    pub fn id(&self) -> Option<&str> {
        self.metadata
            .get(ID_KEY)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.metadata
            .insert(ID_KEY.to_string(), Value::String(id.into()));
    }

    pub fn source_id(&self) -> Option<&str> {
        self.metadata.get(SOURCE_ID_KEY).and_then(Value::as_str)
    }
}

/// A raw row as it sits in the chunk table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub id: String,
    pub content: String,
    /// Serialized metadata object. `None` when the column is NULL.
    pub metadata: Option<String>,
}

/// One page of documents read back from the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Page {
    pub items: Vec<Document>,
    /// Total rows in the store at the time of counting.
    pub total: i64,
    /// Ids of rows on this page whose metadata could not be parsed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub malformed: Vec<String>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_rows: i64,
    pub distinct_ids: i64,
    pub db_path: String,
    pub db_size_mb: f64,
}
