//! Store seams consumed by the ingestion pipeline.

use aurora_core::Result;

use crate::filter::MetadataFilter;
use crate::types::{Document, StoredRow};

/// Additive writes and filter-based deletes over documents.
pub trait SearchStore: Send + Sync {
    /// Append documents. Every document must already carry an id.
    fn add(&self, documents: &[Document]) -> Result<()>;

    /// Remove every entry matching `filter`. Returns how many were removed.
    fn delete(&self, filter: &MetadataFilter) -> Result<usize>;

    /// Replace every entry matching `filter` with `documents`.
    ///
    /// The default runs delete then add, so a failed add leaves nothing behind.
    /// Stores with transactions should override this.
    fn replace(&self, filter: &MetadataFilter, documents: &[Document]) -> Result<usize> {
        let removed = self.delete(filter)?;
        self.add(documents)?;
        Ok(removed)
    }
}

/// Row-level reads used for listing and lookup.
pub trait RowSource: Send + Sync {
    fn count_rows(&self) -> Result<i64>;

    /// Read at most `limit` rows, skipping the first `offset`.
    fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<StoredRow>>;

    /// First row whose id equals `id`, if any.
    fn fetch_by_id(&self, id: &str) -> Result<Option<StoredRow>>;
}
