//! SQLite-backed chunk store.
//!
//! One table holds every chunk as `(id, content, metadata)`. Metadata is a
//! JSON object in a TEXT column and filters run through `json_extract`.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use tracing::{debug, info};

use crate::filter::MetadataFilter;
use crate::schema::SCHEMA_SQL;
use crate::traits::{RowSource, SearchStore};
use crate::types::*;
use aurora_core::{Error, Result};

/// SQLite chunk store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the SQLite store.
    ///
    /// `db_dir` is the directory (e.g., `data/vectordb/`). The file will be `db_dir/aurora.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("aurora.db");

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let stats = store.stats()?;
        info!(
            "SqliteStore initialized: {} rows, {} ids, {:.2}MB, path={}",
            stats.total_rows, stats.distinct_ids, stats.db_size_mb, stats.db_path
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    fn insert_all(tx: &Transaction<'_>, documents: &[Document]) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut stmt = tx
            .prepare_cached(
                "INSERT INTO vector_store (id, content, metadata, created_at) VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        for doc in documents {
            let id = doc
                .id()
                .ok_or_else(|| Error::Storage("cannot store a document without an id".into()))?;
            let metadata = serde_json::to_string(&doc.metadata)?;
            stmt.execute(params![id, doc.content, metadata, now])
                .map_err(|e| Error::Database(e.to_string()))?;
        }
        Ok(())
    }

    fn delete_matching(conn: &Connection, filter: &MetadataFilter) -> Result<usize> {
        let (clause, values) = filter.to_sql()?;
        let sql = format!("DELETE FROM vector_store WHERE {}", clause);
        conn.execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| Error::Database(e.to_string()))
    }

    fn row_to_stored(row: &Row<'_>) -> rusqlite::Result<StoredRow> {
        Ok(StoredRow {
            id: row.get(0)?,
            content: row.get(1)?,
            metadata: row.get(2)?,
        })
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock();
        let (total_rows, distinct_ids): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COUNT(DISTINCT id) FROM vector_store",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        drop(conn);

        let db_size_mb = std::fs::metadata(&self.db_path)
            .map(|m| m.len() as f64 / (1024.0 * 1024.0))
            .unwrap_or(0.0);

        Ok(StoreStats {
            total_rows,
            distinct_ids,
            db_path: self.db_path.display().to_string(),
            db_size_mb,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl SearchStore for SqliteStore {
    fn add(&self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(|e| Error::Database(e.to_string()))?;
        Self::insert_all(&tx, documents)?;
        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        debug!("Added {} rows", documents.len());
        Ok(())
    }

    fn delete(&self, filter: &MetadataFilter) -> Result<usize> {
        let conn = self.conn.lock();
        let removed = Self::delete_matching(&conn, filter)?;
        debug!("Deleted {} rows matching {:?}", removed, filter);
        Ok(removed)
    }

    /// Delete and insert inside one transaction: on any failure the old rows stay.
    fn replace(&self, filter: &MetadataFilter, documents: &[Document]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(|e| Error::Database(e.to_string()))?;
        let removed = Self::delete_matching(&tx, filter)?;
        Self::insert_all(&tx, documents)?;
        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        debug!("Replaced {} rows with {}", removed, documents.len());
        Ok(removed)
    }
}

impl RowSource for SqliteStore {
    fn count_rows(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM vector_store", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<StoredRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, content, metadata FROM vector_store ORDER BY pk LIMIT ?1 OFFSET ?2",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_stored)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Database(e.to_string()))
    }

    fn fetch_by_id(&self, id: &str) -> Result<Option<StoredRow>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(
                "SELECT id, content, metadata FROM vector_store WHERE id = ?1 ORDER BY pk LIMIT 1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], Self::row_to_stored)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn find(store: &SqliteStore, filter: &MetadataFilter) -> Vec<StoredRow> {
        let (clause, values) = filter.to_sql().unwrap();
        let sql = format!(
            "SELECT id, content, metadata FROM vector_store WHERE {} ORDER BY pk",
            clause
        );
        let conn = store.conn.lock();
        let mut stmt = conn.prepare(&sql).unwrap();
        let rows = stmt
            .query_map(params_from_iter(values.iter()), SqliteStore::row_to_stored)
            .unwrap();
        rows.collect::<rusqlite::Result<Vec<_>>>().unwrap()
    }

    fn insert_raw(store: &SqliteStore, id: &str, content: &str, metadata: Option<&str>) {
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO vector_store (id, content, metadata, created_at) VALUES (?1, ?2, ?3, 0)",
                params![id, content, metadata],
            )
            .unwrap();
    }

    fn doc(id: &str, content: &str) -> Document {
        let mut d = Document::new(content);
        d.set_id(id);
        d
    }

    #[test]
    fn test_add_and_fetch_by_id() {
        let (store, _dir) = test_store();
        store.add(&[doc("a", "first"), doc("b", "second")]).unwrap();

        let row = store.fetch_by_id("b").unwrap().unwrap();
        assert_eq!(row.content, "second");
        let meta: serde_json::Value = serde_json::from_str(row.metadata.as_deref().unwrap()).unwrap();
        assert_eq!(meta["id"], json!("b"));

        assert!(store.fetch_by_id("missing").unwrap().is_none());
        assert_eq!(store.count_rows().unwrap(), 2);
    }

    #[test]
    fn test_add_rejects_unidentified_document() {
        let (store, _dir) = test_store();
        let err = store
            .add(&[doc("a", "ok"), Document::new("no id")])
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        // The batch is one transaction.
        assert_eq!(store.count_rows().unwrap(), 0);
    }

    #[test]
    fn test_add_is_additive_for_shared_ids() {
        let (store, _dir) = test_store();
        store.add(&[doc("same", "one")]).unwrap();
        store.add(&[doc("same", "two")]).unwrap();
        assert_eq!(store.count_rows().unwrap(), 2);
        assert_eq!(store.fetch_by_id("same").unwrap().unwrap().content, "one");
    }

    #[test]
    fn test_delete_by_filter_removes_all_matches() {
        let (store, _dir) = test_store();
        store
            .add(&[doc("x", "1"), doc("x", "2"), doc("y", "3")])
            .unwrap();
        let removed = store.delete(&MetadataFilter::id("x")).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count_rows().unwrap(), 1);
    }

    #[test]
    fn test_delete_does_not_interpret_quotes() {
        let (store, _dir) = test_store();
        store.add(&[doc("a", "1"), doc("b", "2")]).unwrap();
        let removed = store.delete(&MetadataFilter::id("a' OR '1'='1")).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(store.count_rows().unwrap(), 2);
    }

    #[test]
    fn test_replace_is_atomic() {
        let (store, _dir) = test_store();
        store.add(&[doc("k", "old")]).unwrap();

        // The new document has no id, so the insert fails and the delete rolls back.
        let err = store.replace(&MetadataFilter::id("k"), &[Document::new("new")]);
        assert!(err.is_err());
        assert_eq!(store.fetch_by_id("k").unwrap().unwrap().content, "old");

        let removed = store
            .replace(&MetadataFilter::id("k"), &[doc("k", "new")])
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.fetch_by_id("k").unwrap().unwrap().content, "new");
        assert_eq!(store.count_rows().unwrap(), 1);
    }

    #[test]
    fn test_pagination() {
        let (store, _dir) = test_store();
        let docs: Vec<_> = (0..5).map(|i| doc(&format!("d{i}"), &format!("doc {i}"))).collect();
        store.add(&docs).unwrap();

        let page = store.fetch_page(2, 0).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, "d0");

        let last = store.fetch_page(2, 4).unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].id, "d4");

        assert!(store.fetch_page(2, 10).unwrap().is_empty());
    }

    #[test]
    fn test_find_by_metadata() {
        let (store, _dir) = test_store();
        let mut tagged = doc("t", "tagged");
        tagged.metadata.insert("page_number".into(), json!(2));
        store.add(&[tagged, doc("u", "plain")]).unwrap();

        let rows = find(&store, &MetadataFilter::eq("page_number", 2));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "t");
    }

    #[test]
    fn test_unreadable_metadata_does_not_break_filters() {
        let (store, _dir) = test_store();
        let mut tagged = doc("t", "tagged");
        tagged.metadata.insert("page_number".into(), json!(2));
        store.add(&[tagged, doc("u", "plain")]).unwrap();
        insert_raw(&store, "bad", "text", Some("{oops"));
        insert_raw(&store, "null", "text", None);

        let rows = find(&store, &MetadataFilter::eq("page_number", 2));
        assert_eq!(rows.len(), 1);
        assert!(find(&store, &MetadataFilter::eq("title", serde_json::Value::Null)).is_empty());

        assert_eq!(store.delete(&MetadataFilter::id("u")).unwrap(), 1);
        assert_eq!(
            store
                .replace(&MetadataFilter::id("t"), &[doc("t", "retagged")])
                .unwrap(),
            1
        );
        assert_eq!(store.delete(&MetadataFilter::id("bad")).unwrap(), 1);
        assert!(store.fetch_by_id("bad").unwrap().is_none());
        assert_eq!(store.count_rows().unwrap(), 2);
    }

    #[test]
    fn test_stats() {
        let (store, _dir) = test_store();
        store
            .add(&[doc("a", "1"), doc("a", "2"), doc("b", "3")])
            .unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.total_rows, 3);
        assert_eq!(stats.distinct_ids, 2);
        assert!(stats.db_path.ends_with("aurora.db"));
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = TempDir::new().unwrap();
        {
            let store = SqliteStore::open(dir.path()).unwrap();
            store.add(&[doc("p", "persisted")]).unwrap();
        }
        let store = SqliteStore::open(dir.path()).unwrap();
        assert_eq!(store.fetch_by_id("p").unwrap().unwrap().content, "persisted");
    }
}
