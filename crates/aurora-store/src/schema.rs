//! Database schema SQL.

/// Chunk table. `pk` orders rows by insertion; `id` is the document identifier
/// and is deliberately not unique, since chunks split from one identified
/// document share its id.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS vector_store (
    pk INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL,
    content TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_vector_store_id ON vector_store(id);
"#;
