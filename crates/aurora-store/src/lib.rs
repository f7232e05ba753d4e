//! Aurora Store — SQLite chunk table, structured metadata filters, row reconstruction.

pub mod filter;
pub mod row;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use filter::MetadataFilter;
pub use row::{reconstruct, Reconstructed};
pub use sqlite::SqliteStore;
pub use traits::{RowSource, SearchStore};
pub use types::*;
