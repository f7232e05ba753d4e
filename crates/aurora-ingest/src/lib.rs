//! Aurora Ingest — text sanitizing, chunking, format readers, document ingestion, bootstrap seeding.

pub mod bootstrap;
pub mod chunking;
pub mod ingest;
pub mod reader;
pub mod sanitize;

pub use bootstrap::{BootstrapLoader, BootstrapOutcome};
pub use chunking::{Chunker, Splitter, TokenSplitter};
pub use ingest::Ingester;
pub use reader::{DocumentReader, RawDocument, ReaderKind};
pub use sanitize::{sanitize, sanitize_str};
