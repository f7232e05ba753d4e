//! Document ingestion pipeline: resource → text → sanitize → chunk → store.
//!
//! Also the symmetric read, replace and delete paths over stored chunks.
//! Every store failure on a write path comes back as [`Error::Ingestion`]
//! with the store error as its source; lookups of unknown ids come back as
//! [`Error::NotFound`].

use tracing::{debug, info, warn};

use crate::chunking::Chunker;
use crate::reader::{reader_for, ReaderKind};
use crate::sanitize::sanitize;
use aurora_core::{Error, Result};
use aurora_store::{reconstruct, Document, MetadataFilter, Page, RowSource, SearchStore};

/// Handles document ingestion and chunk maintenance against one store.
pub struct Ingester<'a, S> {
    store: &'a S,
    chunker: Chunker,
    pdf_pages_per_document: usize,
}

impl<'a, S> Ingester<'a, S>
where
    S: SearchStore + RowSource,
{
    pub fn new(store: &'a S, chunker: Chunker) -> Self {
        Self {
            store,
            chunker,
            pdf_pages_per_document: 1,
        }
    }

    pub fn with_pdf_pages_per_document(mut self, pages: usize) -> Self {
        self.pdf_pages_per_document = pages.max(1);
        self
    }

    pub fn store(&self) -> &S {
        self.store
    }

    /// Read one page of stored chunks. Returns the page and the total row count.
    ///
    /// Rows with unreadable metadata are still returned (with only their id in
    /// metadata) and their ids are listed in `Page::malformed`.
    pub fn list_page(&self, page_size: usize, offset: usize) -> Result<Page> {
        let total = self.store.count_rows()?;
        let rows = self.store.fetch_page(page_size, offset)?;

        let mut page = Page {
            items: Vec::with_capacity(rows.len()),
            total,
            malformed: Vec::new(),
        };
        for row in rows {
            let rebuilt = reconstruct(row);
            if let Some(reason) = &rebuilt.metadata_error {
                let id = rebuilt.document.id().unwrap_or_default().to_string();
                warn!("Row {} has malformed metadata: {}", id, reason);
                page.malformed.push(id);
            }
            page.items.push(rebuilt.document);
        }

        debug!(
            "Listed {} of {} rows (offset {})",
            page.items.len(),
            page.total,
            offset
        );
        Ok(page)
    }

    /// Exact-match lookup. When several chunks share the id, the earliest written wins.
    pub fn get_by_id(&self, id: &str) -> Result<Document> {
        let row = self
            .store
            .fetch_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("document {}", id)))?;

        let rebuilt = reconstruct(row);
        if let Some(reason) = &rebuilt.metadata_error {
            warn!("Row {} has malformed metadata: {}", id, reason);
        }
        Ok(rebuilt.document)
    }

    /// Chunk and store one document. Returns the chunks written.
    pub fn ingest(&self, document: Document) -> Result<Vec<Document>> {
        self.ingest_many(std::slice::from_ref(&document))
    }

    /// Chunk and store documents. Returns the chunks written, with their ids.
    pub fn ingest_many(&self, documents: &[Document]) -> Result<Vec<Document>> {
        let chunks = self
            .chunker
            .chunk(documents)
            .map_err(|e| Error::ingestion("chunk documents", e))?;

        self.store
            .add(&chunks)
            .map_err(|e| Error::ingestion(format!("write {} chunks", chunks.len()), e))?;

        info!(
            "Ingested {} documents as {} chunks",
            documents.len(),
            chunks.len()
        );
        Ok(chunks)
    }

    /// Extract documents from a binary resource, sanitize them, then ingest.
    pub fn ingest_from_reader(&self, bytes: &[u8], kind: ReaderKind) -> Result<Vec<Document>> {
        let reader = reader_for(kind, self.pdf_pages_per_document);
        let raw = reader.read(bytes).map_err(|e| match e {
            Error::Ingestion { .. } => e,
            other => Error::ingestion(format!("read {:?} resource", kind), other),
        })?;

        let mut documents = Vec::with_capacity(raw.len());
        for (index, part) in raw.into_iter().enumerate() {
            let extracted = part.text.as_deref();
            let text = sanitize(extracted).ok_or_else(|| {
                Error::ingestion(
                    "sanitize extracted text",
                    format!("part {} of {:?} resource has no text", index + 1, kind),
                )
            })?;
            if !kind.requires_sanitize() && extracted != Some(text.as_str()) {
                debug!("Normalized whitespace in part {} of {:?} resource", index + 1, kind);
            }
            documents.push(Document::with_metadata(text, part.metadata));
        }

        debug!("{:?} reader produced {} documents", kind, documents.len());
        self.ingest_many(&documents)
    }

    /// Replace everything stored under `id` with `document`, unchunked.
    ///
    /// Goes through [`SearchStore::replace`], which is a single transaction on
    /// stores that support one.
    pub fn replace(&self, id: &str, mut document: Document) -> Result<Document> {
        document.set_id(id);
        let removed = self
            .store
            .replace(&MetadataFilter::id(id), std::slice::from_ref(&document))
            .map_err(|e| Error::ingestion(format!("replace document {}", id), e))?;

        if removed == 0 {
            debug!("Replace of {} found no previous entries", id);
        }
        info!("Replaced document {} ({} previous entries)", id, removed);
        Ok(document)
    }

    /// Remove all chunks stored under `id`. Returns how many were removed.
    pub fn delete(&self, id: &str) -> Result<usize> {
        let removed = self
            .store
            .delete(&MetadataFilter::id(id))
            .map_err(|e| Error::ingestion(format!("delete document {}", id), e))?;
        info!("Deleted {} entries for document {}", removed, id);
        Ok(removed)
    }
}
