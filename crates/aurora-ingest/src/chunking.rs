//! Token-bounded chunking.
//!
//! The [`Splitter`] cuts documents into pieces that fit a token budget; the
//! [`Chunker`] runs it and makes sure every piece leaves with an identifier.
//! Chunks are flat: besides the optional `source_id` tag there is no link
//! back to the document they were cut from.

use std::sync::Arc;

use serde_json::Value;
use text_splitter::{ChunkConfig, TextSplitter};
use tiktoken_rs::CoreBPE;
use tracing::debug;
use uuid::Uuid;

use aurora_core::{ChunkSettings, Error, Result};
use aurora_store::{Document, SOURCE_ID_KEY};

/// Splits documents into smaller documents without dropping content.
pub trait Splitter: Send + Sync {
    /// Output keeps input order; each piece copies its source's metadata.
    fn split(&self, documents: &[Document]) -> Result<Vec<Document>>;
}

/// Splitter bounded by `cl100k_base` token counts.
pub struct TokenSplitter {
    inner: TextSplitter<CoreBPE>,
}

impl TokenSplitter {
    pub fn new(max_tokens: usize, overlap: usize) -> Result<Self> {
        let tokenizer = tiktoken_rs::cl100k_base()
            .map_err(|e| Error::Config(format!("tokenizer unavailable: {}", e)))?;
        let config = ChunkConfig::new(max_tokens)
            .with_sizer(tokenizer)
            .with_trim(true)
            .with_overlap(overlap)
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            inner: TextSplitter::new(config),
        })
    }

    pub fn from_settings(settings: &ChunkSettings) -> Result<Self> {
        Self::new(settings.max_tokens, settings.overlap)
    }
}

impl Splitter for TokenSplitter {
    fn split(&self, documents: &[Document]) -> Result<Vec<Document>> {
        let mut pieces = Vec::new();
        for doc in documents {
            for text in self.inner.chunks(&doc.content) {
                pieces.push(Document::with_metadata(text, doc.metadata.clone()));
            }
        }
        Ok(pieces)
    }
}

/// Runs a [`Splitter`] and assigns ids to the chunks that lack one.
#[derive(Clone)]
pub struct Chunker {
    splitter: Arc<dyn Splitter>,
    track_source: bool,
}

impl Chunker {
    pub fn new(splitter: Arc<dyn Splitter>) -> Self {
        Self {
            splitter,
            track_source: true,
        }
    }

    /// Build the default token splitter from settings.
    pub fn from_settings(settings: &ChunkSettings) -> Result<Self> {
        let splitter = TokenSplitter::from_settings(settings)?;
        Ok(Self::new(Arc::new(splitter)).with_source_tracking(settings.track_source))
    }

    /// Tag every chunk with `source_id`, the id of the document it came from.
    pub fn with_source_tracking(mut self, enabled: bool) -> Self {
        self.track_source = enabled;
        self
    }

    /// Split `documents` and make sure every chunk has `metadata["id"]`.
    ///
    /// Chunks that already carry an id (copied from an identified source) keep it.
    pub fn chunk(&self, documents: &[Document]) -> Result<Vec<Document>> {
        let mut chunks = Vec::new();

        for doc in documents {
            let source_id = self
                .track_source
                .then(|| doc.id().map(str::to_string).unwrap_or_else(new_id));

            let mut pieces = self.splitter.split(std::slice::from_ref(doc))?;
            for piece in &mut pieces {
                if piece.id().is_none() {
                    piece.set_id(new_id());
                }
                if let Some(source_id) = &source_id {
                    piece
                        .metadata
                        .entry(SOURCE_ID_KEY)
                        .or_insert_with(|| Value::String(source_id.clone()));
                }
            }
            chunks.extend(pieces);
        }

        debug!("Chunked {} documents into {} chunks", documents.len(), chunks.len());
        Ok(chunks)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Splits on blank lines, one piece per paragraph.
    struct ParagraphSplitter;

    impl Splitter for ParagraphSplitter {
        fn split(&self, documents: &[Document]) -> Result<Vec<Document>> {
            Ok(documents
                .iter()
                .flat_map(|doc| {
                    doc.content
                        .split("\n\n")
                        .filter(|p| !p.trim().is_empty())
                        .map(|p| Document::with_metadata(p.trim(), doc.metadata.clone()))
                        .collect::<Vec<_>>()
                })
                .collect())
        }
    }

    fn paragraph_chunker() -> Chunker {
        Chunker::new(Arc::new(ParagraphSplitter))
    }

    #[test]
    fn test_existing_id_is_kept() {
        let mut doc = Document::new("one\n\ntwo");
        doc.set_id("fixed");
        let chunks = paragraph_chunker().chunk(&[doc]).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.id() == Some("fixed")));
        assert!(chunks.iter().all(|c| c.source_id() == Some("fixed")));
    }

    #[test]
    fn test_missing_id_is_generated_and_unique() {
        let chunker = paragraph_chunker();
        let first = chunker.chunk(&[Document::new("a\n\nb\n\nc")]).unwrap();
        let second = chunker.chunk(&[Document::new("a\n\nb\n\nc")]).unwrap();

        let ids: HashSet<_> = first
            .iter()
            .chain(second.iter())
            .map(|c| c.id().unwrap().to_string())
            .collect();
        assert_eq!(ids.len(), 6);
        assert!(ids.iter().all(|id| !id.is_empty()));
    }

    #[test]
    fn test_source_id_groups_chunks_of_one_document() {
        let chunks = paragraph_chunker()
            .chunk(&[Document::new("a\n\nb"), Document::new("c")])
            .unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].source_id(), chunks[1].source_id());
        assert_ne!(chunks[0].source_id(), chunks[2].source_id());
        assert_eq!(chunks[2].content, "c");
    }

    #[test]
    fn test_source_tracking_can_be_disabled() {
        let chunks = paragraph_chunker()
            .with_source_tracking(false)
            .chunk(&[Document::new("a")])
            .unwrap();
        assert_eq!(chunks[0].source_id(), None);
        assert!(chunks[0].id().is_some());
    }

    #[test]
    fn test_input_is_not_mutated() {
        let input = vec![Document::new("a\n\nb")];
        let before = input.clone();
        paragraph_chunker().chunk(&input).unwrap();
        assert_eq!(input, before);
    }

    #[test]
    fn test_empty_input() {
        assert!(paragraph_chunker().chunk(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_token_splitter_short_text_is_one_chunk() {
        let splitter = TokenSplitter::new(800, 0).unwrap();
        let pieces = splitter.split(&[Document::new("hello world")]).unwrap();
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].content, "hello world");
    }

    #[test]
    fn test_token_splitter_covers_long_text() {
        let text = (0..300)
            .map(|i| format!("word{} sentence part {}.", i, i % 7))
            .collect::<Vec<_>>()
            .join(" ");
        let mut doc = Document::new(text.clone());
        doc.metadata.insert("title".into(), "long".into());

        let chunker = Chunker::new(Arc::new(TokenSplitter::new(32, 0).unwrap()));
        let chunks = chunker.chunk(&[doc]).unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.metadata["title"] == "long"));

        // Trimming at boundaries may drop whitespace, never anything else.
        let joined: String = chunks
            .iter()
            .flat_map(|c| c.content.split_whitespace())
            .collect();
        assert_eq!(joined, text.split_whitespace().collect::<String>());
    }

    #[test]
    fn test_token_splitter_rejects_bad_overlap() {
        assert!(TokenSplitter::new(10, 20).is_err());
    }

    #[test]
    fn test_blank_document_has_no_chunks() {
        let splitter = TokenSplitter::new(100, 0).unwrap();
        assert!(splitter.split(&[Document::new("   ")]).unwrap().is_empty());
    }
}
