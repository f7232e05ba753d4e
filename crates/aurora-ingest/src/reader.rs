//! Format readers: binary resource → ordered raw documents.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use aurora_core::{Error, Result};
use aurora_store::Metadata;
use docx_rs::{DocumentChild, ParagraphChild, RunChild, TableCellContent, TableChild, TableRowChild};

/// Text pulled out of a resource, before sanitizing.
///
/// `text` is `None` when the reader could not extract anything for this part
/// (e.g. a PDF page with an unsupported font encoding).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawDocument {
    pub text: Option<String>,
    pub metadata: Metadata,
}

impl RawDocument {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            metadata: Metadata::new(),
        }
    }
}

/// Turns a binary resource into an ordered list of raw documents.
pub trait DocumentReader: Send + Sync {
    fn read(&self, bytes: &[u8]) -> Result<Vec<RawDocument>>;
}

/// Which reader handles a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderKind {
    Pdf,
    /// DOCX and other Office Open XML word documents.
    Office,
    /// Markdown and plain text.
    Text,
}

impl ReaderKind {
    /// Detect reader from a file extension. Unknown extensions are read as text.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" | "doc" | "docm" | "dotx" => Self::Office,
            _ => Self::Text,
        }
    }

    pub fn for_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }

    /// Whether extracted text must be sanitized before chunking.
    pub fn requires_sanitize(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

/// Page-by-page PDF reader.
pub struct PdfReader {
    pages_per_document: usize,
}

impl PdfReader {
    pub fn new(pages_per_document: usize) -> Self {
        Self {
            pages_per_document: pages_per_document.max(1),
        }
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new(1)
    }
}

impl DocumentReader for PdfReader {
    fn read(&self, bytes: &[u8]) -> Result<Vec<RawDocument>> {
        let pdf = lopdf::Document::load_mem(bytes)
            .map_err(|e| Error::ingestion("load pdf", e.to_string()))?;
        let page_numbers: Vec<u32> = pdf.get_pages().keys().copied().collect();
        debug!("PDF has {} pages", page_numbers.len());

        let mut documents = Vec::new();
        for group in page_numbers.chunks(self.pages_per_document) {
            let first = group[0];
            let last = group[group.len() - 1];
            let text = match pdf.extract_text(group) {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("No text extracted from PDF pages {}-{}: {}", first, last, e);
                    None
                }
            };

            let mut metadata = Metadata::new();
            metadata.insert("page_number".into(), Value::from(first));
            metadata.insert("end_page_number".into(), Value::from(last));
            documents.push(RawDocument { text, metadata });
        }
        Ok(documents)
    }
}

/// DOCX reader. Body paragraphs, hyperlinks and table cells in document
/// order; one document per file.
#[derive(Default)]
pub struct OfficeReader;

impl DocumentReader for OfficeReader {
    fn read(&self, bytes: &[u8]) -> Result<Vec<RawDocument>> {
        let docx = docx_rs::read_docx(bytes)
            .map_err(|e| Error::ingestion("read office document", e.to_string()))?;

        let mut content = String::new();
        for child in &docx.document.children {
            match child {
                DocumentChild::Paragraph(p) => push_paragraph(&mut content, p),
                DocumentChild::Table(t) => push_table(&mut content, t),
                _ => {}
            }
        }

        Ok(vec![RawDocument::text(content)])
    }
}

fn push_paragraph(out: &mut String, paragraph: &docx_rs::Paragraph) {
    push_paragraph_children(out, &paragraph.children);
    out.push('\n');
}

fn push_paragraph_children(out: &mut String, children: &[ParagraphChild]) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for child in &run.children {
                    match child {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_paragraph_children(out, &link.children),
            _ => {}
        }
    }
}

fn push_table(out: &mut String, table: &docx_rs::Table) {
    for TableChild::TableRow(row) in &table.rows {
        for TableRowChild::TableCell(cell) in &row.cells {
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(p) => push_paragraph(out, p),
                    TableCellContent::Table(t) => push_table(out, t),
                    _ => {}
                }
            }
        }
    }
}

/// UTF-8 text and markdown reader; one document per file.
#[derive(Default)]
pub struct TextReader;

impl DocumentReader for TextReader {
    fn read(&self, bytes: &[u8]) -> Result<Vec<RawDocument>> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::ingestion("decode text as UTF-8", e))?;
        Ok(vec![RawDocument::text(text)])
    }
}

/// The reader for `kind`.
pub fn reader_for(kind: ReaderKind, pdf_pages_per_document: usize) -> Box<dyn DocumentReader> {
    match kind {
        ReaderKind::Pdf => Box::new(PdfReader::new(pdf_pages_per_document)),
        ReaderKind::Office => Box::new(OfficeReader),
        ReaderKind::Text => Box::new(TextReader),
    }
}
