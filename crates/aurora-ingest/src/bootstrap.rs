//! One-shot startup seeding from a directory of text files.
//!
//! Runs before anything else touches the store. When the store already holds
//! rows nothing is written, so running it on every start is safe.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::ingest::Ingester;
use aurora_core::{Error, Result};
use aurora_store::{Document, RowSource, SearchStore};

/// What a bootstrap run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The store was not empty; nothing was read or written.
    Skipped { existing_rows: i64 },
    /// The store was empty and these files were ingested.
    Seeded { files: usize, chunk_ids: Vec<String> },
}

/// Seeds an empty store from `dir`, one document per file ending in `.{extension}`.
pub struct BootstrapLoader {
    dir: PathBuf,
    extension: String,
}

impl BootstrapLoader {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// Run the loader. Any directory or file read failure is an [`Error::Bootstrap`];
    /// callers are expected to abort startup on error.
    pub fn run<S>(&self, ingester: &Ingester<'_, S>) -> Result<BootstrapOutcome>
    where
        S: SearchStore + RowSource,
    {
        let existing_rows = ingester.store().count_rows()?;
        if existing_rows > 0 {
            info!("Documents already loaded ({} rows), skipping bootstrap", existing_rows);
            return Ok(BootstrapOutcome::Skipped { existing_rows });
        }

        let files = self.seed_files()?;
        let mut documents = Vec::with_capacity(files.len());
        for path in &files {
            let content = std::fs::read_to_string(path).map_err(|source| Error::Bootstrap {
                path: path.clone(),
                source,
            })?;
            documents.push(Document::new(content));
        }

        let chunks = ingester.ingest_many(&documents)?;
        let chunk_ids: Vec<String> = chunks
            .iter()
            .filter_map(|c| c.id().map(str::to_string))
            .collect();
        info!(
            "Bootstrap loaded {} files from {} as {} chunks: {:?}",
            files.len(),
            self.dir.display(),
            chunk_ids.len(),
            chunk_ids
        );

        Ok(BootstrapOutcome::Seeded {
            files: files.len(),
            chunk_ids,
        })
    }

    /// Matching files in name order. A missing directory yields no files.
    fn seed_files(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            info!("Bootstrap directory {} does not exist", self.dir.display());
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|source| self.dir_error(source))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|source| self.dir_error(source))?.path();
            if path.is_file() && has_extension(&path, &self.extension) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn dir_error(&self, source: std::io::Error) -> Error {
        Error::Bootstrap {
            path: self.dir.clone(),
            source,
        }
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}
