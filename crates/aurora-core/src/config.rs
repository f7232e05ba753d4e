//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default token bound for one chunk.
pub const DEFAULT_CHUNK_TOKENS: usize = 800;
/// Default file extension picked up by the bootstrap loader.
pub const DEFAULT_BOOTSTRAP_EXTENSION: &str = "md";

/// Paths to all Aurora data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Chunk store directory (`data/vectordb/`).
    pub vectordb: PathBuf,
    /// Seed documents read by the bootstrap loader (`data/documents/`).
    pub documents: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates the store directory if needed.
    ///
    /// The documents directory is only read, so it is not created here: a missing
    /// directory simply means there is nothing to seed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            vectordb: root.join("vectordb"),
            documents: root.join("documents"),
            root,
        };
        std::fs::create_dir_all(&paths.vectordb)?;
        Ok(paths)
    }

    pub fn with_documents(mut self, documents: impl Into<PathBuf>) -> Self {
        self.documents = documents.into();
        self
    }
}

/// Splitter settings, expressed in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSettings {
    /// Upper bound of tokens per chunk.
    pub max_tokens: usize,
    /// Tokens shared between neighbouring chunks.
    pub overlap: usize,
    /// Tag every chunk with the id of the document it was cut from.
    pub track_source: bool,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_CHUNK_TOKENS,
            overlap: 0,
            track_source: true,
        }
    }
}

/// Top-level Aurora configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuroraConfig {
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Extension (without the dot) of files seeded at startup.
    pub bootstrap_extension: String,
    pub chunking: ChunkSettings,
    /// Consecutive PDF pages merged into one raw document.
    pub pdf_pages_per_document: usize,
}

impl AuroraConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> crate::Result<Self> {
        let mut data_paths = DataPaths::new(data_dir)?;
        if let Ok(dir) = std::env::var("AURORA_DOCUMENTS_DIR") {
            data_paths = data_paths.with_documents(dir);
        }

        let bootstrap_extension = std::env::var("AURORA_BOOTSTRAP_EXT")
            .map(|ext| ext.trim_start_matches('.').to_string())
            .unwrap_or_else(|_| DEFAULT_BOOTSTRAP_EXTENSION.to_string());

        let defaults = ChunkSettings::default();
        let chunking = ChunkSettings {
            max_tokens: env_usize("AURORA_CHUNK_TOKENS")?.unwrap_or(defaults.max_tokens),
            overlap: env_usize("AURORA_CHUNK_OVERLAP")?.unwrap_or(defaults.overlap),
            track_source: defaults.track_source,
        };
        if chunking.max_tokens == 0 || chunking.overlap >= chunking.max_tokens {
            return Err(crate::Error::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunking.overlap, chunking.max_tokens
            )));
        }

        let pdf_pages_per_document = env_usize("AURORA_PDF_PAGES_PER_DOCUMENT")?
            .unwrap_or(1)
            .max(1);

        let config = Self {
            data_paths,
            bootstrap_extension,
            chunking,
            pdf_pages_per_document,
        };
        tracing::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }
}

fn env_usize(key: &str) -> crate::Result<Option<usize>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| crate::Error::Config(format!("{key} must be a positive integer, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}
