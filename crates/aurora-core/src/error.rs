//! Error types for Aurora.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed cause carried by [`Error::Ingestion`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Ingestion failed: {context}")]
    Ingestion {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("Bootstrap failed at {}: {source}", path.display())]
    Bootstrap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap any failure on the ingestion path together with what was being done.
    pub fn ingestion(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Ingestion {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_ingestion_keeps_cause() {
        let err = Error::ingestion("write chunks", Error::Database("disk full".into()));
        assert_eq!(err.to_string(), "Ingestion failed: write chunks");
        let cause = err.source().unwrap();
        assert_eq!(cause.to_string(), "Database error: disk full");
    }

    #[test]
    fn test_ingestion_from_message() {
        let err = Error::ingestion("read pdf", "page 3 produced no text");
        assert_eq!(err.source().unwrap().to_string(), "page 3 produced no text");
    }

    #[test]
    fn test_not_found_is_distinguishable() {
        assert!(Error::NotFound("abc".into()).is_not_found());
        assert!(!Error::Storage("abc".into()).is_not_found());
    }
}
