//! Aurora Core — error type and configuration shared by the ingestion crates.

pub mod config;
pub mod error;

pub use config::{AuroraConfig, ChunkSettings, DataPaths};
pub use error::{Error, Result};
