//! Error type shared by the collaborators around the engine.
//!
//! The aggregation engine itself never fails: empty or zero inputs resolve to
//! zero-valued outputs. Only I/O, decoding and configuration surface here.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// File system errors, tagged with the path that was touched
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Tabular source could not be decoded
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Stored snapshot could not be encoded or decoded
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Config file is not valid TOML for [`crate::config::EngineConfig`]
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config parsed but failed validation
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Ingestion produced no usable rows
    #[error("no valid rows found ({dropped} dropped); check the column headers")]
    EmptyDataset { dropped: usize },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
