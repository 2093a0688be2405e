use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    /// One or more index artifacts are missing.
    #[error("index not found at {path}: run the indexer first")]
    IndexNotFound { path: PathBuf },

    /// The corpus produced no documents or no chunks.
    #[error("no ingestible documents or chunks under {path}")]
    EmptyCorpus { path: PathBuf },

    /// Artifacts exist but disagree with each other.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// The corpus does not fit the persisted matrix header.
    #[error("index too large: {rows} chunks x {cols} terms")]
    TooLarge { rows: usize, cols: usize },

    /// A broken invariant while answering a query.
    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, RagError>;
