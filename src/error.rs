//! Error types for the ingestion, engine and chart layers

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid path pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to list input files: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("engine error: {0}")]
    Engine(#[from] sqlx::Error),

    #[error("ingest task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
