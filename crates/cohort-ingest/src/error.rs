use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read csv {path}: {source}")]
    CsvRead { path: PathBuf, source: csv::Error },
    #[error("failed to write csv {path}: {source}")]
    CsvWrite { path: PathBuf, source: csv::Error },
    #[error(transparent)]
    Model(#[from] cohort_model::ModelError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
