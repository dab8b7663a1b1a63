use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Engine(#[from] cohort_engine::EngineError),
    #[error(transparent)]
    Ingest(#[from] cohort_ingest::IngestError),
    #[error(transparent)]
    Model(#[from] cohort_model::ModelError),
    #[error(transparent)]
    Clean(#[from] cohort_clean::CleanError),
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
