use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanError {
    /// The transform's required column is absent; the caller should keep the
    /// table as-is and log.
    #[error("table '{table}' lacks column '{column}' required by {transform}")]
    MissingColumn {
        table: String,
        column: String,
        transform: &'static str,
    },
    #[error("failed to parse indication mapping: {0}")]
    MappingParse(#[from] serde_json::Error),
    #[error(transparent)]
    Model(#[from] cohort_model::ModelError),
}

pub type Result<T> = std::result::Result<T, CleanError>;
