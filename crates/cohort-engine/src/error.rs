use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The table lacks the identifying column; the caller must skip and log
    /// such tables rather than hand them to the engine.
    #[error("table '{table}' lacks primary key column '{key}'")]
    MissingPrimaryKey { table: String, key: String },
    #[error(transparent)]
    Model(#[from] cohort_model::ModelError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
