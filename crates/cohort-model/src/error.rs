use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("duplicate column: {name}")]
    DuplicateColumn { name: String },
    #[error("column {column} has {actual} cells, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("unknown column: {name}")]
    UnknownColumn { name: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
