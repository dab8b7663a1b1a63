#![deny(unsafe_code)]

//! CSV discovery and ingestion.
//!
//! Finds source extracts under a study folder by filename prefix and parses
//! them into [`cohort_model::Table`]s. All cells are ingested as trimmed text
//! (blank cells become `Null`); identifier columns are never numerically
//! parsed, so values like `"0070"` keep their formatting.

pub mod csv_table;
pub mod discovery;
pub mod error;

pub use csv_table::{read_csv_table, write_csv};
pub use discovery::{files_matching_prefixes, list_csv_files_recursive};
pub use error::{IngestError, Result};
