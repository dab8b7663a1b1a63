#![deny(unsafe_code)]

//! Modality loading and study-wide consolidation.
//!
//! Orchestrates the pipeline per data modality: discover source extracts by
//! filename prefix, parse them, skip anything without the patient identifier,
//! consolidate into one table per modality with the engine, and optionally
//! fold every modality onto a universal key index for a single merged output.

pub mod biospecimen;
pub mod config;
pub mod error;
pub mod loader;
pub mod medical_history;
pub mod study;

pub use biospecimen::{load_biospecimen, pivot_wide};
pub use config::{
    BiospecimenConfig, Modality, ModalityConfig, PivotConfig, SourceConfig, StudyConfig,
    load_config,
};
pub use error::{CoreError, Result};
pub use loader::{ModalityLoad, load_modality, prefix_columns, stack_tables};
pub use medical_history::{MedicalHistoryLoad, clean_medical_history, load_medical_history};
pub use study::{LoadOptions, ModalitySummary, StudyLoad, load_study, merge_study};
