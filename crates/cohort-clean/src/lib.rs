#![deny(unsafe_code)]

//! Value-level cleaning transforms.
//!
//! These run on per-source tables or on consolidated output; the
//! consolidation engine neither requires nor assumes they have run. Every
//! transform takes an owned table and returns a fresh one.

pub mod error;
pub mod medications;
pub mod scores;
pub mod visits;
pub mod vitals;

pub use error::{CleanError, Result};
pub use medications::{
    IndicationMap, clean_concomitant_meds, clean_ledd_meds, parse_month_year,
};
pub use scores::{
    DEFAULT_UNCERTAIN, clean_parkinsonism_features, clean_physical_exam, recode_uncertain,
};
pub use visits::visit_month;
pub use vitals::{BloodPressureBand, blood_pressure_band, clean_vital_signs};
