//! Medical-history loading.
//!
//! These extracts record events multiple times per visit (adverse event
//! logs) or on their own timeline (medication date ranges), so they are never
//! cross-merged: each recognized prefix becomes its own table.

use std::path::Path;

use cohort_clean::{
    DEFAULT_UNCERTAIN, IndicationMap, clean_concomitant_meds, clean_ledd_meds,
    clean_parkinsonism_features, clean_physical_exam, clean_vital_signs,
};
use cohort_ingest::{files_matching_prefixes, list_csv_files_recursive, read_csv_table};
use cohort_model::{KeySpec, Table};
use tracing::{debug, warn};

use crate::error::Result;
use crate::loader::stack_tables;

/// Medical-history tables keyed by prefix, in configured prefix order.
#[derive(Debug, Clone, Default)]
pub struct MedicalHistoryLoad {
    pub tables: Vec<(String, Table)>,
    pub files_loaded: usize,
    pub files_skipped: usize,
}

/// Load each recognized medical-history extract as a separate table.
///
/// Multiple files sharing a prefix are stacked on their column union. No
/// per-key aggregation happens here; multiple rows per visit are the point
/// of these tables.
pub fn load_medical_history(
    folder: &Path,
    prefixes: &[String],
    keys: &KeySpec,
) -> Result<MedicalHistoryLoad> {
    let mut load = MedicalHistoryLoad::default();
    if !folder.is_dir() {
        warn!(folder = %folder.display(), "medical history directory not found");
        return Ok(load);
    }
    let files = list_csv_files_recursive(folder)?;
    for prefix in prefixes {
        let matched = files_matching_prefixes(&files, std::slice::from_ref(prefix));
        if matched.is_empty() {
            debug!(prefix = %prefix, "no csv file found for prefix");
            continue;
        }
        let mut tables = Vec::new();
        for path in matched {
            match read_csv_table(&path) {
                Ok(table) => {
                    load.files_loaded += 1;
                    tables.push(table);
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "could not read file; skipping");
                    load.files_skipped += 1;
                }
            }
        }
        if tables.is_empty() {
            continue;
        }
        let table = if tables.len() == 1 {
            let mut only = tables.remove(0);
            only.name = prefix.clone();
            only
        } else {
            stack_tables(prefix, &tables)?
        };
        if !table.has_column(&keys.primary) {
            warn!(prefix = %prefix, key = %keys.primary, "table lacks the primary key column");
        }
        load.tables.push((prefix.clone(), table));
    }
    if load.tables.is_empty() {
        warn!("no matching medical history CSV files were loaded");
    }
    Ok(load)
}

/// Apply the value-level cleaning transforms with a known home in the
/// medical-history tables. A table that lacks a transform's columns is kept
/// unchanged and logged.
pub fn clean_medical_history(tables: Vec<(String, Table)>) -> Vec<(String, Table)> {
    let indications = IndicationMap::default();
    tables
        .into_iter()
        .map(|(name, table)| {
            let cleaned = match name.as_str() {
                "LEDD_Concomitant_Medication" => clean_ledd_meds(table.clone()),
                "Concomitant_Medication" => clean_concomitant_meds(table.clone(), &indications),
                "Vital_Signs" => clean_vital_signs(table.clone()),
                "Features_of_Parkinsonism" => {
                    clean_parkinsonism_features(table.clone(), DEFAULT_UNCERTAIN)
                }
                "General_Physical_Exam" => clean_physical_exam(table.clone(), DEFAULT_UNCERTAIN),
                _ => return (name, table),
            };
            match cleaned {
                Ok(cleaned) => (name, cleaned),
                Err(error) => {
                    warn!(table = %name, %error, "cleaning skipped");
                    (name, table)
                }
            }
        })
        .collect()
}
