//! Study-wide loading and the single merged output.

use std::path::Path;

use cohort_engine::{JoinKind, key_index, merge_with};
use cohort_model::{KeySpec, Table};
use tracing::{info, warn};

use crate::biospecimen::load_biospecimen;
use crate::config::{Modality, StudyConfig};
use crate::error::Result;
use crate::loader::load_modality;
use crate::medical_history::{clean_medical_history, load_medical_history};

/// What to load and how.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Modalities to load, in order. Order fixes the merge order of the
    /// combined output and therefore the encounter order of conflict tokens.
    pub modalities: Vec<Modality>,
    /// Apply value-level cleaning transforms where defined.
    pub clean: bool,
    /// Biospecimen sources to load exclusively (wins over `exclude`).
    pub biospec_include: Vec<String>,
    /// Biospecimen sources to drop.
    pub biospec_exclude: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            modalities: Modality::ALL.to_vec(),
            clean: true,
            biospec_include: Vec::new(),
            biospec_exclude: Vec::new(),
        }
    }
}

/// Per-table load statistics for the run summary.
#[derive(Debug, Clone)]
pub struct ModalitySummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub files_loaded: usize,
    pub files_skipped: usize,
}

/// Everything loaded from a study folder.
#[derive(Debug, Clone, Default)]
pub struct StudyLoad {
    /// One consolidated table per standard modality, in load order.
    pub tables: Vec<(String, Table)>,
    /// Medical-history tables, kept separate, in prefix order.
    pub medical_history: Vec<(String, Table)>,
    pub summaries: Vec<ModalitySummary>,
    pub keys: KeySpec,
}

/// Load the requested modalities from `data_dir`.
pub fn load_study(
    data_dir: &Path,
    config: &StudyConfig,
    options: &LoadOptions,
) -> Result<StudyLoad> {
    let keys = config.keys.clone();
    let mut load = StudyLoad {
        keys: keys.clone(),
        ..StudyLoad::default()
    };
    for modality in &options.modalities {
        info!(modality = %modality, "loading modality");
        match modality {
            Modality::MedicalHistory => {
                let folder = data_dir.join(&config.medical_history.folder);
                let history =
                    load_medical_history(&folder, &config.medical_history.prefixes, &keys)?;
                let tables = if options.clean {
                    clean_medical_history(history.tables)
                } else {
                    history.tables
                };
                load.summaries.push(ModalitySummary {
                    name: modality.name().to_string(),
                    rows: tables.iter().map(|(_, t)| t.height()).sum(),
                    columns: tables.iter().map(|(_, t)| t.width()).max().unwrap_or(0),
                    files_loaded: history.files_loaded,
                    files_skipped: history.files_skipped,
                });
                for (name, table) in &tables {
                    load.summaries.push(ModalitySummary {
                        name: format!("{modality}:{name}"),
                        rows: table.height(),
                        columns: table.width(),
                        files_loaded: 0,
                        files_skipped: 0,
                    });
                }
                load.medical_history = tables;
            }
            Modality::Biospecimen => {
                let folder = data_dir.join(&config.biospecimen.folder);
                let loaded = load_biospecimen(
                    &folder,
                    &config.biospecimen,
                    &keys,
                    &options.biospec_include,
                    &options.biospec_exclude,
                )?;
                load.summaries.push(ModalitySummary {
                    name: modality.name().to_string(),
                    rows: loaded.table.height(),
                    columns: loaded.table.width(),
                    files_loaded: loaded.files_loaded,
                    files_skipped: loaded.files_skipped,
                });
                load.tables.push((modality.name().to_string(), loaded.table));
            }
            standard => {
                let Some(modality_config) = config.modality(*standard) else {
                    continue;
                };
                let folder = data_dir.join(&modality_config.folder);
                let loaded = load_modality(
                    standard.name(),
                    &folder,
                    &modality_config.prefixes,
                    &keys,
                )?;
                load.summaries.push(ModalitySummary {
                    name: standard.name().to_string(),
                    rows: loaded.table.height(),
                    columns: loaded.table.width(),
                    files_loaded: loaded.files_loaded,
                    files_skipped: loaded.files_skipped,
                });
                load.tables.push((standard.name().to_string(), loaded.table));
            }
        }
    }
    Ok(load)
}

/// Rename non-key columns already present in the accumulator, prefixing them
/// with the contributing table's label so provenance survives the merge.
fn rename_duplicate_columns(table: Table, acc: &Table, keys: &KeySpec, label: &str) -> Result<Table> {
    let duplicates: Vec<String> = table
        .column_names()
        .into_iter()
        .filter(|name| acc.has_column(name) && !keys.is_key(name))
        .map(str::to_string)
        .collect();
    let mut renamed = table;
    for name in duplicates {
        let mut candidate = format!("{label}_{name}");
        let mut counter = 0usize;
        while renamed.has_column(&candidate) || acc.has_column(&candidate) {
            counter += 1;
            candidate = format!("{label}_{name}{counter}");
        }
        renamed.rename_column(&name, candidate)?;
    }
    Ok(renamed)
}

/// Merge every loaded table into one visit-level table.
///
/// Builds the universal (primary, secondary) index across all loaded tables,
/// then left-joins each modality table and each medical-history table onto
/// it. Columns already present in the accumulator are renamed with their
/// table's label first, so nothing collides across modalities. Tables
/// without both key columns are skipped and logged.
pub fn merge_study(load: &StudyLoad) -> Result<Table> {
    let keys = &load.keys;
    let candidates: Vec<&Table> = load
        .tables
        .iter()
        .map(|(_, t)| t)
        .chain(load.medical_history.iter().map(|(_, t)| t))
        .collect();
    let keyed: Vec<Table> = candidates
        .iter()
        .filter(|t| t.has_column(&keys.primary) && t.has_column(&keys.secondary))
        .map(|t| (*t).clone())
        .collect();
    if keyed.is_empty() {
        warn!("no tables carry both key columns; merged output is empty");
        return Ok(Table::empty("merged"));
    }
    let mut acc = key_index(&keyed, keys, "merged");
    info!(pairs = acc.height(), "built study-wide key index");

    let labeled: Vec<(&String, &Table)> = load
        .tables
        .iter()
        .map(|(name, t)| (name, t))
        .chain(load.medical_history.iter().map(|(name, t)| (name, t)))
        .collect();
    for (label, table) in labeled {
        if table.is_empty() {
            continue;
        }
        if !table.has_column(&keys.primary) || !table.has_column(&keys.secondary) {
            warn!(
                table = %label,
                "skipping table without both key columns in merged output"
            );
            continue;
        }
        let prepared = rename_duplicate_columns(table.clone(), &acc, keys, label)?;
        acc = merge_with(acc, prepared, keys, JoinKind::Left)?;
        info!(table = %label, "merged into combined output");
    }
    acc.name = "merged".to_string();
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_model::Column;

    fn visit_table(name: &str, cols: Vec<(&str, Vec<&str>)>) -> Table {
        Table::from_columns(
            name,
            cols.into_iter()
                .map(|(col, cells)| Column::from_raw(col, &cells))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn merge_study_prefixes_duplicate_columns() {
        let motor = visit_table(
            "motor",
            vec![
                ("PATNO", vec!["1", "2"]),
                ("EVENT_ID", vec!["BL", "BL"]),
                ("PAG_NAME", vec!["NUPDRS3", "NUPDRS3"]),
                ("NP3TOT", vec!["22", "31"]),
            ],
        );
        let non_motor = visit_table(
            "non_motor",
            vec![
                ("PATNO", vec!["1"]),
                ("EVENT_ID", vec!["BL"]),
                ("PAG_NAME", vec!["MOCA"]),
                ("MCATOT", vec!["27"]),
            ],
        );
        let load = StudyLoad {
            tables: vec![
                ("motor_assessments".to_string(), motor),
                ("non_motor_assessments".to_string(), non_motor),
            ],
            medical_history: Vec::new(),
            summaries: Vec::new(),
            keys: KeySpec::default(),
        };
        let merged = merge_study(&load).unwrap();
        assert_eq!(merged.height(), 2);
        assert!(merged.has_column("PAG_NAME"));
        // The second table's clashing column was prefixed, not collided.
        assert!(merged.has_column("non_motor_assessments_PAG_NAME"));
        assert_eq!(merged.cell("NP3TOT", 0).render(), "22");
        assert_eq!(merged.cell("MCATOT", 0).render(), "27");
        assert_eq!(merged.cell("MCATOT", 1).render(), "");
    }

    #[test]
    fn merge_study_skips_static_tables() {
        let visits = visit_table(
            "motor",
            vec![
                ("PATNO", vec!["1"]),
                ("EVENT_ID", vec!["BL"]),
                ("NP3TOT", vec!["22"]),
            ],
        );
        let static_only = visit_table("family", vec![("PATNO", vec!["1"]), ("ANYFAM", vec!["1"])]);
        let load = StudyLoad {
            tables: vec![
                ("motor_assessments".to_string(), visits),
                ("family".to_string(), static_only),
            ],
            medical_history: Vec::new(),
            summaries: Vec::new(),
            keys: KeySpec::default(),
        };
        let merged = merge_study(&load).unwrap();
        assert_eq!(merged.height(), 1);
        assert!(!merged.has_column("ANYFAM"));
    }
}
