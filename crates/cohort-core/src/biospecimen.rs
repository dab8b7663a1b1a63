//! Biospecimen loading.
//!
//! Biospecimen sources are large, heterogeneous, and independent; outer
//! joins across them would be memory-unbounded and their unrelated columns
//! share names. Each source is therefore prepared on its own (stacked,
//! pivoted or column-prefixed, aggregated) and then left-joined onto the
//! universal key index built from all sources.

use std::collections::HashMap;
use std::path::Path;

use cohort_engine::{aggregate, consolidate_onto_index, key_index};
use cohort_ingest::{files_matching_prefixes, list_csv_files_recursive, read_csv_table};
use cohort_model::{CellValue, Column, KeySpec, Table};
use tracing::{debug, info, warn};

use crate::config::{BiospecimenConfig, PivotConfig, SourceConfig};
use crate::error::Result;
use crate::loader::{ModalityLoad, prefix_columns, stack_tables};

/// Legacy name for the visit column in some assay extracts.
const CLINICAL_EVENT: &str = "CLINICAL_EVENT";

/// Pivot a long-format assay table (one row per test result) into a wide one
/// (one row per key tuple, one column per test).
///
/// The row index is (primary, secondary-if-present) plus any configured
/// carry columns that exist. Duplicate results for the same (key, test) keep
/// the first value. Test columns are prefixed with `column_prefix` and appear
/// in encounter order. A table missing the pivot columns yields an empty
/// table, logged.
pub fn pivot_wide(
    table: &Table,
    keys: &KeySpec,
    pivot: &PivotConfig,
    column_prefix: &str,
) -> Result<Table> {
    for required in [&keys.primary, &pivot.test_name, &pivot.test_value] {
        if !table.has_column(required) {
            warn!(
                table = %table.name,
                column = %required,
                "required pivot column not found"
            );
            return Ok(Table::empty(table.name.clone()));
        }
    }
    let mut index_cols: Vec<String> = vec![keys.primary.clone()];
    if table.has_column(&keys.secondary) {
        index_cols.push(keys.secondary.clone());
    }
    for carry in &pivot.carry {
        if table.has_column(carry) && !index_cols.contains(carry) {
            index_cols.push(carry.clone());
        }
    }

    let mut group_of: HashMap<Vec<String>, usize> = HashMap::new();
    let mut group_first_row: Vec<usize> = Vec::new();
    let mut test_order: Vec<String> = Vec::new();
    let mut test_values: HashMap<String, Vec<Option<CellValue>>> = HashMap::new();

    for row in 0..table.height() {
        let key: Vec<String> = index_cols
            .iter()
            .map(|c| table.cell(c, row).render().trim().to_string())
            .collect();
        let next = group_first_row.len();
        let group = *group_of.entry(key).or_insert_with(|| {
            group_first_row.push(row);
            next
        });
        let Some(test) = table.cell(&pivot.test_name, row).token() else {
            continue;
        };
        if !test_values.contains_key(&test) {
            test_order.push(test.clone());
        }
        let cells = test_values.entry(test).or_default();
        if cells.len() <= group {
            cells.resize(group + 1, None);
        }
        if cells[group].is_none() {
            cells[group] = Some(table.cell(&pivot.test_value, row));
        }
    }

    let groups = group_first_row.len();
    let mut columns: Vec<Column> = index_cols
        .iter()
        .map(|name| {
            let cells = group_first_row
                .iter()
                .map(|&row| table.cell(name, row))
                .collect();
            Column::new(name.clone(), cells)
        })
        .collect();
    for test in test_order {
        let values = &test_values[&test];
        let cells: Vec<CellValue> = (0..groups)
            .map(|g| values.get(g).cloned().flatten().unwrap_or(CellValue::Null))
            .collect();
        columns.push(Column::new(format!("{column_prefix}{test}"), cells));
    }
    Ok(Table::from_columns(table.name.clone(), columns)?)
}

fn prepare_source(
    source: &SourceConfig,
    files: &[std::path::PathBuf],
    keys: &KeySpec,
    load: &mut ModalityLoad,
) -> Result<Option<Table>> {
    let matched = files_matching_prefixes(files, std::slice::from_ref(&source.prefix));
    if matched.is_empty() {
        debug!(source = %source.name, prefix = %source.prefix, "no files found");
        return Ok(None);
    }
    let mut tables = Vec::new();
    for path in matched {
        let mut table = match read_csv_table(&path) {
            Ok(table) => table,
            Err(error) => {
                warn!(path = %path.display(), %error, "could not read file; skipping");
                load.files_skipped += 1;
                continue;
            }
        };
        if table.has_column(CLINICAL_EVENT) && !table.has_column(&keys.secondary) {
            table.rename_column(CLINICAL_EVENT, keys.secondary.clone())?;
        }
        if !table.has_column(&keys.primary) {
            warn!(
                path = %path.display(),
                key = %keys.primary,
                "file is missing the primary key column; skipping"
            );
            load.files_skipped += 1;
            continue;
        }
        load.files_loaded += 1;
        tables.push(table);
    }
    if tables.is_empty() {
        return Ok(None);
    }
    let stacked = if tables.len() == 1 {
        let mut only = tables.remove(0);
        only.name = source.name.clone();
        only
    } else {
        stack_tables(&source.name, &tables)?
    };
    let shaped = match &source.pivot {
        Some(pivot) => pivot_wide(&stacked, keys, pivot, &source.column_prefix)?,
        None => prefix_columns(stacked, &source.column_prefix, keys)?,
    };
    if shaped.is_empty() {
        return Ok(None);
    }
    let prepared = aggregate(shaped, keys)?;
    info!(
        source = %source.name,
        rows = prepared.height(),
        columns = prepared.width(),
        "prepared biospecimen source"
    );
    Ok(Some(prepared))
}

/// Filter sources by explicit include/exclude lists. Include wins when both
/// are given.
fn select_sources<'a>(
    config: &'a BiospecimenConfig,
    include: &[String],
    exclude: &[String],
) -> Vec<&'a SourceConfig> {
    if !include.is_empty() {
        let selected: Vec<&SourceConfig> = config
            .sources
            .iter()
            .filter(|s| include.contains(&s.name))
            .collect();
        for name in include {
            if !config.sources.iter().any(|s| &s.name == name) {
                warn!(source = %name, "requested source is not configured");
            }
        }
        selected
    } else if !exclude.is_empty() {
        info!(excluded = ?exclude, "excluding biospecimen sources");
        config
            .sources
            .iter()
            .filter(|s| !exclude.contains(&s.name))
            .collect()
    } else {
        config.sources.iter().collect()
    }
}

/// Load and consolidate the biospecimen modality.
///
/// Each selected source is prepared independently, then every source is
/// left-joined onto the key index built from all of them, bounding the final
/// row set to the known key tuples.
pub fn load_biospecimen(
    folder: &Path,
    config: &BiospecimenConfig,
    keys: &KeySpec,
    include: &[String],
    exclude: &[String],
) -> Result<ModalityLoad> {
    let mut load = ModalityLoad {
        table: Table::empty("biospecimen"),
        files_loaded: 0,
        files_skipped: 0,
    };
    if !folder.is_dir() {
        warn!(folder = %folder.display(), "biospecimen directory not found");
        return Ok(load);
    }
    let sources = select_sources(config, include, exclude);
    if sources.is_empty() {
        warn!("no biospecimen sources remain after include/exclude filtering");
        return Ok(load);
    }
    let files = list_csv_files_recursive(folder)?;
    let mut prepared = Vec::new();
    for source in sources {
        if let Some(table) = prepare_source(source, &files, keys, &mut load)? {
            prepared.push(table);
        }
    }
    if prepared.is_empty() {
        warn!("no biospecimen sources were successfully loaded");
        return Ok(load);
    }
    let index = key_index(&prepared, keys, "biospecimen");
    info!(pairs = index.height(), "built biospecimen key index");
    let mut table = consolidate_onto_index(index, prepared, keys)?;
    table.name = "biospecimen".to_string();
    load.table = table;
    Ok(load)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn pivots_long_assays_wide() {
        let keys = KeySpec::default();
        let table = Table::from_columns(
            "assays",
            vec![
                Column::from_raw("PATNO", &["1", "1", "1", "2"]),
                Column::from_raw("EVENT_ID", &["BL", "BL", "V01", "BL"]),
                Column::from_raw("SEX", &["M", "M", "M", "F"]),
                Column::from_raw("TESTNAME", &["ABeta 1-42", "tTau", "ABeta 1-42", "tTau"]),
                Column::from_raw("TESTVALUE", &["620", "45", "598", "52"]),
            ],
        )
        .unwrap();
        let pivot = PivotConfig {
            test_name: "TESTNAME".to_string(),
            test_value: "TESTVALUE".to_string(),
            carry: vec!["SEX".to_string(), "COHORT".to_string()],
        };
        let wide = pivot_wide(&table, &keys, &pivot, "BIO_").unwrap();
        assert_eq!(wide.height(), 3);
        assert_eq!(
            wide.column_names(),
            vec!["PATNO", "EVENT_ID", "SEX", "BIO_ABeta 1-42", "BIO_tTau"]
        );
        assert_eq!(wide.cell("BIO_ABeta 1-42", 0).render(), "620");
        assert_eq!(wide.cell("BIO_tTau", 0).render(), "45");
        assert_eq!(wide.cell("BIO_tTau", 1), CellValue::Null);
        assert_eq!(wide.cell("BIO_tTau", 2).render(), "52");
    }

    #[test]
    fn pivot_keeps_first_duplicate_result() {
        let keys = KeySpec::default();
        let table = Table::from_columns(
            "assays",
            vec![
                Column::from_raw("PATNO", &["1", "1"]),
                Column::from_raw("EVENT_ID", &["BL", "BL"]),
                Column::from_raw("TESTNAME", &["tTau", "tTau"]),
                Column::from_raw("TESTVALUE", &["45", "47"]),
            ],
        )
        .unwrap();
        let pivot = PivotConfig {
            test_name: "TESTNAME".to_string(),
            test_value: "TESTVALUE".to_string(),
            carry: Vec::new(),
        };
        let wide = pivot_wide(&table, &keys, &pivot, "BIO_").unwrap();
        assert_eq!(wide.height(), 1);
        assert_eq!(wide.cell("BIO_tTau", 0).render(), "45");
    }

    #[test]
    fn loads_sources_onto_the_key_index() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Current_Biospecimen_Analysis_Results.csv"),
            "PATNO,CLINICAL_EVENT,TESTNAME,TESTVALUE\n1,BL,tTau,45\n2,BL,tTau,52\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("Project_151_pQTL_in_CSF_batch1.csv"),
            "PATNO,EVENT_ID,TESTNAME,TESTVALUE\n1,BL,NEFL,13\n",
        )
        .unwrap();
        // Not configured as a source prefix: must be ignored.
        std::fs::write(dir.path().join("Unrelated.csv"), "PATNO\n9\n").unwrap();

        let keys = KeySpec::default();
        let config = crate::config::StudyConfig::default().biospecimen;
        let load = load_biospecimen(dir.path(), &config, &keys, &[], &[]).unwrap();
        assert_eq!(load.files_loaded, 2);
        assert_eq!(load.table.height(), 2);
        assert!(load.table.has_column("BIO_tTau"));
        assert!(load.table.has_column("151_NEFL"));
        assert_eq!(load.table.cell("151_NEFL", 0).render(), "13");
        assert_eq!(load.table.cell("151_NEFL", 1), CellValue::Null);
    }

    #[test]
    fn exclude_filters_sources() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Current_Biospecimen_Analysis_Results.csv"),
            "PATNO,EVENT_ID,TESTNAME,TESTVALUE\n1,BL,tTau,45\n",
        )
        .unwrap();
        let keys = KeySpec::default();
        let config = crate::config::StudyConfig::default().biospecimen;
        let load = load_biospecimen(
            dir.path(),
            &config,
            &keys,
            &[],
            &["current_biospecimen".to_string()],
        )
        .unwrap();
        assert!(load.table.is_empty());
    }
}
