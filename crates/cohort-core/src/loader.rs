//! Standard modality loading pipeline.

use std::path::Path;

use cohort_engine::{aggregate, consolidate};
use cohort_ingest::{files_matching_prefixes, list_csv_files_recursive, read_csv_table};
use cohort_model::{CellValue, Column, KeySpec, Table};
use tracing::{debug, warn};

use crate::error::Result;

/// A consolidated modality table plus load statistics.
#[derive(Debug, Clone)]
pub struct ModalityLoad {
    pub table: Table,
    pub files_loaded: usize,
    pub files_skipped: usize,
}

/// Read every prefixed CSV under `folder`, skipping unreadable files and
/// files without the primary key.
pub(crate) fn read_prefixed_tables(
    folder: &Path,
    prefixes: &[String],
    keys: &KeySpec,
) -> Result<(Vec<Table>, usize)> {
    let files = list_csv_files_recursive(folder)?;
    let matched = files_matching_prefixes(&files, prefixes);
    let mut tables = Vec::new();
    let mut skipped = 0usize;
    for path in matched {
        let table = match read_csv_table(&path) {
            Ok(table) => table,
            Err(error) => {
                warn!(path = %path.display(), %error, "could not read file; skipping");
                skipped += 1;
                continue;
            }
        };
        if !table.has_column(&keys.primary) {
            warn!(
                path = %path.display(),
                key = %keys.primary,
                "file is missing the primary key column; skipping"
            );
            skipped += 1;
            continue;
        }
        tables.push(table);
    }
    Ok((tables, skipped))
}

/// Load one standard modality: discover, read, consolidate, aggregate.
///
/// The output is unique per (primary, secondary) key tuple, or per primary
/// key when no source carried the secondary key. A missing folder or no
/// matching files yields an empty table, not an error.
pub fn load_modality(
    name: &str,
    folder: &Path,
    prefixes: &[String],
    keys: &KeySpec,
) -> Result<ModalityLoad> {
    if !folder.is_dir() {
        warn!(modality = name, folder = %folder.display(), "directory not found");
        return Ok(ModalityLoad {
            table: Table::empty(name),
            files_loaded: 0,
            files_skipped: 0,
        });
    }
    let (tables, files_skipped) = read_prefixed_tables(folder, prefixes, keys)?;
    let files_loaded = tables.len();
    if tables.is_empty() {
        warn!(modality = name, "no matching files were successfully loaded");
        return Ok(ModalityLoad {
            table: Table::empty(name),
            files_loaded,
            files_skipped,
        });
    }
    let mut table = aggregate(consolidate(tables, keys)?, keys)?;
    table.name = name.to_string();
    debug!(
        modality = name,
        rows = table.height(),
        columns = table.width(),
        "loaded modality"
    );
    Ok(ModalityLoad {
        table,
        files_loaded,
        files_skipped,
    })
}

/// Stack tables vertically on the union of their columns, null-filling where
/// a table lacks a column. Column order follows first appearance.
pub fn stack_tables(name: &str, tables: &[Table]) -> Result<Table> {
    let mut names: Vec<String> = Vec::new();
    for table in tables {
        for column in table.column_names() {
            if !names.iter().any(|n| n == column) {
                names.push(column.to_string());
            }
        }
    }
    let total: usize = tables.iter().map(Table::height).sum();
    let mut columns: Vec<Column> = names
        .iter()
        .map(|n| Column::new(n.clone(), Vec::with_capacity(total)))
        .collect();
    for table in tables {
        for (idx, column_name) in names.iter().enumerate() {
            match table.column(column_name) {
                Some(column) => columns[idx].cells.extend(column.cells.iter().cloned()),
                None => columns[idx]
                    .cells
                    .extend(std::iter::repeat_n(CellValue::Null, table.height())),
            }
        }
    }
    Ok(Table::from_columns(name, columns)?)
}

/// Rename every non-key column with `prefix`, so independent sources cannot
/// produce spurious collisions when merged. Key columns are untouched.
pub fn prefix_columns(table: Table, prefix: &str, keys: &KeySpec) -> Result<Table> {
    let name = table.name.clone();
    let columns = table
        .columns()
        .iter()
        .map(|column| {
            let new_name = if keys.is_key(&column.name) {
                column.name.clone()
            } else {
                format!("{prefix}{}", column.name)
            };
            Column::new(new_name, column.cells.clone())
        })
        .collect();
    Ok(Table::from_columns(name, columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_and_consolidates_a_modality() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Demographics.csv"),
            "PATNO,EVENT_ID,SEX\n1,BL,M\n2,BL,F\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("Age_at_visit.csv"),
            "PATNO,EVENT_ID,AGE\n1,BL,70\n1,V01,70.2\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("No_Key.csv"), "EVENT_ID,X\nBL,1\n").unwrap();

        let keys = KeySpec::default();
        let prefixes = vec![
            "Age_at_visit".to_string(),
            "Demographics".to_string(),
            "No_Key".to_string(),
        ];
        let load = load_modality("subject_characteristics", dir.path(), &prefixes, &keys).unwrap();
        assert_eq!(load.files_loaded, 2);
        assert_eq!(load.files_skipped, 1);
        assert_eq!(load.table.height(), 3);
        assert_eq!(load.table.cell("SEX", 0).render(), "M");
    }

    #[test]
    fn missing_folder_yields_empty_table() {
        let keys = KeySpec::default();
        let load = load_modality(
            "motor_assessments",
            Path::new("/no/such/folder"),
            &[],
            &keys,
        )
        .unwrap();
        assert!(load.table.is_empty());
    }

    #[test]
    fn stacks_on_column_union() {
        let a = Table::from_columns(
            "a",
            vec![
                Column::from_raw("PATNO", &["1"]),
                Column::from_raw("X", &["x1"]),
            ],
        )
        .unwrap();
        let b = Table::from_columns(
            "b",
            vec![
                Column::from_raw("PATNO", &["2"]),
                Column::from_raw("Y", &["y2"]),
            ],
        )
        .unwrap();
        let stacked = stack_tables("ab", &[a, b]).unwrap();
        assert_eq!(stacked.height(), 2);
        assert_eq!(stacked.column_names(), vec!["PATNO", "X", "Y"]);
        assert_eq!(stacked.cell("X", 1), CellValue::Null);
        assert_eq!(stacked.cell("Y", 1).render(), "y2");
    }

    #[test]
    fn prefixing_spares_key_columns() {
        let keys = KeySpec::default();
        let table = Table::from_columns(
            "t",
            vec![
                Column::from_raw("PATNO", &["1"]),
                Column::from_raw("EVENT_ID", &["BL"]),
                Column::from_raw("ABETA", &["620"]),
            ],
        )
        .unwrap();
        let prefixed = prefix_columns(table, "BIO_", &keys).unwrap();
        assert_eq!(
            prefixed.column_names(),
            vec!["PATNO", "EVENT_ID", "BIO_ABETA"]
        );
    }
}
