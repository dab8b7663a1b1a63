//! CSV parsing into tables and CSV output.

use std::path::Path;

use cohort_model::{CellValue, Column, Table};
use tracing::debug;

use crate::error::{IngestError, Result};

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Read a CSV file into a [`Table`].
///
/// The table name is the file stem. Headers are trimmed and BOM-stripped;
/// cells are trimmed, with blanks ingested as `Null` and everything else as
/// `Text` (identifier columns are never numerically parsed). Short records
/// are padded with nulls.
pub fn read_csv_table(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| IngestError::CsvRead {
            path: path.to_path_buf(),
            source: e,
        })?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::CsvRead {
            path: path.to_path_buf(),
            source: e,
        })?
        .iter()
        .map(normalize_header)
        .collect();

    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::CsvRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        for (idx, column) in cells.iter_mut().enumerate() {
            let value = record.get(idx).unwrap_or("");
            column.push(CellValue::from_raw(value));
        }
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table");
    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(header, cells)| Column::new(header, cells))
        .collect();
    let table = Table::from_columns(name, columns)?;
    debug!(
        path = %path.display(),
        rows = table.height(),
        columns = table.width(),
        "read csv table"
    );
    Ok(table)
}

/// Write a table as CSV. `Null` renders as an empty field.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| IngestError::CsvWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    let wrap = |e: csv::Error| IngestError::CsvWrite {
        path: path.to_path_buf(),
        source: e,
    };
    writer.write_record(table.column_names()).map_err(wrap)?;
    for row in 0..table.height() {
        let record: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.cells[row].render())
            .collect();
        writer.write_record(&record).map_err(wrap)?;
    }
    writer
        .flush()
        .map_err(|e| IngestError::CsvWrite {
            path: path.to_path_buf(),
            source: csv::Error::from(e),
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_trimmed_text_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Demographics.csv");
        std::fs::write(&path, "PATNO,SEX,AGE\n 0070 ,M,71\n1002,, \n").unwrap();
        let table = read_csv_table(&path).unwrap();
        assert_eq!(table.name, "Demographics");
        assert_eq!(table.height(), 2);
        // Leading zeros survive ingestion.
        assert_eq!(table.cell("PATNO", 0), CellValue::Text("0070".into()));
        assert_eq!(table.cell("SEX", 1), CellValue::Null);
        assert_eq!(table.cell("AGE", 1), CellValue::Null);
    }

    #[test]
    fn pads_short_records_and_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "PATNO,SCORE\n1,10\n,\n2\n").unwrap();
        let table = read_csv_table(&path).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.cell("SCORE", 1), CellValue::Null);
    }

    #[test]
    fn strips_bom_from_first_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "\u{feff}PATNO,SCORE\n1,10\n").unwrap();
        let table = read_csv_table(&path).unwrap();
        assert!(table.has_column("PATNO"));
    }

    #[test]
    fn writes_nulls_as_empty_fields() {
        let dir = TempDir::new().unwrap();
        let table = Table::from_columns(
            "out",
            vec![
                Column::from_raw("PATNO", &["1", "2"]),
                Column::new(
                    "SCORE",
                    vec![CellValue::Text("10|12".into()), CellValue::Null],
                ),
            ],
        )
        .unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&table, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "PATNO,SCORE\n1,10|12\n2,\n");
    }
}
