//! Recoding of uncertain assessment scores.

use cohort_model::{CellValue, Column, Table};

use crate::error::{CleanError, Result};

/// Default stand-in for an "uncertain" score: halfway between no and yes.
pub const DEFAULT_UNCERTAIN: f64 = 0.5;

const PARKINSONISM_FEATURES: [&str; 4] =
    ["FEATBRADY", "FEATPOSINS", "FEATRIGID", "FEATTREMOR"];

/// Recode `2` ("uncertain" / "cannot assess") in 0/1/2-coded columns.
///
/// Values other than `2` pass through unchanged, including missing cells.
pub fn recode_uncertain(table: Table, columns: &[&str], uncertain: f64) -> Result<Table> {
    for name in columns {
        if !table.has_column(name) {
            return Err(CleanError::MissingColumn {
                table: table.name.clone(),
                column: name.to_string(),
                transform: "recode_uncertain",
            });
        }
    }
    let name = table.name.clone();
    let columns_out: Vec<Column> = table
        .columns()
        .iter()
        .map(|column| {
            if !columns.contains(&column.name.as_str()) {
                return column.clone();
            }
            let cells = column
                .cells
                .iter()
                .map(|cell| match cell.as_number() {
                    Some(v) if v == 2.0 => CellValue::Number(uncertain),
                    _ => cell.clone(),
                })
                .collect();
            Column::new(column.name.clone(), cells)
        })
        .collect();
    Ok(Table::from_columns(name, columns_out)?)
}

/// Recode the four cardinal parkinsonism feature columns (0: no, 1: yes,
/// 2: uncertain).
pub fn clean_parkinsonism_features(table: Table, uncertain: f64) -> Result<Table> {
    recode_uncertain(table, &PARKINSONISM_FEATURES, uncertain)
}

/// Recode the physical-exam abnormality column (0: no, 1: yes, 2: cannot
/// assess).
pub fn clean_physical_exam(table: Table, uncertain: f64) -> Result<Table> {
    recode_uncertain(table, &["ABNORM"], uncertain)
}
