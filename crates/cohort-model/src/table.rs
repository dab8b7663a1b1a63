//! In-memory relation with named, positionally aligned columns.

use crate::error::{ModelError, Result};
use crate::value::CellValue;

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Build a column from raw strings, mapping blanks to `Null`.
    pub fn from_raw(name: impl Into<String>, raw: &[&str]) -> Self {
        Self {
            name: name.into(),
            cells: raw.iter().map(|v| CellValue::from_raw(v)).collect(),
        }
    }
}

/// An in-memory table: ordered columns of equal length, unique names.
///
/// `name` is a diagnostic label (source file stem or modality), carried for
/// log messages only. Tables flow forward through the consolidation pipeline
/// as owned values; transforms produce new tables rather than mutating their
/// input.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Table {
    pub name: String,
    columns: Vec<Column>,
}

impl Table {
    /// A table with no columns and no rows.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Build a table, validating unique column names and equal lengths.
    pub fn from_columns(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let mut table = Self::empty(name);
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, |c| c.cells.len())
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Cell at (column name, row index); `Null` for an unknown column.
    pub fn cell(&self, name: &str, row: usize) -> CellValue {
        self.column(name)
            .and_then(|c| c.cells.get(row).cloned())
            .unwrap_or(CellValue::Null)
    }

    /// Append a column, enforcing name uniqueness and length alignment.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.has_column(&column.name) {
            return Err(ModelError::DuplicateColumn {
                name: column.name.clone(),
            });
        }
        if !self.columns.is_empty() && column.cells.len() != self.height() {
            return Err(ModelError::LengthMismatch {
                column: column.name.clone(),
                expected: self.height(),
                actual: column.cells.len(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Rename a column in place.
    pub fn rename_column(&mut self, from: &str, to: impl Into<String>) -> Result<()> {
        let to = to.into();
        if self.has_column(&to) {
            return Err(ModelError::DuplicateColumn { name: to });
        }
        match self.columns.iter_mut().find(|c| c.name == from) {
            Some(column) => {
                column.name = to;
                Ok(())
            }
            None => Err(ModelError::UnknownColumn {
                name: from.to_string(),
            }),
        }
    }

    /// Remove and return a column by name.
    pub fn take_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.column_index(name)?;
        Some(self.columns.remove(idx))
    }

    /// One row as (column name, cell) pairs, in column order.
    pub fn row(&self, idx: usize) -> Vec<(&str, CellValue)> {
        self.columns
            .iter()
            .map(|c| {
                (
                    c.name.as_str(),
                    c.cells.get(idx).cloned().unwrap_or(CellValue::Null),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_column_names() {
        let result = Table::from_columns(
            "t",
            vec![
                Column::from_raw("PATNO", &["1"]),
                Column::from_raw("PATNO", &["2"]),
            ],
        );
        assert!(matches!(result, Err(ModelError::DuplicateColumn { .. })));
    }

    #[test]
    fn rejects_ragged_columns() {
        let result = Table::from_columns(
            "t",
            vec![
                Column::from_raw("PATNO", &["1", "2"]),
                Column::from_raw("SCORE", &["10"]),
            ],
        );
        assert!(matches!(result, Err(ModelError::LengthMismatch { .. })));
    }

    #[test]
    fn rename_guards_against_collision() {
        let mut table = Table::from_columns(
            "t",
            vec![
                Column::from_raw("A", &["1"]),
                Column::from_raw("B", &["2"]),
            ],
        )
        .unwrap();
        assert!(table.rename_column("A", "B").is_err());
        table.rename_column("A", "C").unwrap();
        assert!(table.has_column("C"));
        assert!(!table.has_column("A"));
    }

    #[test]
    fn cell_is_null_out_of_range() {
        let table =
            Table::from_columns("t", vec![Column::from_raw("A", &["1"])]).unwrap();
        assert_eq!(table.cell("A", 0), CellValue::Text("1".to_string()));
        assert_eq!(table.cell("A", 5), CellValue::Null);
        assert_eq!(table.cell("MISSING", 0), CellValue::Null);
    }

    #[test]
    fn serializes_round_trip() {
        let table = Table::from_columns(
            "demographics",
            vec![Column::from_raw("PATNO", &["1001", "1002"])],
        )
        .unwrap();
        let json = serde_json::to_string(&table).expect("serialize table");
        let round: Table = serde_json::from_str(&json).expect("deserialize table");
        assert_eq!(round, table);
    }
}
