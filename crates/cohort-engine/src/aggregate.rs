//! Duplicate-key aggregation.

use std::collections::HashMap;

use cohort_model::{CellValue, Column, KeySpec, Table};
use tracing::{debug, info};

use crate::combine::{CONFLICT_DELIMITER, combine_all};
use crate::error::Result;
use crate::merge::{require_primary, row_keys};

/// Collapse rows sharing the same key tuple into single rows.
///
/// Groups on (primary, secondary) when the table carries the secondary key,
/// primary alone otherwise. Groups of one pass through unchanged; larger
/// groups fold each non-key column with the value-combination rule over the
/// group's rows in row order. The output has exactly one row per distinct key
/// tuple, in first-encounter order, and re-applying the aggregation is a
/// no-op.
pub fn aggregate(table: Table, keys: &KeySpec) -> Result<Table> {
    require_primary(&table, keys)?;
    if table.height() == 0 {
        return Ok(table);
    }

    let mut group_cols = vec![keys.primary.clone()];
    if table.has_column(&keys.secondary) {
        group_cols.push(keys.secondary.clone());
    }

    let keys_per_row = row_keys(&table, &group_cols);
    let mut order: Vec<Vec<String>> = Vec::new();
    let mut groups: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for (row, key) in keys_per_row.iter().enumerate() {
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key.clone());
                Vec::new()
            })
            .push(row);
    }

    if groups.len() == table.height() {
        return Ok(table);
    }

    info!(
        table = %table.name,
        rows = table.height(),
        unique = groups.len(),
        "collapsing rows with duplicate key tuples"
    );

    let mut out = Table::empty(table.name.clone());
    for column in table.columns() {
        let is_group_col = group_cols.iter().any(|g| g == &column.name);
        let mut piped_groups = 0usize;
        let cells: Vec<CellValue> = order
            .iter()
            .map(|key| {
                let rows = &groups[key];
                if is_group_col || rows.len() == 1 {
                    column.cells[rows[0]].clone()
                } else {
                    let combined = combine_all(rows.iter().map(|&r| &column.cells[r]));
                    if matches!(&combined, CellValue::Text(s) if s.contains(CONFLICT_DELIMITER)) {
                        piped_groups += 1;
                    }
                    combined
                }
            })
            .collect();
        if piped_groups > 0 {
            debug!(
                column = %column.name,
                groups = piped_groups,
                "groups held multiple values; pipe-separated"
            );
        }
        out.push_column(Column::new(column.name.clone(), cells))?;
    }
    Ok(out)
}
