//! Sequential consolidation of an ordered table sequence.

use std::collections::HashSet;

use cohort_model::{CellValue, Column, KeySpec, Table};
use tracing::debug;

use crate::error::Result;
use crate::merge::{JoinKind, merge, merge_with, require_primary, row_keys};

/// Fold the pairwise merge over `tables` in order.
///
/// The accumulator is seeded with the first table; order affects only the
/// encounter order of pipe-joined conflict tokens, never key coverage. An
/// empty sequence yields an empty table; a single table is returned
/// unchanged.
pub fn consolidate(tables: Vec<Table>, keys: &KeySpec) -> Result<Table> {
    let mut iter = tables.into_iter();
    let Some(first) = iter.next() else {
        return Ok(Table::empty("consolidated"));
    };
    require_primary(&first, keys)?;
    let mut acc = first;
    for table in iter {
        debug!(into = %acc.name, table = %table.name, "consolidating");
        acc = merge(acc, table, keys)?;
    }
    Ok(acc)
}

/// Fold left joins of `tables` onto a precomputed key index.
///
/// The index bounds the output row set: keys absent from the index are
/// dropped rather than unioned in. Used for very large independent sources
/// where an outer fold would be memory-unbounded.
pub fn consolidate_onto_index(index: Table, tables: Vec<Table>, keys: &KeySpec) -> Result<Table> {
    require_primary(&index, keys)?;
    let mut acc = index;
    for table in tables {
        debug!(into = %acc.name, table = %table.name, "left-joining onto index");
        acc = merge_with(acc, table, keys, JoinKind::Left)?;
    }
    Ok(acc)
}

/// Build the universal key index: every distinct key tuple observed across
/// `tables`, in encounter order.
///
/// When any table carries the secondary key the index is (primary,
/// secondary) and only tables carrying both contribute; otherwise it is the
/// distinct primaries of every table that has the primary key. Tables
/// missing the required keys contribute nothing.
pub fn key_index(tables: &[Table], keys: &KeySpec, name: &str) -> Table {
    let with_secondary = tables.iter().any(|t| t.has_column(&keys.secondary));
    let mut on = vec![keys.primary.clone()];
    if with_secondary {
        on.push(keys.secondary.clone());
    }

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut ordered: Vec<Vec<String>> = Vec::new();
    for table in tables {
        if on.iter().any(|k| !table.has_column(k)) {
            continue;
        }
        for key in row_keys(table, &on) {
            if seen.insert(key.clone()) {
                ordered.push(key);
            }
        }
    }

    let columns = on
        .iter()
        .enumerate()
        .map(|(idx, key_name)| {
            let cells = ordered
                .iter()
                .map(|key| CellValue::from_raw(&key[idx]))
                .collect();
            Column::new(key_name.clone(), cells)
        })
        .collect();
    // Cannot fail: key names are distinct and columns equal length.
    Table::from_columns(name, columns).unwrap_or_else(|_| Table::empty(name))
}
