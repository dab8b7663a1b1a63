//! Pairwise keyed merge.

use std::collections::HashMap;

use cohort_model::{CellValue, Column, KeySpec, Table};
use tracing::debug;

use crate::aggregate::aggregate;
use crate::collision::{CollisionSet, left_marked, resolve_collisions, right_marked, sanitize_marker_clashes};
use crate::error::{EngineError, Result};

/// How the row set of a merge is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Union of keys from both sides; a patient or visit present in only one
    /// source is retained with nulls for the other source's columns.
    Outer,
    /// Keys from the left side only. Used when folding large heterogeneous
    /// sources onto a precomputed key index, trading completeness for a
    /// bounded row set.
    Left,
}

/// Outer-join two tables on the adaptively selected key set.
///
/// See [`merge_with`]; this is the default used for modality consolidation.
pub fn merge(left: Table, right: Table, keys: &KeySpec) -> Result<Table> {
    merge_with(left, right, keys, JoinKind::Outer)
}

/// Join two tables on the adaptively selected key set.
///
/// Key selection: (primary, secondary) when both sides carry the secondary
/// key, primary alone otherwise. A side without the secondary key is
/// broadcast across all rows of the other side sharing its primary key.
///
/// Each input is first collapsed to one row per its own key tuple, so the
/// output carries exactly one row per distinct key tuple of the join, never
/// a cross product of the input row counts. Same-named non-key columns become
/// collision pairs and are fused before returning; the result never exposes
/// marked columns.
pub fn merge_with(left: Table, right: Table, keys: &KeySpec, kind: JoinKind) -> Result<Table> {
    require_primary(&left, keys)?;
    require_primary(&right, keys)?;

    let left = aggregate(left, keys)?;
    let right = aggregate(right, keys)?;

    let join_on = join_columns(&left, &right, keys);
    if join_on.len() == 1 && (left.has_column(&keys.secondary) || right.has_column(&keys.secondary))
    {
        let lacking = if left.has_column(&keys.secondary) {
            &right.name
        } else {
            &left.name
        };
        debug!(
            table = %lacking,
            key = %keys.secondary,
            "joining on primary key only (one side lacks the secondary key)"
        );
    }

    let collisions = CollisionSet::from_schemas(&left, &right, &join_on);
    let left = sanitize_marker_clashes(left, &collisions, keys);
    let right = sanitize_marker_clashes(right, &collisions, keys);
    let (left, right) = mark_collisions(left, right, &collisions)?;

    debug!(
        left = %left.name,
        right = %right.name,
        on = ?join_on,
        collisions = collisions.bases().len(),
        "merging"
    );

    let left_keys = row_keys(&left, &join_on);
    let right_keys = row_keys(&right, &join_on);
    let mut right_index: HashMap<&[String], Vec<usize>> = HashMap::new();
    for (idx, key) in right_keys.iter().enumerate() {
        right_index.entry(key.as_slice()).or_default().push(idx);
    }

    // Row pairings: left rows in order with their matches, then (for outer
    // joins) unmatched right rows in their own order.
    let mut pairs: Vec<(Option<usize>, Option<usize>)> = Vec::new();
    let mut right_matched = vec![false; right.height()];
    for (li, key) in left_keys.iter().enumerate() {
        match right_index.get(key.as_slice()) {
            Some(rows) => {
                for &ri in rows {
                    right_matched[ri] = true;
                    pairs.push((Some(li), Some(ri)));
                }
            }
            None => pairs.push((Some(li), None)),
        }
    }
    if kind == JoinKind::Outer {
        for (ri, matched) in right_matched.iter().enumerate() {
            if !matched {
                pairs.push((None, Some(ri)));
            }
        }
    }

    let mut joined = Table::empty(left.name.clone());
    for column in left.columns() {
        let is_on = join_on.iter().any(|k| k == &column.name);
        let cells: Vec<CellValue> = pairs
            .iter()
            .map(|(li, ri)| match (li, ri) {
                (Some(l), _) => column.cells[*l].clone(),
                (None, Some(r)) if is_on => right.cell(&column.name, *r),
                (None, _) => CellValue::Null,
            })
            .collect();
        joined.push_column(Column::new(column.name.clone(), cells))?;
    }
    for column in right.columns() {
        if join_on.iter().any(|k| k == &column.name) {
            continue;
        }
        let cells: Vec<CellValue> = pairs
            .iter()
            .map(|(_, ri)| match ri {
                Some(r) => column.cells[*r].clone(),
                None => CellValue::Null,
            })
            .collect();
        joined.push_column(Column::new(column.name.clone(), cells))?;
    }

    resolve_collisions(joined, &collisions)
}

pub(crate) fn require_primary(table: &Table, keys: &KeySpec) -> Result<()> {
    if table.has_column(&keys.primary) {
        Ok(())
    } else {
        Err(EngineError::MissingPrimaryKey {
            table: table.name.clone(),
            key: keys.primary.clone(),
        })
    }
}

fn join_columns(left: &Table, right: &Table, keys: &KeySpec) -> Vec<String> {
    let mut on = vec![keys.primary.clone()];
    if left.has_column(&keys.secondary) && right.has_column(&keys.secondary) {
        on.push(keys.secondary.clone());
    }
    on
}

fn mark_collisions(
    mut left: Table,
    mut right: Table,
    collisions: &CollisionSet,
) -> Result<(Table, Table)> {
    for base in collisions.bases() {
        left.rename_column(base, left_marked(base))?;
        right.rename_column(base, right_marked(base))?;
    }
    Ok((left, right))
}

/// Key tuple per row: rendered, trimmed values of the `on` columns.
pub(crate) fn row_keys(table: &Table, on: &[String]) -> Vec<Vec<String>> {
    let columns: Vec<&Column> = on.iter().filter_map(|name| table.column(name)).collect();
    (0..table.height())
        .map(|row| {
            columns
                .iter()
                .map(|c| c.cells[row].render().trim().to_string())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, cols: Vec<(&str, Vec<&str>)>) -> Table {
        Table::from_columns(
            name,
            cols.into_iter()
                .map(|(col, cells)| Column::from_raw(col, &cells))
                .collect(),
        )
        .unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn joins_on_both_keys_when_both_sides_carry_them() {
        let keys = KeySpec::default();
        let left = table(
            "updrs1",
            vec![
                ("PATNO", vec!["1", "2"]),
                ("EVENT_ID", vec!["BL", "BL"]),
                ("NP1TOT", vec!["4", "9"]),
            ],
        );
        let right = table(
            "updrs2",
            vec![
                ("PATNO", vec!["1", "3"]),
                ("EVENT_ID", vec!["BL", "V01"]),
                ("NP2TOT", vec!["2", "6"]),
            ],
        );
        let merged = merge(left, right, &keys).unwrap();
        assert_eq!(merged.height(), 3);
        assert_eq!(
            merged.column_names(),
            vec!["PATNO", "EVENT_ID", "NP1TOT", "NP2TOT"]
        );
        // Patient 2 has no right-hand record, patient 3 no left-hand record.
        assert_eq!(merged.cell("NP2TOT", 1), CellValue::Null);
        assert_eq!(merged.cell("PATNO", 2), text("3"));
        assert_eq!(merged.cell("EVENT_ID", 2), text("V01"));
        assert_eq!(merged.cell("NP1TOT", 2), CellValue::Null);
    }

    #[test]
    fn broadcasts_static_records_across_visits() {
        let keys = KeySpec::default();
        let visits = table(
            "visits",
            vec![
                ("PATNO", vec!["1", "1"]),
                ("EVENT_ID", vec!["BL", "V01"]),
                ("SCORE", vec!["10", "12"]),
            ],
        );
        let demographics = table(
            "demographics",
            vec![("PATNO", vec!["1"]), ("SEX", vec!["M"])],
        );
        let merged = merge(visits, demographics, &keys).unwrap();
        assert_eq!(merged.height(), 2);
        assert_eq!(merged.cell("SEX", 0), text("M"));
        assert_eq!(merged.cell("SEX", 1), text("M"));
        assert_eq!(merged.cell("SCORE", 0), text("10"));
        assert_eq!(merged.cell("SCORE", 1), text("12"));
    }

    #[test]
    fn collided_columns_fuse_losslessly() {
        let keys = KeySpec::default();
        let left = table(
            "a",
            vec![
                ("PATNO", vec!["1", "2"]),
                ("EVENT_ID", vec!["BL", "BL"]),
                ("SEX", vec!["M", "F"]),
            ],
        );
        let right = table(
            "b",
            vec![
                ("PATNO", vec!["1", "2"]),
                ("EVENT_ID", vec!["BL", "BL"]),
                ("SEX", vec!["M", "Female"]),
            ],
        );
        let merged = merge(left, right, &keys).unwrap();
        assert_eq!(merged.column_names(), vec!["PATNO", "EVENT_ID", "SEX"]);
        assert_eq!(merged.cell("SEX", 0), text("M"));
        assert_eq!(merged.cell("SEX", 1), text("F|Female"));
    }

    #[test]
    fn refuses_table_without_primary_key() {
        let keys = KeySpec::default();
        let left = table("ok", vec![("PATNO", vec!["1"]), ("A", vec!["x"])]);
        let right = table("bad", vec![("EVENT_ID", vec!["BL"]), ("B", vec!["y"])]);
        let err = merge(left, right, &keys).unwrap_err();
        assert!(matches!(err, EngineError::MissingPrimaryKey { .. }));
    }

    #[test]
    fn left_join_is_bounded_by_the_left_row_set() {
        let keys = KeySpec::default();
        let index = table(
            "key_index",
            vec![("PATNO", vec!["1", "2"]), ("EVENT_ID", vec!["BL", "BL"])],
        );
        let source = table(
            "assays",
            vec![
                ("PATNO", vec!["1", "9", "8"]),
                ("EVENT_ID", vec!["BL", "BL", "V01"]),
                ("ABETA", vec!["620", "811", "700"]),
            ],
        );
        let merged = merge_with(index, source, &keys, JoinKind::Left).unwrap();
        assert_eq!(merged.height(), 2);
        assert_eq!(merged.cell("ABETA", 0), text("620"));
        assert_eq!(merged.cell("ABETA", 1), CellValue::Null);
    }

    #[test]
    fn duplicate_key_rows_collapse_before_joining() {
        let keys = KeySpec::default();
        let left = table(
            "a",
            vec![
                ("PATNO", vec!["1", "1"]),
                ("EVENT_ID", vec!["BL", "BL"]),
                ("NOTE", vec!["first", "second"]),
            ],
        );
        let right = table(
            "b",
            vec![
                ("PATNO", vec!["1"]),
                ("EVENT_ID", vec!["BL"]),
                ("OTHER", vec!["x"]),
            ],
        );
        let merged = merge(left, right, &keys).unwrap();
        assert_eq!(merged.height(), 1);
        assert_eq!(merged.cell("NOTE", 0), text("first|second"));
    }

    #[test]
    fn native_marker_like_column_survives_a_merge() {
        let keys = KeySpec::default();
        let left = table(
            "a",
            vec![
                ("PATNO", vec!["1"]),
                ("SCORE", vec!["5"]),
                ("SCORE_x", vec!["native"]),
            ],
        );
        let right = table("b", vec![("PATNO", vec!["1"]), ("SCORE", vec!["7"])]);
        let merged = merge(left, right, &keys).unwrap();
        assert_eq!(merged.cell("SCORE", 0), text("5|7"));
        // The pre-existing column was not swallowed by collision resolution.
        assert_eq!(merged.cell("SCORE_x_orig", 0), text("native"));
    }
}
