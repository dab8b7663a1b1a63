//! Collision-pair resolution.
//!
//! A pairwise merge marks same-named non-key columns from its two inputs with
//! a side marker (`BASE_x` from the left input, `BASE_y` from the right).
//! Resolution fuses each pair back into `BASE` with [`combine`], or renames a
//! one-sided variant. Resolution is scoped to the [`CollisionSet`] computed
//! by the merge step that produced the marks: a source column that natively
//! happens to end in `_x` or `_y` is never treated as a collision.

use cohort_model::{Column, KeySpec, Table};
use tracing::debug;

use crate::combine::combine;
use crate::error::Result;

/// Marker appended to the left input's copy of a collided column.
pub const LEFT_MARKER: &str = "_x";
/// Marker appended to the right input's copy of a collided column.
pub const RIGHT_MARKER: &str = "_y";

pub(crate) fn left_marked(base: &str) -> String {
    format!("{base}{LEFT_MARKER}")
}

pub(crate) fn right_marked(base: &str) -> String {
    format!("{base}{RIGHT_MARKER}")
}

/// The base names whose marked variants were produced by a single merge step.
///
/// Bases are kept sorted shortest-first: resolving `SCORE` before `SCORE_x`
/// guarantees that a column fused from the `SCORE_x` pair is never mistaken
/// for a marked variant of `SCORE`.
#[derive(Debug, Clone, Default)]
pub struct CollisionSet {
    bases: Vec<String>,
}

impl CollisionSet {
    /// Non-key column names present in both schemas. `join_on` columns are
    /// never marked.
    pub fn from_schemas(left: &Table, right: &Table, join_on: &[String]) -> Self {
        let mut bases: Vec<String> = left
            .column_names()
            .into_iter()
            .filter(|name| right.has_column(name) && !join_on.iter().any(|k| k == name))
            .map(str::to_string)
            .collect();
        bases.sort_by_key(|b| (b.len(), b.clone()));
        Self { bases }
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn bases(&self) -> &[String] {
        &self.bases
    }

    pub fn contains(&self, base: &str) -> bool {
        self.bases.iter().any(|b| b == base)
    }
}

/// Rename pre-existing columns whose names would clash with the marked names
/// this merge is about to generate (e.g. a source column natively called
/// `SCORE_x` when `SCORE` collides). Returns the sanitized table; clashes get
/// an `_orig` suffix, unique-ified with a counter.
pub(crate) fn sanitize_marker_clashes(
    mut table: Table,
    collisions: &CollisionSet,
    keys: &KeySpec,
) -> Table {
    let reserved: Vec<String> = collisions
        .bases()
        .iter()
        .flat_map(|base| [left_marked(base), right_marked(base)])
        .collect();
    let clashing: Vec<String> = table
        .column_names()
        .into_iter()
        .filter(|name| !keys.is_key(name) && reserved.iter().any(|r| r == name))
        .map(str::to_string)
        .collect();
    for name in clashing {
        let mut candidate = format!("{name}_orig");
        let mut counter = 0usize;
        while table.has_column(&candidate) {
            counter += 1;
            candidate = format!("{name}_orig{counter}");
        }
        debug!(column = %name, renamed_to = %candidate, "sanitized marker-like column");
        // Cannot fail: candidate was just checked for uniqueness.
        let _ = table.rename_column(&name, candidate);
    }
    table
}

/// Fuse the collision pairs of `collisions` back into base-named columns.
///
/// Per base: if both marked variants exist, every row's pair is combined and
/// the two marked columns are replaced (at the left variant's position) by the
/// base column; a one-sided variant is simply renamed. Columns outside the
/// collision set pass through untouched, so a natively marker-like name that
/// was never produced by this merge is left alone. Row count and order are
/// preserved.
pub fn resolve_collisions(table: Table, collisions: &CollisionSet) -> Result<Table> {
    if collisions.is_empty() {
        return Ok(table);
    }
    let mut resolved = Table::empty(table.name.clone());
    let mut consumed: Vec<String> = Vec::new();
    for column in table.columns() {
        if consumed.iter().any(|c| c == &column.name) {
            continue;
        }
        let handled = collisions.bases().iter().find_map(|base| {
            let lx = left_marked(base);
            let ly = right_marked(base);
            if column.name == lx {
                Some((base.clone(), Some(column), table.column(&ly), ly))
            } else if column.name == ly {
                // Right variant seen first: the left variant is absent from
                // this table (one-sided collision) or appears later.
                match table.column(&lx) {
                    Some(left) => Some((base.clone(), Some(left), table.column(&ly), ly)),
                    None => Some((base.clone(), Some(column), None, ly)),
                }
            } else {
                None
            }
        });
        match handled {
            Some((base, Some(left), Some(right), ly)) => {
                let cells = left
                    .cells
                    .iter()
                    .zip(right.cells.iter())
                    .map(|(a, b)| combine(a, b))
                    .collect();
                debug!(base = %base, "fused collision pair");
                resolved.push_column(Column::new(base, cells))?;
                consumed.push(left.name.clone());
                consumed.push(ly);
            }
            Some((base, Some(only), None, _)) => {
                resolved.push_column(Column::new(base, only.cells.clone()))?;
                consumed.push(only.name.clone());
            }
            _ => {
                resolved.push_column(column.clone())?;
            }
        }
    }
    Ok(resolved)
}
