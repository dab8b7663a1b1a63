//! End-to-end consolidation scenarios.

use cohort_engine::{aggregate, consolidate, consolidate_onto_index, key_index};
use cohort_model::{CellValue, Column, KeySpec, Table};

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

/// Render a table as CSV-ish lines for snapshotting.
fn render(table: &Table) -> String {
    let mut lines = vec![table.column_names().join(",")];
    for row in 0..table.height() {
        let line: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.cells[row].render())
            .collect();
        lines.push(line.join(","));
    }
    lines.join("\n")
}

#[test]
fn three_table_scenario() {
    let keys = KeySpec::default();
    let t1 = table(
        "t1",
        vec![
            ("PATNO", vec!["1", "2"]),
            ("EVENT_ID", vec!["BL", "BL"]),
            ("SCORE", vec!["10", "20"]),
        ],
    );
    let t2 = table(
        "t2",
        vec![
            ("PATNO", vec!["1", "2"]),
            ("EVENT_ID", vec!["BL", "BL"]),
            ("SCORE", vec!["10", "25"]),
        ],
    );
    let t3 = table("t3", vec![("PATNO", vec!["1"]), ("AGE", vec!["70"])]);

    let consolidated = consolidate(vec![t1, t2, t3], &keys).unwrap();
    let out = aggregate(consolidated, &keys).unwrap();

    assert_eq!(out.height(), 2);
    // Equal values collapse, conflicts are preserved pipe-joined.
    assert_eq!(out.cell("SCORE", 0), text("10"));
    assert_eq!(out.cell("SCORE", 1), text("20|25"));
    // Only patient 1 appears in the static table.
    assert_eq!(out.cell("AGE", 0), text("70"));
    assert_eq!(out.cell("AGE", 1), CellValue::Null);

    insta::assert_snapshot!(render(&out), @r"
    PATNO,EVENT_ID,SCORE,AGE
    1,BL,10,70
    2,BL,20|25,
    ");
}

#[test]
fn no_information_loss_on_conflict() {
    let keys = KeySpec::default();
    let a = table(
        "a",
        vec![
            ("PATNO", vec!["k"]),
            ("EVENT_ID", vec!["BL"]),
            ("X", vec!["5"]),
        ],
    );
    let b = table(
        "b",
        vec![
            ("PATNO", vec!["k"]),
            ("EVENT_ID", vec!["BL"]),
            ("X", vec!["7"]),
        ],
    );
    let out = consolidate(vec![a, b], &keys).unwrap();
    assert_eq!(out.cell("X", 0), text("5|7"));
}

#[test]
fn equal_value_collapse_never_duplicates() {
    let keys = KeySpec::default();
    let a = table(
        "a",
        vec![("PATNO", vec!["1"]), ("SEX", vec!["Male"])],
    );
    let b = table(
        "b",
        vec![("PATNO", vec!["1"]), ("SEX", vec!["Male"])],
    );
    let out = consolidate(vec![a, b], &keys).unwrap();
    assert_eq!(out.cell("SEX", 0), text("Male"));
}

#[test]
fn consolidation_then_aggregation_is_unique_per_key() {
    let keys = KeySpec::default();
    let a = table(
        "a",
        vec![
            ("PATNO", vec!["1", "1", "2"]),
            ("EVENT_ID", vec!["BL", "BL", "V01"]),
            ("A", vec!["x", "y", "z"]),
        ],
    );
    let b = table(
        "b",
        vec![
            ("PATNO", vec!["1", "3"]),
            ("EVENT_ID", vec!["BL", "BL"]),
            ("B", vec!["p", "q"]),
        ],
    );
    let consolidated = consolidate(vec![a, b], &keys).unwrap();
    let out = aggregate(consolidated, &keys).unwrap();
    assert_eq!(out.height(), 3);
    assert_eq!(out.cell("A", 0), text("x|y"));
}

#[test]
fn index_bounded_consolidation_drops_unknown_keys() {
    let keys = KeySpec::default();
    let known = table(
        "known",
        vec![
            ("PATNO", vec!["1", "2"]),
            ("EVENT_ID", vec!["BL", "BL"]),
        ],
    );
    let big_a = table(
        "big_a",
        vec![
            ("PATNO", vec!["1", "7"]),
            ("EVENT_ID", vec!["BL", "BL"]),
            ("ASSAY_1", vec!["0.5", "0.9"]),
        ],
    );
    let big_b = table(
        "big_b",
        vec![
            ("PATNO", vec!["2", "8"]),
            ("EVENT_ID", vec!["BL", "V09"]),
            ("ASSAY_2", vec!["11", "12"]),
        ],
    );
    let index = key_index(&[known], &keys, "index");
    let out = consolidate_onto_index(index, vec![big_a, big_b], &keys).unwrap();
    assert_eq!(out.height(), 2);
    assert_eq!(out.cell("ASSAY_1", 0), text("0.5"));
    assert_eq!(out.cell("ASSAY_2", 1), text("11"));
    assert_eq!(out.cell("ASSAY_2", 0), CellValue::Null);
}
