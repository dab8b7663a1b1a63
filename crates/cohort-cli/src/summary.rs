//! Run summary rendering.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::commands::LoadResult;

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn print_summary(result: &LoadResult) {
    println!("Study folder: {}", result.data_dir.display());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Rows"),
        header_cell("Columns"),
        header_cell("Files"),
        header_cell("Skipped"),
    ]);
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    for index in 1..=4 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut total_files = 0usize;
    let mut total_skipped = 0usize;
    for summary in &result.summaries {
        total_files += summary.files_loaded;
        total_skipped += summary.files_skipped;
        let skipped_cell = if summary.files_skipped > 0 {
            Cell::new(summary.files_skipped).fg(Color::Yellow)
        } else {
            Cell::new(summary.files_skipped)
        };
        table.add_row(vec![
            Cell::new(&summary.name),
            Cell::new(summary.rows),
            Cell::new(summary.columns),
            Cell::new(summary.files_loaded),
            skipped_cell,
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(total_files).add_attribute(Attribute::Bold),
        Cell::new(total_skipped).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    if let Some((rows, columns, path)) = &result.merged {
        match path {
            Some(path) => println!(
                "Merged output: {rows} rows x {columns} columns -> {}",
                path.display()
            ),
            None => println!("Merged output: {rows} rows x {columns} columns (not written)"),
        }
    }
}
