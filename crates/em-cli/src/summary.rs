use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::commands::{MatchReport, ReviewReport, SparsityReport};

pub fn print_match_summary(report: &MatchReport) {
    println!("Input: {}", report.input.display());
    if let Some(path) = &report.output {
        println!("Output: {}", path.display());
    }
    println!("{}", match_summary_table(report));
    if report.groups.is_empty() {
        println!();
        println!("No duplicates found.");
        return;
    }
    println!();
    println!("Groups:");
    println!("{}", group_table(report));
}

pub fn match_summary_table(report: &MatchReport) -> Table {
    let resolution = &report.resolution;
    let blocking = match &resolution.blocking {
        Some(blocking) if resolution.blocking_adapted => {
            Cell::new(format!("{blocking} (memory budget)")).fg(Color::Yellow)
        }
        Some(blocking) => Cell::new(blocking),
        None => dim_cell("all pairs"),
    };
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Records"),
        header_cell("Candidates"),
        header_cell("Matches"),
        header_cell("Groups"),
        header_cell("Grouped records"),
        header_cell("Threshold"),
        header_cell("Blocking"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(report.records),
        Cell::new(resolution.candidate_count),
        count_cell(resolution.match_count()),
        count_cell(resolution.group_count()),
        count_cell(resolution.labels.labeled_count()),
        Cell::new(format!("{:.2}", resolution.matches.threshold())),
        blocking,
    ]);
    table
}

fn group_table(report: &MatchReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Group"),
        header_cell("Rows"),
        header_cell(&report.display_field),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for group in &report.groups {
        let rows = group
            .positions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(group.label)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(rows),
            Cell::new(group.values.join(" | ")),
        ]);
    }
    table
}

pub fn print_review(report: &ReviewReport) {
    println!(
        "Records whose '{}' contains '{}' and their group members:",
        report.column, report.text
    );
    println!("{}", review_table(report));
}

pub fn review_table(report: &ReviewReport) -> Table {
    let mut header = vec![header_cell("Row"), header_cell("Group")];
    header.extend(report.header.iter().map(|name| header_cell(name)));
    let mut table = Table::new();
    table.set_header(header);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Right);
    for (position, label, cells) in &report.rows {
        let mut row = vec![
            Cell::new(position),
            label.map_or_else(|| dim_cell("-"), Cell::new),
        ];
        row.extend(cells.iter().map(|value| {
            if value.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(value)
            }
        }));
        table.add_row(row);
    }
    table
}

pub fn print_sparsity(report: &SparsityReport) {
    println!("{}", sparsity_table(report));
}

pub fn sparsity_table(report: &SparsityReport) -> Table {
    let mut header = vec![header_cell(&report.by)];
    header.extend(report.columns.iter().map(|name| header_cell(name)));
    header.push(header_cell("total"));
    let mut table = Table::new();
    table.set_header(header);
    apply_table_style(&mut table);
    for index in 1..=report.columns.len() + 1 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for row in &report.rows {
        let mut cells = vec![match &row.key {
            Some(key) => Cell::new(key),
            None => dim_cell("(null)"),
        }];
        cells.extend(row.non_null.iter().map(|&count| Cell::new(count)));
        cells.push(Cell::new(row.total).add_attribute(Attribute::Bold));
        table.add_row(cells);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
