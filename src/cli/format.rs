use std::cmp;

use anyhow::Result;

use crate::models::{Record, SearchResult, TableInfo};

/// Render a `SearchResult` in human-readable text form.
///
/// Each matching row is printed as a block of `column: value` lines
/// separated by a blank line, followed by a total line. Missing cells
/// are shown as `-`.
pub fn print_text(result: &SearchResult) -> Result<()> {
    for (idx, record) in result.resultados.iter().enumerate() {
        if idx > 0 {
            println!();
        }

        let name_width = record
            .fields()
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0);

        for (name, value) in record.fields() {
            println!(
                "{:<name_width$} : {}",
                name,
                value.as_deref().unwrap_or("-")
            );
        }
    }

    if !result.resultados.is_empty() {
        println!();
    }
    println!("total: {}", result.total);

    Ok(())
}

/// Render a `SearchResult` as a simple table with one column per
/// table column, in table order, followed by a total line.
pub fn print_table(result: &SearchResult) -> Result<()> {
    for line in table_lines(result) {
        println!("{line}");
    }
    println!("total: {}", result.total);

    Ok(())
}

fn table_lines(result: &SearchResult) -> Vec<String> {
    let Some(first) = result.resultados.first() else {
        return Vec::new();
    };

    const MAX_CELL_WIDTH: usize = 30;

    let headers: Vec<&str> = first.fields().iter().map(|(name, _)| name.as_str()).collect();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let max_value = result
                .resultados
                .iter()
                .map(|record| cell(record, col).chars().count())
                .max()
                .unwrap_or(0);
            cmp::min(cmp::max(header.chars().count(), max_value), MAX_CELL_WIDTH)
        })
        .collect();

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad(&truncate(header, *width), *width))
        .collect();
    let mut lines = vec![header_line.join(" ").trim_end().to_string()];

    for record in &result.resultados {
        let line: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(col, width)| pad(&truncate(cell(record, col), *width), *width))
            .collect();
        lines.push(line.join(" ").trim_end().to_string());
    }

    lines
}

/// Render a `TableInfo` in human-readable text form.
pub fn print_info_text(info: &TableInfo) -> Result<()> {
    println!("source    : {}", info.source.display());
    println!("delimiter : {}", info.delimiter);
    println!("rows      : {}", info.rows);
    if let Some(loaded_at) = &info.loaded_at {
        println!("loaded_at : {loaded_at}");
    }
    println!("columns   : {}", info.columns.len());
    for name in &info.columns {
        println!("  {name}");
    }

    Ok(())
}

fn cell(record: &Record, col: usize) -> &str {
    record
        .fields()
        .get(col)
        .and_then(|(_, value)| value.as_deref())
        .unwrap_or("")
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}

fn truncate(s: &str, max_width: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_width {
        s.to_string()
    } else if max_width <= 1 {
        "…".to_string()
    } else {
        s.chars()
            .take(max_width.saturating_sub(1))
            .collect::<String>()
            + "…"
    }
}
