//! Rendering core tables to text or CSV.

use std::io::Write;

use fwaudit_model::{ModelError, ProgressSink, Table};
use prettytable::{format, Cell as PtCell, Row as PtRow, Table as PtTable};

/// Wraps a line at the given width, breaking on spaces where possible.
/// A width of 0 disables wrapping.
fn wrap_line(line: &str, width: usize, out: &mut Vec<String>) {
    if width == 0 || line.chars().count() <= width {
        out.push(line.to_string());
        return;
    }

    let mut current = String::new();
    for word in line.split(' ') {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

fn cell_text(cell: &fwaudit_model::Cell, wrap: usize) -> String {
    let mut lines = Vec::new();
    for line in cell.lines() {
        wrap_line(line, wrap, &mut lines);
    }
    lines.join("\n")
}

/// Renders a core table as bordered text. The interrupt query is polled
/// per row; a cancelled render discards its output.
pub fn write_text(
    table: &Table,
    out: &mut dyn Write,
    interrupt: &dyn Fn() -> bool,
) -> Result<(), ModelError> {
    let mut pt = PtTable::new();
    pt.set_format(*format::consts::FORMAT_BOX_CHARS);
    pt.set_titles(PtRow::new(
        table.headers().iter().map(|h| PtCell::new(h)).collect(),
    ));

    for row in table.rows() {
        if interrupt() {
            return Err(ModelError::Interrupted);
        }
        let cells = row
            .cells()
            .iter()
            .zip(table.wrap_positions())
            .map(|(cell, &wrap)| PtCell::new(&cell_text(cell, wrap)))
            .collect();
        pt.add_row(PtRow::new(cells));
    }

    let _ = pt.print(out);
    let _ = writeln!(out, "{} row(s)", table.len());
    Ok(())
}

/// Renders a core table as CSV, one record per row; multi-line cells are
/// flattened with the list delimiter.
pub fn write_csv(
    table: &Table,
    out: &mut dyn Write,
    list_delimiter: char,
    interrupt: &dyn Fn() -> bool,
) -> Result<(), ModelError> {
    let mut writer = csv::Writer::from_writer(out);
    let _ = writer.write_record(table.headers());

    for row in table.rows() {
        if interrupt() {
            return Err(ModelError::Interrupted);
        }
        let record: Vec<String> = row
            .cells()
            .iter()
            .map(|cell| {
                cell.lines()
                    .collect::<Vec<_>>()
                    .join(&list_delimiter.to_string())
            })
            .collect();
        let _ = writer.write_record(&record);
    }
    let _ = writer.flush();
    Ok(())
}

/// The anomaly pass ticker: a dot per rule, a plus every ten, a star
/// every hundred.
pub struct ConsoleTicker;

impl ProgressSink for ConsoleTicker {
    fn tick(&self, processed: usize) {
        let mark = if processed % 100 == 0 {
            '*'
        } else if processed % 10 == 0 {
            '+'
        } else {
            '.'
        };
        print!("{mark}");
        let _ = std::io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_long_details() {
        let mut out = Vec::new();
        wrap_line("part of packets are denied by combined rules 1, 2, 3", 20, &mut out);
        assert!(out.len() > 1);
        assert!(out.iter().all(|l| l.chars().count() <= 20));
    }

    #[test]
    fn csv_flattens_multi_line_cells() {
        let mut table = Table::new(vec!["id", "zones"]);
        let row = table.add_row();
        row.cell(0).append("1");
        row.cell(1).append_line("inside").append("outside");

        let mut buffer = Vec::new();
        write_csv(&table, &mut buffer, ';', &|| false).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("inside;outside"));
    }
}
