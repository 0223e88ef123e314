//! Conversion between a roster and the value grid of a spreadsheet tab.
//!
//! The first grid row is the header. Only the six known columns are read or
//! written; anything else found in the sheet is dropped on load.

use serde_json::Value;

use crate::guest::{Attendance, Category, GuestId, GuestRecord};
use crate::roster::Roster;

pub const COL_ID: &str = "ID";
pub const COL_TABLE: &str = "Mesa";
pub const COL_NAME: &str = "Nombre";
pub const COL_CATEGORY: &str = "Categoria";
pub const COL_NOTES: &str = "Observaciones";
pub const COL_ATTENDED: &str = "Asistio";

/// Persisted columns, in sheet order.
pub const COLUMNS: [&str; 6] = [
    COL_ID,
    COL_TABLE,
    COL_NAME,
    COL_CATEGORY,
    COL_NOTES,
    COL_ATTENDED,
];

/// Render a raw cell value the way the sheet displays it.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Build a roster from a header row plus data rows
///
/// Missing columns and short rows read as empty strings, blank rows are
/// skipped, and guests without a usable id get a fresh one.
pub fn roster_from_grid(grid: &[Vec<String>]) -> Roster {
    let Some((header, rows)) = grid.split_first() else {
        return Roster::new();
    };

    let positions: Vec<Option<usize>> = COLUMNS
        .iter()
        .map(|col| header.iter().position(|h| h.trim() == *col))
        .collect();

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let cell = |i: usize| -> String {
            positions[i]
                .and_then(|p| row.get(p))
                .cloned()
                .unwrap_or_default()
        };
        records.push(GuestRecord {
            id: GuestId::new(cell(0).trim()),
            table: cell(1),
            name: cell(2),
            category: Category::from_label(&cell(3)),
            notes: cell(4),
            attended: Attendance::from_label(&cell(5)),
        });
    }

    let mut roster = Roster::from_records(records);
    roster.repair_ids();
    roster
}

/// Header row plus one row per guest, in roster order.
pub fn roster_to_grid(roster: &Roster) -> Vec<Vec<String>> {
    let mut grid = Vec::with_capacity(roster.len() + 1);
    grid.push(COLUMNS.iter().map(|c| c.to_string()).collect());
    for g in roster.records() {
        grid.push(vec![
            g.id.to_string(),
            g.table.clone(),
            g.name.clone(),
            g.category.label().to_string(),
            g.notes.clone(),
            g.attended.label().to_string(),
        ]);
    }
    grid
}
