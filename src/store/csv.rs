//! Minimal CSV codec for bulk import/export
//!
//! Fields are comma-separated; a field containing a comma, quote or line
//! break is wrapped in double quotes with inner quotes doubled. The first
//! row is the header.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::types::ServiceError;

/// Columns whose cells hold JSON (written as JSON, parsed back on import)
const STRUCTURED_COLUMNS: [&str; 2] = ["comments", "tags"];

/// Parse CSV text into one JSON object per data row. Empty cells are
/// omitted so defaults apply downstream.
pub fn parse(text: &str) -> Result<Vec<Map<String, Value>>, ServiceError> {
    let mut rows = split_rows(text)?.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();
    if header.iter().all(|h| h.is_empty()) {
        return Err(ServiceError::BadRequest("CSV header row is empty".into()));
    }

    let mut records = Vec::new();
    for (line, row) in rows.enumerate() {
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        if row.len() > header.len() {
            return Err(ServiceError::BadRequest(format!(
                "CSV row {} has {} fields, header has {}",
                line + 2,
                row.len(),
                header.len()
            )));
        }

        let mut record = Map::new();
        for (column, cell) in header.iter().zip(row) {
            if column.is_empty() || cell.is_empty() {
                continue;
            }
            record.insert(column.clone(), cell_value(column, cell));
        }
        records.push(record);
    }
    Ok(records)
}

fn cell_value(column: &str, cell: String) -> Value {
    if STRUCTURED_COLUMNS.contains(&column) {
        if let Ok(parsed) = serde_json::from_str::<Value>(&cell) {
            return parsed;
        }
    }
    Value::String(cell)
}

fn split_rows(text: &str) -> Result<Vec<Vec<String>>, ServiceError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ServiceError::BadRequest("Unterminated quoted CSV field".into()));
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}

/// Render records as CSV. The header is the sorted union of all keys;
/// `None` when there is nothing to export.
pub fn write(records: &[Map<String, Value>]) -> Option<String> {
    if records.is_empty() {
        return None;
    }

    let columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.keys().map(String::as_str))
        .collect();

    let mut out = String::new();
    push_row(&mut out, columns.iter().map(|c| c.to_string()));
    for record in records {
        push_row(
            &mut out,
            columns.iter().map(|c| record.get(*c).map(render_cell).unwrap_or_default()),
        );
    }
    Some(out)
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>) {
    let line: Vec<String> = cells.map(|cell| escape(&cell)).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
