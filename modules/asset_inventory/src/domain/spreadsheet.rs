//! Spreadsheet codec: xlsx/xls/ods in via calamine, xlsx out via rust_xlsxwriter

use crate::contract::TableSnapshot;
use anyhow::Result;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDateTime;
use rust_xlsxwriter::Workbook;
use std::collections::HashSet;
use std::io::Cursor;

/// Excel limits worksheet names to 31 characters
const MAX_SHEET_NAME: usize = 31;

/// A decoded cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Textual rendering used when a cell lands in a text column
    pub fn render(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Self::Empty,
            Data::Bool(b) => Self::Bool(*b),
            Data::Int(i) => Self::Int(*i),
            Data::Float(f) => Self::Float(*f),
            Data::String(s) => Self::Text(s.clone()),
            Data::DateTime(dt) => dt.as_datetime().map(Self::DateTime).unwrap_or(Self::Empty),
            Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .map(Self::DateTime)
                .unwrap_or_else(|_| Self::Text(s.clone())),
            Data::DurationIso(s) => Self::Text(s.clone()),
        }
    }
}

/// One worksheet: header row plus data rows
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Decode every worksheet of a workbook. The first row is the header;
/// blank rows are dropped.
pub fn read_workbook(bytes: Vec<u8>) -> Result<Vec<Sheet>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let mut sheets = Vec::new();

    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let mut rows = range.rows();

        let headers: Vec<String> = match rows.next() {
            Some(header) => header
                .iter()
                .enumerate()
                .map(|(i, h)| match h {
                    Data::Empty => format!("column_{}", i + 1),
                    other => other.to_string(),
                })
                .collect(),
            None => Vec::new(),
        };

        let rows: Vec<Vec<Cell>> = rows
            .map(|row| row.iter().map(Cell::from).collect::<Vec<_>>())
            .filter(|row| !row.iter().all(Cell::is_empty))
            .collect();

        sheets.push(Sheet {
            name,
            headers,
            rows,
        });
    }

    Ok(sheets)
}

/// Truncate `name` to the worksheet limit, appending `~N` when the result
/// collides (case-insensitively) with a name already in `used`.
fn unique_sheet_name(name: &str, used: &mut HashSet<String>) -> String {
    let mut candidate: String = name.chars().take(MAX_SHEET_NAME).collect();
    let mut n = 2;
    while !used.insert(candidate.to_lowercase()) {
        let suffix = format!("~{}", n);
        let base: String = name
            .chars()
            .take(MAX_SHEET_NAME - suffix.chars().count())
            .collect();
        candidate = format!("{}{}", base, suffix);
        n += 1;
    }
    candidate
}

/// Encode tables as an xlsx workbook, one worksheet per table named after it
pub fn write_workbook(tables: &[TableSnapshot]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let mut used = HashSet::new();

    for table in tables {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(unique_sheet_name(&table.name, &mut used))?;

        for (col, column) in table.columns.iter().enumerate() {
            worksheet.write_string(0, col as u16, column.as_str())?;
        }

        for (r, row) in table.rows.iter().enumerate() {
            let excel_row = (r + 1) as u32;
            for (col, column) in table.columns.iter().enumerate() {
                let col = col as u16;
                match row.get(column) {
                    None | Some(serde_json::Value::Null) => {}
                    Some(serde_json::Value::Bool(b)) => {
                        worksheet.write_boolean(excel_row, col, *b)?;
                    }
                    Some(serde_json::Value::Number(n)) => {
                        if let Some(f) = n.as_f64() {
                            worksheet.write_number(excel_row, col, f)?;
                        }
                    }
                    Some(serde_json::Value::String(s)) => {
                        worksheet.write_string(excel_row, col, s.as_str())?;
                    }
                    Some(other) => {
                        worksheet.write_string(excel_row, col, other.to_string())?;
                    }
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
