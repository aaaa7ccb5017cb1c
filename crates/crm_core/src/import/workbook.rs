//! In-memory workbook and sheet-to-rows mapping.

use crate::import::options::SpreadsheetImportOptions;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

const INPUT_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const INPUT_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Rows of raw cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Convenience constructor from string slices.
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        )
    }

    /// Rows after the header row.
    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

/// Uploaded workbook; `sheet_names` keeps the file's sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    pub sheet_names: Vec<String>,
    pub sheets: BTreeMap<String, Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sheet; a repeated name replaces the earlier sheet's rows.
    pub fn with_sheet(mut self, name: impl Into<String>, sheet: Sheet) -> Self {
        let name = name.into();
        if !self.sheets.contains_key(&name) {
            self.sheet_names.push(name.clone());
        }
        self.sheets.insert(name, sheet);
        self
    }

    pub fn is_single_sheet(&self) -> bool {
        self.sheet_names.len() == 1
    }

    pub fn first_sheet_name(&self) -> Option<&str> {
        self.sheet_names.first().map(String::as_str)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }
}

/// How cell text is read out of a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFormat {
    /// chrono pattern for date cells; `None` keeps cells verbatim.
    date_pattern: Option<String>,
}

impl CellFormat {
    pub fn raw() -> Self {
        Self { date_pattern: None }
    }

    /// Rewrites recognised date cells into a spreadsheet-style format such
    /// as `yyyy-mm-dd` or `dd/mm/yyyy`.
    pub fn dates_as(date_format: &str) -> Self {
        Self {
            date_pattern: Some(date_pattern(date_format)),
        }
    }

    pub fn from_options(options: &SpreadsheetImportOptions) -> Self {
        if options.parse_raw {
            Self::raw()
        } else {
            Self::dates_as(&options.date_format)
        }
    }

    fn read(&self, cell: &str) -> String {
        let cell = cell.trim();
        self.date_pattern
            .as_deref()
            .and_then(|pattern| parse_date(cell).map(|date| date.format(pattern).to_string()))
            .unwrap_or_else(|| cell.to_string())
    }
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(cell) {
        return Some(timestamp.date_naive());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(cell, INPUT_DATE_TIME_FORMAT) {
        return Some(timestamp.date());
    }
    INPUT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(cell, format).ok())
}

/// Translates `yyyy`/`yy`/`mm`/`m`/`dd`/`d` tokens into a chrono pattern.
fn date_pattern(date_format: &str) -> String {
    const TOKENS: [(&str, &str); 6] = [
        ("yyyy", "%Y"),
        ("yy", "%y"),
        ("mm", "%m"),
        ("dd", "%d"),
        ("m", "%-m"),
        ("d", "%-d"),
    ];

    let mut pattern = String::with_capacity(date_format.len() * 2);
    let mut rest = date_format;
    while let Some(ch) = rest.chars().next() {
        let token = TOKENS.iter().find(|(token, _)| {
            rest.get(..token.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(token))
        });
        match token {
            Some((token, spec)) => {
                pattern.push_str(spec);
                rest = &rest[token.len()..];
            }
            None => {
                if ch == '%' {
                    pattern.push_str("%%");
                } else {
                    pattern.push(ch);
                }
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    pattern
}

/// Rows of `sheet_name` (first sheet when `None`) with trimmed cells read
/// through `format`. Blank rows are dropped; an unknown sheet maps to no rows.
pub fn map_workbook(
    workbook: &Workbook,
    sheet_name: Option<&str>,
    format: &CellFormat,
) -> Vec<Vec<String>> {
    let Some(sheet) = sheet_name
        .or_else(|| workbook.first_sheet_name())
        .and_then(|name| workbook.sheet(name))
    else {
        return Vec::new();
    };

    sheet
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| format.read(cell)).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect()
}

/// Returns whether the sheet holds more data rows than `max_records`.
pub fn exceeds_max_records(sheet: &Sheet, max_records: usize) -> bool {
    sheet.data_row_count() > max_records
}
