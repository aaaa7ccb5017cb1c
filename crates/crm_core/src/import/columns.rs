//! Header-to-field matching and row normalization.
//!
//! # Invariants
//! - A field key is matched by at most one column.
//! - Ignored and unmatched columns never reach imported records.

use crate::import::options::{ImportField, ImportFieldType, SelectOption};
use serde_json::{Map, Value};

/// One imported row keyed by field key.
pub type ImportedRecord = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// Not matched yet.
    Empty,
    /// Explicitly skipped by the user.
    Ignored,
    Matched { field_key: String },
}

/// One spreadsheet column and its match state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub index: usize,
    pub header: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn empty(index: usize, header: impl Into<String>) -> Self {
        Self {
            index,
            header: header.into(),
            kind: ColumnKind::Empty,
        }
    }

    pub fn matched_key(&self) -> Option<&str> {
        match &self.kind {
            ColumnKind::Matched { field_key } => Some(field_key),
            ColumnKind::Empty | ColumnKind::Ignored => None,
        }
    }
}

/// Builds columns for `headers`, auto-matching each to the closest field
/// within `auto_map_distance` edits when `auto_map` is set.
pub fn auto_map_columns(
    headers: &[String],
    fields: &[ImportField],
    auto_map: bool,
    auto_map_distance: usize,
) -> Vec<Column> {
    let mut columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| Column::empty(index, header.clone()))
        .collect();
    if !auto_map {
        return columns;
    }

    let mut distances: Vec<Option<usize>> = vec![None; columns.len()];
    for index in 0..columns.len() {
        let Some((field_key, distance)) = closest_field(&columns[index].header, fields) else {
            continue;
        };
        if distance > auto_map_distance {
            continue;
        }

        let duplicate = columns
            .iter()
            .position(|column| column.matched_key() == Some(field_key));
        if let Some(previous) = duplicate {
            if distances[previous].unwrap_or(usize::MAX) <= distance {
                continue;
            }
            columns[previous].kind = ColumnKind::Empty;
            distances[previous] = None;
        }
        columns[index].kind = ColumnKind::Matched {
            field_key: field_key.to_string(),
        };
        distances[index] = Some(distance);
    }
    columns
}

/// Manually matches column `index` to `field_key`, unmatching any column
/// that held the key before.
pub fn set_column_match(columns: &mut [Column], index: usize, field_key: &str) {
    for column in columns.iter_mut() {
        if column.matched_key() == Some(field_key) {
            column.kind = ColumnKind::Empty;
        }
    }
    if let Some(column) = columns.get_mut(index) {
        column.kind = ColumnKind::Matched {
            field_key: field_key.to_string(),
        };
    }
}

pub fn ignore_column(columns: &mut [Column], index: usize) {
    if let Some(column) = columns.get_mut(index) {
        column.kind = ColumnKind::Ignored;
    }
}

/// Converts raw rows into records keyed by the matched fields.
pub fn normalize_table(
    rows: &[Vec<String>],
    columns: &[Column],
    fields: &[ImportField],
) -> Vec<ImportedRecord> {
    rows.iter()
        .map(|row| {
            let mut record = ImportedRecord::new();
            for column in columns {
                let Some(field_key) = column.matched_key() else {
                    continue;
                };
                let Some(field) = fields.iter().find(|field| field.key == field_key) else {
                    continue;
                };
                let raw = row.get(column.index).map(String::as_str).unwrap_or_default();
                record.insert(field_key.to_string(), normalize_cell(raw, &field.field_type));
            }
            record
        })
        .collect()
}

fn normalize_cell(raw: &str, field_type: &ImportFieldType) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match field_type {
        ImportFieldType::Input => Value::String(trimmed.to_string()),
        ImportFieldType::Checkbox => parse_boolean(trimmed).map_or(Value::Null, Value::Bool),
        ImportFieldType::Select { options } => {
            match_option(options, trimmed).map_or(Value::Null, |option| {
                Value::String(option.value.clone())
            })
        }
    }
}

fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

fn match_option<'o>(options: &'o [SelectOption], raw: &str) -> Option<&'o SelectOption> {
    options.iter().find(|option| {
        option.value.eq_ignore_ascii_case(raw) || option.label.eq_ignore_ascii_case(raw)
    })
}

fn closest_field<'f>(header: &str, fields: &'f [ImportField]) -> Option<(&'f str, usize)> {
    let header = header.trim().to_lowercase();
    let mut best: Option<(&str, usize)> = None;
    for field in fields {
        let distance = std::iter::once(&field.key)
            .chain(std::iter::once(&field.label))
            .chain(field.alternate_matches.iter())
            .map(|candidate| levenshtein(&candidate.trim().to_lowercase(), &header))
            .min()
            .unwrap_or(usize::MAX);
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((field.key.as_str(), distance));
        }
    }
    best
}

/// Edit distance between two strings, counted in chars.
pub fn levenshtein(left: &str, right: &str) -> usize {
    let right: Vec<char> = right.chars().collect();
    let mut previous: Vec<usize> = (0..=right.len()).collect();
    let mut current = vec![0; right.len() + 1];

    for (i, left_char) in left.chars().enumerate() {
        current[0] = i + 1;
        for (j, right_char) in right.iter().enumerate() {
            let substitution = previous[j] + usize::from(left_char != *right_char);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[right.len()]
}

#[cfg(test)]
mod tests {
    use super::{
        auto_map_columns, ignore_column, levenshtein, normalize_table, set_column_match,
        ColumnKind,
    };
    use crate::import::options::{ImportField, ImportFieldType, SelectOption};
    use serde_json::{json, Value};

    fn fields() -> Vec<ImportField> {
        vec![
            ImportField::input("firstName", "First name").with_alternate_matches(&["given name"]),
            ImportField::input("email", "Email"),
            ImportField::input("optIn", "Opt in").with_type(ImportFieldType::Checkbox),
            ImportField::input("stage", "Stage").with_type(ImportFieldType::Select {
                options: vec![SelectOption {
                    label: "Won".to_string(),
                    value: "WON".to_string(),
                }],
            }),
        ]
    }

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn levenshtein_counts_edits() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("email", "email"), 0);
    }

    #[test]
    fn auto_map_matches_close_headers_once() {
        let columns = auto_map_columns(
            &headers(&["Emial", "Given Name", "email", "Notes"]),
            &fields(),
            true,
            2,
        );
        assert_eq!(columns[0].kind, ColumnKind::Empty);
        assert_eq!(columns[1].matched_key(), Some("firstName"));
        assert_eq!(columns[2].matched_key(), Some("email"));
        assert_eq!(columns[3].kind, ColumnKind::Empty);
    }

    #[test]
    fn auto_map_can_be_disabled() {
        let columns = auto_map_columns(&headers(&["email"]), &fields(), false, 2);
        assert_eq!(columns[0].kind, ColumnKind::Empty);
    }

    #[test]
    fn normalize_table_uses_matched_columns_only() {
        let mut columns = auto_map_columns(
            &headers(&["email", "opt in", "stage", "junk"]),
            &fields(),
            true,
            2,
        );
        ignore_column(&mut columns, 3);
        set_column_match(&mut columns, 3, "email");
        assert_eq!(columns[0].kind, ColumnKind::Empty);

        let rows = vec![vec![
            "old@x.io".to_string(),
            "Yes".to_string(),
            "won".to_string(),
            "new@x.io".to_string(),
        ]];
        let records = normalize_table(&rows, &columns, &fields());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("email"), Some(&json!("new@x.io")));
        assert_eq!(records[0].get("optIn"), Some(&Value::Bool(true)));
        assert_eq!(records[0].get("stage"), Some(&json!("WON")));
        assert!(records[0].get("firstName").is_none());
    }
}
