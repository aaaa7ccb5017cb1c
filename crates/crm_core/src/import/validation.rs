//! Per-field validation of imported records.
//!
//! # Invariants
//! - Every row keeps its index; errors never reorder or drop rows.
//! - At most one error is reported per (row, field), the first failing rule.

use crate::import::columns::ImportedRecord;
use crate::import::options::ImportField;
use crate::import::step::StepError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

const REQUIRED_MESSAGE: &str = "Field is required";
const UNIQUE_MESSAGE: &str = "Field must be unique";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum FieldValidation {
    #[serde(rename_all = "camelCase")]
    Required {
        #[serde(default)]
        error_message: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Unique {
        #[serde(default)]
        error_message: Option<String>,
        /// Empty values do not count as duplicates.
        #[serde(default)]
        allow_empty: bool,
    },
    #[serde(rename_all = "camelCase")]
    Regex {
        value: String,
        #[serde(default)]
        error_message: Option<String>,
    },
}

impl FieldValidation {
    pub fn required() -> Self {
        Self::Required {
            error_message: None,
        }
    }

    pub fn unique() -> Self {
        Self::Unique {
            error_message: None,
            allow_empty: true,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Regex {
            value: pattern.into(),
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub row_index: usize,
    pub field_key: String,
    pub message: String,
}

/// Records plus the errors found in them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub records: Vec<ImportedRecord>,
    pub errors: Vec<RowError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors_for_row(&self, row_index: usize) -> Vec<&RowError> {
        self.errors
            .iter()
            .filter(|error| error.row_index == row_index)
            .collect()
    }

    /// Records without any error, in their original order.
    pub fn valid_records(&self) -> Vec<&ImportedRecord> {
        self.records
            .iter()
            .enumerate()
            .filter(|(index, _)| self.errors.iter().all(|error| error.row_index != *index))
            .map(|(_, record)| record)
            .collect()
    }

    /// Submission is allowed when everything validates or invalid rows may be submitted.
    pub fn can_submit(&self, allow_invalid_submit: bool) -> bool {
        allow_invalid_submit || self.is_valid()
    }
}

/// Runs every field's validations over `records`.
pub fn validate_records(
    records: Vec<ImportedRecord>,
    fields: &[ImportField],
) -> Result<ValidationReport, StepError> {
    let mut found: BTreeMap<(usize, String), String> = BTreeMap::new();

    for field in fields {
        for validation in &field.validations {
            let failures = match validation {
                FieldValidation::Required { error_message } => {
                    let message = error_message.as_deref().unwrap_or(REQUIRED_MESSAGE);
                    records
                        .iter()
                        .enumerate()
                        .filter(|(_, record)| is_empty(record.get(&field.key)))
                        .map(|(index, _)| (index, message.to_string()))
                        .collect::<Vec<_>>()
                }
                FieldValidation::Unique {
                    error_message,
                    allow_empty,
                } => {
                    let message = error_message.as_deref().unwrap_or(UNIQUE_MESSAGE);
                    let mut counts: HashMap<String, usize> = HashMap::new();
                    let keys: Vec<Option<String>> = records
                        .iter()
                        .map(|record| {
                            let value = record.get(&field.key);
                            if *allow_empty && is_empty(value) {
                                None
                            } else {
                                Some(value_text(value))
                            }
                        })
                        .collect();
                    for key in keys.iter().flatten() {
                        *counts.entry(key.clone()).or_default() += 1;
                    }
                    keys.iter()
                        .enumerate()
                        .filter_map(|(index, key)| {
                            let key = key.as_ref()?;
                            (counts.get(key).copied().unwrap_or(0) > 1)
                                .then(|| (index, message.to_string()))
                        })
                        .collect()
                }
                FieldValidation::Regex {
                    value: pattern,
                    error_message,
                } => {
                    let regex = Regex::new(pattern).map_err(|err| StepError::InvalidPattern {
                        field_key: field.key.clone(),
                        reason: err.to_string(),
                    })?;
                    let message = error_message
                        .clone()
                        .unwrap_or_else(|| format!("Field did not match the regex /{pattern}/"));
                    records
                        .iter()
                        .enumerate()
                        .filter(|(_, record)| {
                            let value = record.get(&field.key);
                            !is_empty(value) && !regex.is_match(&value_text(value))
                        })
                        .map(|(index, _)| (index, message.clone()))
                        .collect()
                }
            };

            for (index, message) in failures {
                found.entry((index, field.key.clone())).or_insert(message);
            }
        }
    }

    let errors = found
        .into_iter()
        .map(|((row_index, field_key), message)| RowError {
            row_index,
            field_key,
            message,
        })
        .collect();
    Ok(ValidationReport { records, errors })
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
