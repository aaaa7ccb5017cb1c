//! Import configuration and target field declarations.

use crate::import::validation::FieldValidation;
use serde::{Deserialize, Serialize};

/// Wizard options; `Default` carries the standard import settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpreadsheetImportOptions {
    pub auto_map_headers: bool,
    pub allow_invalid_submit: bool,
    /// Maximum Levenshtein distance for automatic header matching.
    pub auto_map_distance: usize,
    /// Data row ceiling; `0` disables the check.
    pub max_records: usize,
    /// Spreadsheet-style pattern (`yyyy-mm-dd`) date cells are rewritten to.
    pub date_format: String,
    /// Keep cell text verbatim; `false` applies `date_format`.
    pub parse_raw: bool,
    /// Let the user pick the header row instead of using the first row.
    pub select_header: bool,
}

impl Default for SpreadsheetImportOptions {
    fn default() -> Self {
        Self {
            auto_map_headers: true,
            allow_invalid_submit: true,
            auto_map_distance: 2,
            max_records: 2000,
            date_format: "yyyy-mm-dd".to_string(),
            parse_raw: true,
            select_header: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

/// How an imported cell is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ImportFieldType {
    Input,
    Checkbox,
    Select { options: Vec<SelectOption> },
}

/// One importable target field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportField {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub alternate_matches: Vec<String>,
    pub field_type: ImportFieldType,
    #[serde(default)]
    pub validations: Vec<FieldValidation>,
}

impl ImportField {
    pub fn input(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            alternate_matches: Vec::new(),
            field_type: ImportFieldType::Input,
            validations: Vec::new(),
        }
    }

    pub fn with_type(mut self, field_type: ImportFieldType) -> Self {
        self.field_type = field_type;
        self
    }

    pub fn with_alternate_matches(mut self, matches: &[&str]) -> Self {
        self.alternate_matches = matches.iter().map(|item| item.to_string()).collect();
        self
    }

    pub fn with_validation(mut self, validation: FieldValidation) -> Self {
        self.validations.push(validation);
        self
    }
}
