//! Spreadsheet import: workbook mapping, column matching, validation and
//! the step machine driving the import wizard.
//!
//! # Responsibility
//! - Turn an uploaded workbook into validated records keyed by field.
//! - Keep step transitions pure; hooks run in the wizard and feed results in.

pub mod columns;
pub mod options;
pub mod step;
pub mod validation;
pub mod wizard;
pub mod workbook;

pub use columns::{auto_map_columns, normalize_table, Column, ColumnKind, ImportedRecord};
pub use options::{ImportField, ImportFieldType, SelectOption, SpreadsheetImportOptions};
pub use step::{transition, ImportStep, StepError, StepEvent, StepKind, WizardState};
pub use validation::{validate_records, FieldValidation, RowError, ValidationReport};
pub use wizard::{
    ImportHooks, ImportSubmission, ImportWizard, Notification, PassThroughHooks, SelectHeaderResult,
};
pub use workbook::{exceeds_max_records, map_workbook, CellFormat, Sheet, Workbook};
