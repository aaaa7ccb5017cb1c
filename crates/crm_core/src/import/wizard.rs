//! Import wizard: runs step hooks and feeds their results into the step machine.
//!
//! # Responsibility
//! - Enforce the record ceiling before sheet data moves forward.
//! - Run hooks outside `transition` and convert failures into notifications.
//!
//! # Invariants
//! - A failed continuation leaves the step unchanged and queues exactly one
//!   error notification.

use crate::import::columns::{auto_map_columns, normalize_table, Column, ImportedRecord};
use crate::import::options::{ImportField, SpreadsheetImportOptions};
use crate::import::step::{
    check_max_records, transition, ImportStep, StepError, StepEvent, StepKind, WizardState,
};
use crate::import::validation::{validate_records, ValidationReport};
use crate::import::workbook::{map_workbook, CellFormat, Workbook};
use log::{info, warn};

const ERROR_TITLE: &str = "Error";

/// Header row and data rows returned by the select-header hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectHeaderResult {
    pub header_row: Vec<String>,
    pub imported_rows: Vec<Vec<String>>,
}

/// Caller-provided transforms run between steps. Failures carry a
/// user-facing message.
pub trait ImportHooks {
    fn upload_step_hook(&self, data: Vec<Vec<String>>) -> Result<Vec<Vec<String>>, String> {
        Ok(data)
    }

    fn select_header_step_hook(
        &self,
        header_values: Vec<String>,
        data: Vec<Vec<String>>,
    ) -> Result<SelectHeaderResult, String> {
        Ok(SelectHeaderResult {
            header_row: header_values,
            imported_rows: data,
        })
    }

    fn match_columns_step_hook(
        &self,
        table: Vec<ImportedRecord>,
        _raw_data: &[Vec<String>],
        _columns: &[Column],
    ) -> Result<Vec<ImportedRecord>, String> {
        Ok(table)
    }
}

/// Hooks that return their input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughHooks;

impl ImportHooks for PassThroughHooks {}

/// Transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Error { title: String, description: String },
}

/// Rows handed to the caller on submit.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSubmission {
    pub valid: Vec<ImportedRecord>,
    pub invalid: Vec<ImportedRecord>,
}

pub struct ImportWizard<H> {
    options: SpreadsheetImportOptions,
    fields: Vec<ImportField>,
    hooks: H,
    state: WizardState,
    uploaded_file_name: Option<String>,
    notifications: Vec<Notification>,
}

impl<H: ImportHooks> ImportWizard<H> {
    pub fn new(options: SpreadsheetImportOptions, fields: Vec<ImportField>, hooks: H) -> Self {
        Self {
            options,
            fields,
            hooks,
            state: WizardState::default(),
            uploaded_file_name: None,
            notifications: Vec::new(),
        }
    }

    /// Starts from `initial` instead of the upload step.
    pub fn with_initial_step(mut self, initial: ImportStep) -> Self {
        self.state = WizardState::new(initial);
        self
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> &ImportStep {
        &self.state.current
    }

    pub fn kind(&self) -> StepKind {
        self.state.kind()
    }

    pub fn options(&self) -> &SpreadsheetImportOptions {
        &self.options
    }

    pub fn uploaded_file_name(&self) -> Option<&str> {
        self.uploaded_file_name.as_deref()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Upload step continuation.
    pub fn upload(&mut self, file_name: impl Into<String>, workbook: Workbook) -> Result<StepKind, StepError> {
        if self.kind() != StepKind::Upload {
            return self.reject(StepError::InvalidEvent {
                step: self.kind(),
                event: "upload",
            });
        }
        self.uploaded_file_name = Some(file_name.into());

        if !workbook.is_single_sheet() {
            return self.apply(StepEvent::WorkbookUploaded { workbook });
        }

        let event = self.map_single_sheet(&workbook);
        match event {
            Ok(event) => self.apply(event),
            Err(err) => self.reject(err),
        }
    }

    /// Select-sheet step continuation.
    pub fn select_sheet(&mut self, sheet_name: &str) -> Result<StepKind, StepError> {
        let ImportStep::SelectSheet { workbook } = &self.state.current else {
            return self.reject(StepError::InvalidEvent {
                step: self.kind(),
                event: "select_sheet",
            });
        };
        let event = match workbook.sheet(sheet_name) {
            None => Err(StepError::UnknownSheet(sheet_name.to_string())),
            Some(sheet) => check_max_records(sheet, self.options.max_records).and_then(|_| {
                self.hooks
                    .upload_step_hook(map_workbook(
                        workbook,
                        Some(sheet_name),
                        &CellFormat::from_options(&self.options),
                    ))
                    .map(|data| StepEvent::RowsMapped { data })
                    .map_err(StepError::Hook)
            }),
        };
        match event {
            Ok(event) => self.apply(event),
            Err(err) => self.reject(err),
        }
    }

    /// Select-header step continuation; rows above the header are dropped.
    pub fn select_header_row(&mut self, header_index: usize) -> Result<StepKind, StepError> {
        let ImportStep::SelectHeader { data } = &self.state.current else {
            return self.reject(StepError::InvalidEvent {
                step: self.kind(),
                event: "select_header",
            });
        };
        let Some(header_values) = data.get(header_index).cloned() else {
            let rows = data.len();
            return self.reject(StepError::HeaderRowOutOfRange {
                index: header_index,
                rows,
            });
        };
        let rows = data[header_index + 1..].to_vec();
        let event = self.run_select_header_hook(header_values, rows);
        match event {
            Ok(event) => self.apply(event),
            Err(err) => self.reject(err),
        }
    }

    /// Columns proposed for the current header, auto-matched per options.
    pub fn suggested_columns(&self) -> Vec<Column> {
        match &self.state.current {
            ImportStep::MatchColumns { header_values, .. } => auto_map_columns(
                header_values,
                &self.fields,
                self.options.auto_map_headers,
                self.options.auto_map_distance,
            ),
            _ => Vec::new(),
        }
    }

    /// Match-columns step continuation.
    pub fn match_columns(&mut self, columns: Vec<Column>) -> Result<StepKind, StepError> {
        let ImportStep::MatchColumns { data, .. } = &self.state.current else {
            return self.reject(StepError::InvalidEvent {
                step: self.kind(),
                event: "match_columns",
            });
        };
        let table = normalize_table(data, &columns, &self.fields);
        let event = self
            .hooks
            .match_columns_step_hook(table, data, &columns)
            .map(|data| StepEvent::ColumnsMatched {
                data,
                imported_columns: columns,
            })
            .map_err(StepError::Hook);
        match event {
            Ok(event) => self.apply(event),
            Err(err) => self.reject(err),
        }
    }

    /// Validation of the rows in the validate-data step.
    pub fn validation_report(&self) -> Result<ValidationReport, StepError> {
        let ImportStep::ValidateData { data, .. } = &self.state.current else {
            return Err(StepError::InvalidEvent {
                step: self.kind(),
                event: "validate",
            });
        };
        if self.uploaded_file_name.is_none() {
            return Err(StepError::FileNotFound);
        }
        validate_records(data.clone(), &self.fields)
    }

    /// Starts submission: moves to `Loading` and hands back the rows.
    pub fn submit(&mut self) -> Result<ImportSubmission, StepError> {
        let report = match self.validation_report() {
            Ok(report) => report,
            Err(err) => return self.reject(err),
        };
        if !report.can_submit(self.options.allow_invalid_submit) {
            let invalid = report.records.len() - report.valid_records().len();
            return self.reject(StepError::InvalidRows(invalid));
        }

        let (valid, invalid): (Vec<_>, Vec<_>) = report
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| (report.errors_for_row(index).is_empty(), record.clone()))
            .partition(|(is_valid, _)| *is_valid);
        self.apply(StepEvent::SubmitStarted)?;
        info!(
            "event=import_submit module=import status=ok valid={} invalid={}",
            valid.len(),
            invalid.len()
        );
        Ok(ImportSubmission {
            valid: valid.into_iter().map(|(_, record)| record).collect(),
            invalid: invalid.into_iter().map(|(_, record)| record).collect(),
        })
    }

    pub fn back(&mut self) -> Result<StepKind, StepError> {
        self.apply(StepEvent::Back)
    }

    fn map_single_sheet(&self, workbook: &Workbook) -> Result<StepEvent, StepError> {
        let sheet = workbook
            .first_sheet_name()
            .and_then(|name| workbook.sheet(name))
            .ok_or(StepError::EmptyWorkbook)?;
        check_max_records(sheet, self.options.max_records)?;

        let format = CellFormat::from_options(&self.options);
        let mapped = self
            .hooks
            .upload_step_hook(map_workbook(workbook, None, &format))
            .map_err(StepError::Hook)?;
        if self.options.select_header {
            return Ok(StepEvent::RowsMapped { data: mapped });
        }

        let mut rows = mapped.into_iter();
        let header_values = rows.next().unwrap_or_default();
        self.run_select_header_hook(header_values, rows.collect())
    }

    fn run_select_header_hook(
        &self,
        header_values: Vec<String>,
        data: Vec<Vec<String>>,
    ) -> Result<StepEvent, StepError> {
        let result = self
            .hooks
            .select_header_step_hook(header_values, data)
            .map_err(StepError::Hook)?;
        Ok(StepEvent::HeaderSelected {
            header_values: result.header_row,
            data: result.imported_rows,
        })
    }

    fn apply(&mut self, event: StepEvent) -> Result<StepKind, StepError> {
        let from = self.kind();
        match transition(&self.state, event) {
            Ok(next) => {
                self.state = next;
                info!(
                    "event=import_step module=import status=ok from={} to={}",
                    from.as_str(),
                    self.kind().as_str()
                );
                Ok(self.kind())
            }
            Err(err) => self.reject(err),
        }
    }

    fn reject<T>(&mut self, err: StepError) -> Result<T, StepError> {
        warn!(
            "event=import_step module=import status=error step={} error_kind={}",
            self.kind().as_str(),
            error_kind(&err)
        );
        self.notifications.push(Notification::Error {
            title: ERROR_TITLE.to_string(),
            description: err.to_string(),
        });
        Err(err)
    }
}

fn error_kind(err: &StepError) -> &'static str {
    match err {
        StepError::TooManyRecords { .. } => "too_many_records",
        StepError::Hook(_) => "hook",
        StepError::InvalidEvent { .. } => "invalid_event",
        StepError::UnknownSheet(_) => "unknown_sheet",
        StepError::EmptyWorkbook => "empty_workbook",
        StepError::InvalidPattern { .. } => "invalid_pattern",
        StepError::FileNotFound => "file_not_found",
        StepError::InvalidRows(_) => "invalid_rows",
        StepError::HeaderRowOutOfRange { .. } => "header_row_out_of_range",
    }
}

#[cfg(test)]
mod tests {
    use super::{ImportHooks, ImportWizard, Notification, PassThroughHooks};
    use crate::import::options::{ImportField, SpreadsheetImportOptions};
    use crate::import::step::{ImportStep, StepError, StepKind};
    use crate::import::workbook::{Sheet, Workbook};

    struct FailingUploadHook;

    impl ImportHooks for FailingUploadHook {
        fn upload_step_hook(&self, _data: Vec<Vec<String>>) -> Result<Vec<Vec<String>>, String> {
            Err("upload hook exploded".to_string())
        }
    }

    fn people_sheet() -> Sheet {
        Sheet::from_rows(&[&["email"], &["a@x.io"], &["b@x.io"]])
    }

    #[test]
    fn single_sheet_upload_auto_selects_first_row_as_header() {
        let mut wizard = ImportWizard::new(
            SpreadsheetImportOptions::default(),
            vec![ImportField::input("email", "Email")],
            PassThroughHooks,
        );

        let kind = wizard
            .upload("people.csv", Workbook::new().with_sheet("Sheet1", people_sheet()))
            .expect("upload");

        assert_eq!(kind, StepKind::MatchColumns);
        match wizard.step() {
            ImportStep::MatchColumns { data, header_values } => {
                assert_eq!(header_values, &vec!["email".to_string()]);
                assert_eq!(data.len(), 2);
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert_eq!(wizard.suggested_columns()[0].matched_key(), Some("email"));
    }

    #[test]
    fn hook_failure_notifies_without_advancing() {
        let mut wizard = ImportWizard::new(
            SpreadsheetImportOptions::default(),
            Vec::new(),
            FailingUploadHook,
        );

        assert!(wizard
            .upload("people.csv", Workbook::new().with_sheet("Sheet1", people_sheet()))
            .is_err());

        assert_eq!(wizard.kind(), StepKind::Upload);
        assert_eq!(
            wizard.notifications(),
            &[Notification::Error {
                title: "Error".to_string(),
                description: "upload hook exploded".to_string(),
            }]
        );
    }

    #[test]
    fn select_header_option_routes_through_header_step() {
        let options = SpreadsheetImportOptions {
            select_header: true,
            ..SpreadsheetImportOptions::default()
        };
        let mut wizard = ImportWizard::new(options, Vec::new(), PassThroughHooks);
        let sheet = Sheet::from_rows(&[&["Report"], &["email"], &["a@x.io"]]);

        wizard
            .upload("people.csv", Workbook::new().with_sheet("Sheet1", sheet))
            .expect("upload");
        assert_eq!(wizard.kind(), StepKind::SelectHeader);

        wizard.select_header_row(1).expect("header");
        match wizard.step() {
            ImportStep::MatchColumns { data, header_values } => {
                assert_eq!(header_values, &vec!["email".to_string()]);
                assert_eq!(data, &vec![vec!["a@x.io".to_string()]]);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn header_row_past_end_of_sheet_is_rejected_in_place() {
        let options = SpreadsheetImportOptions {
            select_header: true,
            ..SpreadsheetImportOptions::default()
        };
        let mut wizard = ImportWizard::new(options, Vec::new(), PassThroughHooks);
        let sheet = Sheet::from_rows(&[&["email"], &["a@x.io"]]);
        wizard
            .upload("people.csv", Workbook::new().with_sheet("Sheet1", sheet))
            .expect("upload");

        let err = wizard.select_header_row(7).expect_err("index 7 is past the sheet");
        assert_eq!(err, StepError::HeaderRowOutOfRange { index: 7, rows: 2 });
        assert!(wizard.select_header_row(usize::MAX).is_err());

        assert_eq!(wizard.kind(), StepKind::SelectHeader);
        assert_eq!(wizard.notifications().len(), 2);
        assert_eq!(
            wizard.notifications()[0],
            Notification::Error {
                title: "Error".to_string(),
                description: "header row 7 is out of range for a sheet of 2 rows".to_string(),
            }
        );

        wizard.select_header_row(1).expect("last row as header");
        match wizard.step() {
            ImportStep::MatchColumns { data, header_values } => {
                assert_eq!(header_values, &vec!["a@x.io".to_string()]);
                assert!(data.is_empty());
            }
            other => panic!("unexpected step {other:?}"),
        }
    }
}
