//! Import step machine.
//!
//! # Responsibility
//! - Define the tagged step state and the events that move it.
//! - Provide a pure `transition` from (state, event) to the next state.
//!
//! # Invariants
//! - A rejected event leaves the state untouched; `transition` borrows the
//!   state and only returns a new one on success.
//! - Forward transitions record the state they left as `previous`.
//! - `Loading` is terminal.

use crate::import::columns::{Column, ImportedRecord};
use crate::import::workbook::{exceeds_max_records, Sheet, Workbook};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Wizard step with the data it carries.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportStep {
    Upload,
    SelectSheet {
        workbook: Workbook,
    },
    SelectHeader {
        data: Vec<Vec<String>>,
    },
    MatchColumns {
        data: Vec<Vec<String>>,
        header_values: Vec<String>,
    },
    ValidateData {
        data: Vec<ImportedRecord>,
        imported_columns: Vec<Column>,
    },
    Loading,
}

/// Tag of an `ImportStep`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Upload,
    SelectSheet,
    SelectHeader,
    MatchColumns,
    ValidateData,
    Loading,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::SelectSheet => "selectSheet",
            Self::SelectHeader => "selectHeader",
            Self::MatchColumns => "matchColumns",
            Self::ValidateData => "validateData",
            Self::Loading => "loading",
        }
    }
}

impl ImportStep {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Upload => StepKind::Upload,
            Self::SelectSheet { .. } => StepKind::SelectSheet,
            Self::SelectHeader { .. } => StepKind::SelectHeader,
            Self::MatchColumns { .. } => StepKind::MatchColumns,
            Self::ValidateData { .. } => StepKind::ValidateData,
            Self::Loading => StepKind::Loading,
        }
    }
}

/// User continuation, carrying the output of any hook that ran for it.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// A workbook with several sheets was uploaded.
    WorkbookUploaded { workbook: Workbook },
    /// Rows of the chosen sheet after the upload hook; header still to pick.
    RowsMapped { data: Vec<Vec<String>> },
    /// Header row chosen and the select-header hook applied.
    HeaderSelected {
        header_values: Vec<String>,
        data: Vec<Vec<String>>,
    },
    /// Columns matched and the match-columns hook applied.
    ColumnsMatched {
        data: Vec<ImportedRecord>,
        imported_columns: Vec<Column>,
    },
    SubmitStarted,
    Back,
}

impl StepEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::WorkbookUploaded { .. } => "workbook_uploaded",
            Self::RowsMapped { .. } => "rows_mapped",
            Self::HeaderSelected { .. } => "header_selected",
            Self::ColumnsMatched { .. } => "columns_matched",
            Self::SubmitStarted => "submit_started",
            Self::Back => "back",
        }
    }
}

/// Current step, the snapshot `Back` returns to, and the starting step.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub current: ImportStep,
    pub previous: ImportStep,
    pub initial: ImportStep,
}

impl WizardState {
    pub fn new(initial: ImportStep) -> Self {
        Self {
            current: initial.clone(),
            previous: initial.clone(),
            initial,
        }
    }

    pub fn kind(&self) -> StepKind {
        self.current.kind()
    }

    fn advance(&self, next: ImportStep) -> Self {
        Self {
            current: next,
            previous: self.current.clone(),
            initial: self.initial.clone(),
        }
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new(ImportStep::Upload)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// Sheet holds more data rows than allowed.
    TooManyRecords { max_records: usize },
    /// A step hook failed; carries the hook's message.
    Hook(String),
    /// Event does not apply to the current step.
    InvalidEvent { step: StepKind, event: &'static str },
    /// Selected sheet is not in the workbook.
    UnknownSheet(String),
    /// Workbook has no sheet.
    EmptyWorkbook,
    /// Validation regex does not compile.
    InvalidPattern { field_key: String, reason: String },
    /// Validation step reached without an uploaded file.
    FileNotFound,
    /// Rows still have errors and invalid submission is disabled.
    InvalidRows(usize),
    /// Chosen header row is past the end of the sheet.
    HeaderRowOutOfRange { index: usize, rows: usize },
}

impl Display for StepError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyRecords { max_records } => {
                write!(f, "Too many records. Up to {max_records} allowed")
            }
            Self::Hook(message) => write!(f, "{message}"),
            Self::InvalidEvent { step, event } => {
                write!(f, "event `{event}` is not valid in step `{}`", step.as_str())
            }
            Self::UnknownSheet(name) => write!(f, "sheet `{name}` not found"),
            Self::EmptyWorkbook => write!(f, "workbook has no sheets"),
            Self::InvalidPattern { field_key, reason } => {
                write!(f, "invalid validation pattern for `{field_key}`: {reason}")
            }
            Self::FileNotFound => write!(f, "File not found"),
            Self::InvalidRows(count) => {
                write!(f, "{count} rows have errors and must be fixed before submitting")
            }
            Self::HeaderRowOutOfRange { index, rows } => {
                write!(f, "header row {index} is out of range for a sheet of {rows} rows")
            }
        }
    }
}

impl Error for StepError {}

/// Rejects a sheet whose data rows exceed `max_records`; `0` disables the check.
pub fn check_max_records(sheet: &Sheet, max_records: usize) -> Result<(), StepError> {
    if max_records > 0 && exceeds_max_records(sheet, max_records) {
        return Err(StepError::TooManyRecords { max_records });
    }
    Ok(())
}

/// Computes the state after `event`, or why the event is rejected.
pub fn transition(state: &WizardState, event: StepEvent) -> Result<WizardState, StepError> {
    let step = state.kind();
    let invalid = |event: &StepEvent| StepError::InvalidEvent {
        step,
        event: event.name(),
    };

    match (&state.current, event) {
        (ImportStep::Upload, StepEvent::WorkbookUploaded { workbook }) => {
            if workbook.sheet_names.is_empty() {
                return Err(StepError::EmptyWorkbook);
            }
            Ok(state.advance(ImportStep::SelectSheet { workbook }))
        }
        (ImportStep::Upload | ImportStep::SelectSheet { .. }, StepEvent::RowsMapped { data }) => {
            Ok(state.advance(ImportStep::SelectHeader { data }))
        }
        (
            ImportStep::Upload | ImportStep::SelectHeader { .. },
            StepEvent::HeaderSelected {
                header_values,
                data,
            },
        ) => Ok(state.advance(ImportStep::MatchColumns {
            data,
            header_values,
        })),
        (
            ImportStep::MatchColumns { .. },
            StepEvent::ColumnsMatched {
                data,
                imported_columns,
            },
        ) => Ok(state.advance(ImportStep::ValidateData {
            data,
            imported_columns,
        })),
        (ImportStep::ValidateData { .. }, StepEvent::SubmitStarted) => Ok(WizardState {
            current: ImportStep::Loading,
            previous: state.previous.clone(),
            initial: state.initial.clone(),
        }),
        (ImportStep::ValidateData { .. }, StepEvent::Back) => Ok(WizardState {
            current: state.previous.clone(),
            previous: state.initial.clone(),
            initial: state.initial.clone(),
        }),
        (
            ImportStep::SelectSheet { .. }
            | ImportStep::SelectHeader { .. }
            | ImportStep::MatchColumns { .. },
            StepEvent::Back,
        ) => Ok(WizardState {
            current: state.previous.clone(),
            previous: state.previous.clone(),
            initial: state.initial.clone(),
        }),
        (_, event) => Err(invalid(&event)),
    }
}
