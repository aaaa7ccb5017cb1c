use crm_core::import::validation::FieldValidation;
use crm_core::import::wizard::{ImportHooks, Notification, PassThroughHooks};
use crm_core::import::{
    ImportField, ImportStep, ImportWizard, Sheet, SpreadsheetImportOptions, StepError, StepKind,
    Workbook,
};
use serde_json::json;

fn fields() -> Vec<ImportField> {
    vec![
        ImportField::input("firstName", "First name")
            .with_alternate_matches(&["first"])
            .with_validation(FieldValidation::required()),
        ImportField::input("email", "Email").with_validation(FieldValidation::unique()),
    ]
}

fn people_sheet() -> Sheet {
    Sheet::from_rows(&[
        &["First name", "Email"],
        &["Ada", "ada@acme.io"],
        &["Grace", "grace@acme.io"],
    ])
}

fn wizard(options: SpreadsheetImportOptions) -> ImportWizard<PassThroughHooks> {
    ImportWizard::new(options, fields(), PassThroughHooks)
}

#[test]
fn too_many_records_blocks_the_upload() {
    let mut wizard = wizard(SpreadsheetImportOptions {
        max_records: 1,
        ..SpreadsheetImportOptions::default()
    });

    let err = wizard
        .upload("people.csv", Workbook::new().with_sheet("People", people_sheet()))
        .expect_err("over the ceiling");

    assert_eq!(err, StepError::TooManyRecords { max_records: 1 });
    assert_eq!(wizard.kind(), StepKind::Upload);
    assert_eq!(
        wizard.notifications(),
        &[Notification::Error {
            title: "Error".to_string(),
            description: "Too many records. Up to 1 allowed".to_string(),
        }]
    );
}

#[test]
fn too_many_records_blocks_the_selected_sheet() {
    let mut wizard = wizard(SpreadsheetImportOptions {
        max_records: 1,
        ..SpreadsheetImportOptions::default()
    });
    let workbook = Workbook::new()
        .with_sheet("People", people_sheet())
        .with_sheet("Companies", Sheet::from_rows(&[&["Name"], &["Acme"]]));

    assert_eq!(
        wizard.upload("crm.xlsx", workbook).expect("upload"),
        StepKind::SelectSheet
    );
    let err = wizard
        .select_sheet("People")
        .expect_err("sheet over the ceiling");

    assert_eq!(err, StepError::TooManyRecords { max_records: 1 });
    assert_eq!(wizard.kind(), StepKind::SelectSheet);
    assert_eq!(
        wizard.notifications(),
        &[Notification::Error {
            title: "Error".to_string(),
            description: "Too many records. Up to 1 allowed".to_string(),
        }]
    );
}

#[test]
fn multi_sheet_workbook_asks_for_a_sheet_first() {
    let mut wizard = wizard(SpreadsheetImportOptions {
        select_header: true,
        ..SpreadsheetImportOptions::default()
    });
    let workbook = Workbook::new()
        .with_sheet("People", people_sheet())
        .with_sheet("Companies", Sheet::from_rows(&[&["Name"], &["Acme"]]));

    assert_eq!(
        wizard.upload("crm.xlsx", workbook).expect("upload"),
        StepKind::SelectSheet
    );
    match wizard.step() {
        ImportStep::SelectSheet { workbook } => {
            assert_eq!(workbook.sheet_names, vec!["People", "Companies"]);
        }
        other => panic!("unexpected step {other:?}"),
    }

    assert_eq!(
        wizard.select_sheet("People").expect("select sheet"),
        StepKind::SelectHeader
    );
    assert_eq!(
        wizard.select_header_row(0).expect("select header"),
        StepKind::MatchColumns
    );
    assert!(wizard.select_sheet("People").is_err());
    assert_eq!(wizard.kind(), StepKind::MatchColumns);
}

#[test]
fn date_format_applies_when_raw_parsing_is_off() {
    let mut wizard = wizard(SpreadsheetImportOptions {
        parse_raw: false,
        date_format: "mm/dd/yyyy".to_string(),
        ..SpreadsheetImportOptions::default()
    });
    let sheet = Sheet::from_rows(&[&["First name", "Joined"], &["Ada", "2024-03-05"]]);

    wizard
        .upload("people.csv", Workbook::new().with_sheet("People", sheet))
        .expect("upload");

    match wizard.step() {
        ImportStep::MatchColumns { data, .. } => {
            assert_eq!(data, &vec![vec!["Ada".to_string(), "03/05/2024".to_string()]]);
        }
        other => panic!("unexpected step {other:?}"),
    }
}

#[test]
fn single_sheet_import_reaches_loading_on_submit() {
    let mut wizard = wizard(SpreadsheetImportOptions::default());

    assert_eq!(
        wizard
            .upload("people.csv", Workbook::new().with_sheet("People", people_sheet()))
            .expect("upload"),
        StepKind::MatchColumns
    );
    let columns = wizard.suggested_columns();
    assert_eq!(columns[0].matched_key(), Some("firstName"));
    assert_eq!(columns[1].matched_key(), Some("email"));

    assert_eq!(
        wizard.match_columns(columns).expect("match columns"),
        StepKind::ValidateData
    );
    let report = wizard.validation_report().expect("validate");
    assert!(report.is_valid());

    let submission = wizard.submit().expect("submit");
    assert_eq!(wizard.kind(), StepKind::Loading);
    assert_eq!(submission.valid.len(), 2);
    assert!(submission.invalid.is_empty());
    assert_eq!(submission.valid[0].get("email"), Some(&json!("ada@acme.io")));
    assert_eq!(wizard.uploaded_file_name(), Some("people.csv"));
}

#[test]
fn invalid_rows_are_split_out_when_allowed() {
    let mut wizard = wizard(SpreadsheetImportOptions::default());
    let sheet = Sheet::from_rows(&[
        &["First name", "Email"],
        &["Ada", "dup@acme.io"],
        &["", "dup@acme.io"],
    ]);
    wizard
        .upload("people.csv", Workbook::new().with_sheet("People", sheet))
        .expect("upload");
    let columns = wizard.suggested_columns();
    wizard.match_columns(columns).expect("match columns");

    let report = wizard.validation_report().expect("validate");
    assert_eq!(report.errors_for_row(0).len(), 1);
    assert_eq!(report.errors_for_row(1).len(), 2);

    let submission = wizard.submit().expect("submit with errors");
    assert!(submission.valid.is_empty());
    assert_eq!(submission.invalid.len(), 2);
}

#[test]
fn invalid_rows_block_submit_when_disallowed() {
    let mut wizard = wizard(SpreadsheetImportOptions {
        allow_invalid_submit: false,
        ..SpreadsheetImportOptions::default()
    });
    let sheet = Sheet::from_rows(&[&["First name", "Email"], &["", "x@acme.io"]]);
    wizard
        .upload("people.csv", Workbook::new().with_sheet("People", sheet))
        .expect("upload");
    let columns = wizard.suggested_columns();
    wizard.match_columns(columns).expect("match columns");

    assert_eq!(wizard.submit().expect_err("blocked"), StepError::InvalidRows(1));
    assert_eq!(wizard.kind(), StepKind::ValidateData);
    assert_eq!(wizard.notifications().len(), 1);
}

#[test]
fn back_walks_to_the_previous_step() {
    let mut wizard = wizard(SpreadsheetImportOptions {
        select_header: true,
        ..SpreadsheetImportOptions::default()
    });
    wizard
        .upload("people.csv", Workbook::new().with_sheet("People", people_sheet()))
        .expect("upload");
    wizard.select_header_row(0).expect("select header");
    let columns = wizard.suggested_columns();
    wizard.match_columns(columns).expect("match columns");
    assert_eq!(wizard.kind(), StepKind::ValidateData);

    assert_eq!(wizard.back().expect("back"), StepKind::MatchColumns);
    assert_eq!(wizard.state().previous, ImportStep::Upload);
    assert_eq!(wizard.back().expect("back"), StepKind::Upload);
    assert!(wizard.back().is_err());
    assert_eq!(wizard.take_notifications().len(), 1);
}

struct RejectingHeaderHook;

impl ImportHooks for RejectingHeaderHook {
    fn select_header_step_hook(
        &self,
        _header_values: Vec<String>,
        _data: Vec<Vec<String>>,
    ) -> Result<crm_core::import::wizard::SelectHeaderResult, String> {
        Err("Header row is not allowed".to_string())
    }
}

#[test]
fn hook_failure_keeps_step_and_notifies() {
    let mut wizard = ImportWizard::new(
        SpreadsheetImportOptions {
            select_header: true,
            ..SpreadsheetImportOptions::default()
        },
        fields(),
        RejectingHeaderHook,
    );
    wizard
        .upload("people.csv", Workbook::new().with_sheet("People", people_sheet()))
        .expect("upload");

    let err = wizard.select_header_row(0).expect_err("hook rejects");

    assert_eq!(err, StepError::Hook("Header row is not allowed".to_string()));
    assert_eq!(wizard.kind(), StepKind::SelectHeader);
    assert_eq!(
        wizard.take_notifications(),
        vec![Notification::Error {
            title: "Error".to_string(),
            description: "Header row is not allowed".to_string(),
        }]
    );
}
