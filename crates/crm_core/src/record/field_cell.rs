//! Closed set of field cells keyed by field type.
//!
//! # Responsibility
//! - Map each renderable `FieldMetadataType` to one `FieldCell` variant.
//! - Render stored JSON values, apply edit inputs, and validate results.
//!
//! # Invariants
//! - `edit` never returns a value that `validate` rejects.
//! - `Value::Null` is the empty value for every cell.

use crate::model::field_metadata::{
    FieldMetadataType, FieldOption, RelationMetadata, RelationType,
};
use crate::model::record::RecordId;
use crate::model::workspace::FullName;
use crate::record::field_context::FieldDefinition;
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Number, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+(:\d+)?(/\S*)?$")
        .expect("valid url regex")
});
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 ()./-]{3,}$").expect("valid phone regex"));

const DEFAULT_CURRENCY_CODE: &str = "USD";
const MICROS_PER_UNIT: f64 = 1_000_000.0;
const DATE_FORMAT: &str = "%Y-%m-%d";
const RATING_MAX: u64 = 5;

/// Capability every cell variant provides.
pub trait FieldRenderer {
    /// Display projection of a stored value.
    fn render(&self, value: &Value) -> RenderedCell;
    /// Applies one edit input to the current value.
    fn edit(&self, current: &Value, input: CellInput) -> Result<Value, CellError>;
    /// Checks that a value has the shape and format this cell stores.
    fn validate(&self, value: &Value) -> Result<(), CellError>;
}

/// Display projection of one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCell {
    pub display: String,
    pub is_empty: bool,
}

impl RenderedCell {
    fn text(display: impl Into<String>) -> Self {
        let display = display.into();
        Self {
            is_empty: display.is_empty(),
            display,
        }
    }

    fn empty() -> Self {
        Self::text(String::new())
    }
}

/// First/second value pair typed into a double-text input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDoubleText {
    pub first_value: String,
    pub second_value: String,
}

/// One user edit gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    Text(String),
    DoubleText(FieldDoubleText),
    Boolean(bool),
    Toggle,
    Choices(Vec<String>),
    RelationTarget(Option<RecordId>),
    Clear,
}

impl CellInput {
    fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::DoubleText(_) => "double_text",
            Self::Boolean(_) => "boolean",
            Self::Toggle => "toggle",
            Self::Choices(_) => "choices",
            Self::RelationTarget(_) => "relation_target",
            Self::Clear => "clear",
        }
    }
}

/// Cell construction, edit and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    /// Field type has no cell (uuid, position, raw json).
    UnsupportedFieldType(FieldMetadataType),
    /// Relation field declares no relation metadata.
    MissingRelationTarget(String),
    /// Cell or field cannot be edited in place.
    ReadOnly(String),
    /// Input gesture does not apply to this cell.
    InputMismatch {
        field_type: FieldMetadataType,
        input: &'static str,
    },
    /// Value has the wrong shape or format.
    InvalidValue {
        field_type: FieldMetadataType,
        reason: String,
    },
    /// Another edit session holds this scope.
    ScopeAlreadyEditing(String),
    /// Record snapshot is not in the store.
    RecordNotLoaded(RecordId),
}

impl Display for CellError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFieldType(kind) => {
                write!(f, "field type {} has no inline cell", kind.as_str())
            }
            Self::MissingRelationTarget(field) => {
                write!(f, "relation field `{field}` has no target")
            }
            Self::ReadOnly(field) => write!(f, "field `{field}` is read-only"),
            Self::InputMismatch { field_type, input } => write!(
                f,
                "input `{input}` does not apply to {} cells",
                field_type.as_str()
            ),
            Self::InvalidValue { field_type, reason } => {
                write!(f, "invalid {} value: {reason}", field_type.as_str())
            }
            Self::ScopeAlreadyEditing(scope) => write!(f, "scope already in edit mode: {scope}"),
            Self::RecordNotLoaded(id) => write!(f, "record not loaded: {id}"),
        }
    }
}

impl Error for CellError {}

/// Inline cell variant for one field type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCell {
    Text,
    Phone,
    Email,
    DateTime,
    Date,
    Boolean,
    Number,
    Numeric,
    Probability,
    Rating,
    Link,
    Currency,
    FullName,
    Select { options: Vec<FieldOption> },
    MultiSelect { options: Vec<FieldOption> },
    Relation { relation: RelationMetadata },
}

impl FieldCell {
    /// Selects the cell for a field definition.
    pub fn for_definition(definition: &FieldDefinition) -> Result<Self, CellError> {
        let cell = match definition.kind {
            FieldMetadataType::Text => Self::Text,
            FieldMetadataType::Phone => Self::Phone,
            FieldMetadataType::Email => Self::Email,
            FieldMetadataType::DateTime => Self::DateTime,
            FieldMetadataType::Date => Self::Date,
            FieldMetadataType::Boolean => Self::Boolean,
            FieldMetadataType::Number => Self::Number,
            FieldMetadataType::Numeric => Self::Numeric,
            FieldMetadataType::Probability => Self::Probability,
            FieldMetadataType::Rating => Self::Rating,
            FieldMetadataType::Link => Self::Link,
            FieldMetadataType::Currency => Self::Currency,
            FieldMetadataType::FullName => Self::FullName,
            FieldMetadataType::Select => Self::Select {
                options: definition.options.clone(),
            },
            FieldMetadataType::MultiSelect => Self::MultiSelect {
                options: definition.options.clone(),
            },
            FieldMetadataType::Relation => Self::Relation {
                relation: definition.relation.clone().ok_or_else(|| {
                    CellError::MissingRelationTarget(definition.field_name.clone())
                })?,
            },
            kind @ (FieldMetadataType::Uuid
            | FieldMetadataType::Position
            | FieldMetadataType::RawJson) => return Err(CellError::UnsupportedFieldType(kind)),
        };
        Ok(cell)
    }

    pub fn field_type(&self) -> FieldMetadataType {
        match self {
            Self::Text => FieldMetadataType::Text,
            Self::Phone => FieldMetadataType::Phone,
            Self::Email => FieldMetadataType::Email,
            Self::DateTime => FieldMetadataType::DateTime,
            Self::Date => FieldMetadataType::Date,
            Self::Boolean => FieldMetadataType::Boolean,
            Self::Number => FieldMetadataType::Number,
            Self::Numeric => FieldMetadataType::Numeric,
            Self::Probability => FieldMetadataType::Probability,
            Self::Rating => FieldMetadataType::Rating,
            Self::Link => FieldMetadataType::Link,
            Self::Currency => FieldMetadataType::Currency,
            Self::FullName => FieldMetadataType::FullName,
            Self::Select { .. } => FieldMetadataType::Select,
            Self::MultiSelect { .. } => FieldMetadataType::MultiSelect,
            Self::Relation { .. } => FieldMetadataType::Relation,
        }
    }

    /// To-many relations are edited from their own section, not inline.
    pub fn is_editable(&self) -> bool {
        match self {
            Self::Relation { relation } => relation.relation_type != RelationType::OneToMany,
            _ => true,
        }
    }

    /// Record key written by an edit of `field_name`.
    ///
    /// To-one relations are written through their foreign key (`<name>Id`).
    pub fn patch_key(&self, field_name: &str) -> String {
        match self {
            Self::Relation { relation } if relation.relation_type != RelationType::OneToMany => {
                format!("{field_name}Id")
            }
            _ => field_name.to_string(),
        }
    }

    /// Stored value converted to the shape `edit` produces.
    pub fn editable_value(&self, stored: &Value) -> Value {
        match (self, stored) {
            (Self::Relation { .. }, Value::Object(map)) => {
                map.get("id").cloned().unwrap_or(Value::Null)
            }
            _ => stored.clone(),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> CellError {
        CellError::InvalidValue {
            field_type: self.field_type(),
            reason: reason.into(),
        }
    }

    fn mismatch(&self, input: &CellInput) -> CellError {
        CellError::InputMismatch {
            field_type: self.field_type(),
            input: input.kind(),
        }
    }

    fn option_label<'o>(options: &'o [FieldOption], value: &'o str) -> &'o str {
        options
            .iter()
            .find(|option| option.value == value)
            .map_or(value, |option| option.label.as_str())
    }
}

impl FieldRenderer for FieldCell {
    fn render(&self, value: &Value) -> RenderedCell {
        if value.is_null() {
            return RenderedCell::empty();
        }
        match self {
            Self::Text | Self::Phone | Self::Email | Self::DateTime => {
                RenderedCell::text(value.as_str().unwrap_or_default())
            }
            Self::Date => {
                let raw = value.as_str().unwrap_or_default();
                RenderedCell::text(raw.get(..10).unwrap_or(raw))
            }
            Self::Boolean => {
                RenderedCell::text(if value.as_bool().unwrap_or(false) { "True" } else { "False" })
            }
            Self::Number | Self::Numeric => RenderedCell::text(format_number(value)),
            Self::Probability => RenderedCell::text(format!("{}%", format_number(value))),
            Self::Rating => RenderedCell::text(format!("{}/{RATING_MAX}", format_number(value))),
            Self::Link => {
                let label = value.get("label").and_then(Value::as_str).unwrap_or_default();
                let url = value.get("url").and_then(Value::as_str).unwrap_or_default();
                RenderedCell::text(if label.trim().is_empty() { url } else { label })
            }
            Self::Currency => match value.get("amountMicros").and_then(Value::as_i64) {
                Some(micros) => {
                    let code = value
                        .get("currencyCode")
                        .and_then(Value::as_str)
                        .unwrap_or(DEFAULT_CURRENCY_CODE);
                    RenderedCell::text(format!("{:.2} {code}", micros as f64 / MICROS_PER_UNIT))
                }
                None => RenderedCell::empty(),
            },
            Self::FullName => {
                let name: FullName = serde_json::from_value(value.clone()).unwrap_or_default();
                RenderedCell::text(name.display())
            }
            Self::Select { options } => RenderedCell::text(Self::option_label(
                options,
                value.as_str().unwrap_or_default(),
            )),
            Self::MultiSelect { options } => {
                let labels: Vec<&str> = value
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(|item| Self::option_label(options, item))
                            .collect()
                    })
                    .unwrap_or_default();
                RenderedCell::text(labels.join(", "))
            }
            Self::Relation { .. } => {
                let labels: Vec<String> = match value {
                    Value::Array(items) => items.iter().map(relation_label).collect(),
                    other => vec![relation_label(other)],
                };
                RenderedCell::text(labels.join(", "))
            }
        }
    }

    fn edit(&self, current: &Value, input: CellInput) -> Result<Value, CellError> {
        if !self.is_editable() {
            return Err(CellError::ReadOnly(self.field_type().as_str().to_string()));
        }
        if input == CellInput::Clear {
            return Ok(Value::Null);
        }

        let next = match (self, &input) {
            (Self::Text | Self::Phone | Self::Email | Self::DateTime | Self::Date, CellInput::Text(text)) => {
                text_or_null(text)
            }
            (Self::Boolean, CellInput::Boolean(flag)) => Value::Bool(*flag),
            (Self::Boolean, CellInput::Toggle) => Value::Bool(!current.as_bool().unwrap_or(false)),
            (Self::Number | Self::Numeric | Self::Probability | Self::Rating, CellInput::Text(text)) => {
                parse_number(text).map_err(|reason| self.invalid(reason))?
            }
            (Self::Link, CellInput::Text(text)) => {
                let label = current.get("label").cloned().unwrap_or(json!(""));
                if text.trim().is_empty() {
                    Value::Null
                } else {
                    json!({ "url": text.trim(), "label": label })
                }
            }
            (Self::Currency, CellInput::Text(text)) => {
                let code = current
                    .get("currencyCode")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_CURRENCY_CODE)
                    .to_string();
                if text.trim().is_empty() {
                    json!({ "amountMicros": Value::Null, "currencyCode": code })
                } else {
                    let amount: f64 = text
                        .trim()
                        .parse()
                        .map_err(|_| self.invalid(format!("`{}` is not an amount", text.trim())))?;
                    let micros = (amount * MICROS_PER_UNIT).round();
                    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
                        return Err(self.invalid(format!(
                            "`{}` is out of the supported amount range",
                            text.trim()
                        )));
                    }
                    let micros = micros as i64;
                    json!({ "amountMicros": micros, "currencyCode": code })
                }
            }
            (Self::FullName, CellInput::DoubleText(double)) => json!({
                "firstName": double.first_value.trim(),
                "lastName": double.second_value.trim(),
            }),
            (Self::Select { .. }, CellInput::Text(text)) => text_or_null(text),
            (Self::Select { .. }, CellInput::Choices(choices)) => match choices.as_slice() {
                [] => Value::Null,
                [single] => Value::String(single.clone()),
                _ => return Err(self.invalid("select accepts a single choice")),
            },
            (Self::MultiSelect { .. }, CellInput::Choices(choices)) => {
                Value::Array(choices.iter().cloned().map(Value::String).collect())
            }
            (Self::Relation { .. }, CellInput::RelationTarget(target)) => target
                .map(|id| Value::String(id.to_string()))
                .unwrap_or(Value::Null),
            _ => return Err(self.mismatch(&input)),
        };

        self.validate(&next)?;
        Ok(next)
    }

    fn validate(&self, value: &Value) -> Result<(), CellError> {
        if value.is_null() {
            return Ok(());
        }
        match self {
            Self::Text => expect_string(self, value).map(|_| ()),
            Self::DateTime => {
                let raw = expect_string(self, value)?;
                DateTime::parse_from_rfc3339(raw)
                    .map(|_| ())
                    .map_err(|_| self.invalid(format!("`{raw}` is not an RFC 3339 timestamp")))
            }
            Self::Phone => {
                let raw = expect_string(self, value)?;
                if PHONE_RE.is_match(raw) {
                    Ok(())
                } else {
                    Err(self.invalid(format!("`{raw}` is not a phone number")))
                }
            }
            Self::Email => {
                let raw = expect_string(self, value)?;
                if EMAIL_RE.is_match(raw) {
                    Ok(())
                } else {
                    Err(self.invalid(format!("`{raw}` is not an email address")))
                }
            }
            Self::Date => {
                let raw = expect_string(self, value)?;
                // Stored dates may carry the time part the backend appends.
                if NaiveDate::parse_from_str(raw, DATE_FORMAT).is_ok()
                    || DateTime::parse_from_rfc3339(raw).is_ok()
                {
                    Ok(())
                } else {
                    Err(self.invalid(format!("`{raw}` is not a YYYY-MM-DD date")))
                }
            }
            Self::Boolean => value
                .is_boolean()
                .then_some(())
                .ok_or_else(|| self.invalid("expected a boolean")),
            Self::Number | Self::Numeric => value
                .is_number()
                .then_some(())
                .ok_or_else(|| self.invalid("expected a number")),
            Self::Probability => match value.as_f64() {
                Some(percent) if (0.0..=100.0).contains(&percent) => Ok(()),
                _ => Err(self.invalid("expected a percentage between 0 and 100")),
            },
            Self::Rating => match value.as_u64() {
                Some(rating) if (1..=RATING_MAX).contains(&rating) => Ok(()),
                _ => Err(self.invalid(format!("expected a rating between 1 and {RATING_MAX}"))),
            },
            Self::Link => {
                let url = value
                    .get("url")
                    .and_then(Value::as_str)
                    .ok_or_else(|| self.invalid("link requires a url"))?;
                if URL_RE.is_match(url) {
                    Ok(())
                } else {
                    Err(self.invalid(format!("`{url}` is not a url")))
                }
            }
            Self::Currency => {
                let map = expect_object(self, value)?;
                let amount_ok = map
                    .get("amountMicros")
                    .map_or(true, |amount| amount.is_null() || amount.is_i64());
                let code_ok = map
                    .get("currencyCode")
                    .and_then(Value::as_str)
                    .is_some_and(|code| code.len() == 3);
                if amount_ok && code_ok {
                    Ok(())
                } else {
                    Err(self.invalid("expected amountMicros and a 3-letter currencyCode"))
                }
            }
            Self::FullName => {
                serde_json::from_value::<FullName>(value.clone())
                    .map(|_| ())
                    .map_err(|_| self.invalid("expected firstName and lastName"))
            }
            Self::Select { options } => {
                let raw = expect_string(self, value)?;
                if options.is_empty() || options.iter().any(|option| option.value == raw) {
                    Ok(())
                } else {
                    Err(self.invalid(format!("`{raw}` is not an option")))
                }
            }
            Self::MultiSelect { options } => {
                let items = value
                    .as_array()
                    .ok_or_else(|| self.invalid("expected a list of options"))?;
                for item in items {
                    let raw = item
                        .as_str()
                        .ok_or_else(|| self.invalid("options must be strings"))?;
                    if !options.is_empty() && !options.iter().any(|option| option.value == raw) {
                        return Err(self.invalid(format!("`{raw}` is not an option")));
                    }
                }
                Ok(())
            }
            Self::Relation { .. } => match value {
                Value::String(raw) => uuid::Uuid::parse_str(raw)
                    .map(|_| ())
                    .map_err(|_| self.invalid(format!("`{raw}` is not a record id"))),
                Value::Object(_) | Value::Array(_) => Ok(()),
                _ => Err(self.invalid("expected a record reference")),
            },
        }
    }
}

fn expect_string<'v>(cell: &FieldCell, value: &'v Value) -> Result<&'v str, CellError> {
    value.as_str().ok_or_else(|| cell.invalid("expected text"))
}

fn expect_object<'v>(cell: &FieldCell, value: &'v Value) -> Result<&'v Map<String, Value>, CellError> {
    value.as_object().ok_or_else(|| cell.invalid("expected an object"))
}

fn text_or_null(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::String(trimmed.to_string())
    }
}

fn parse_number(text: &str) -> Result<Value, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Ok(Value::Number(integer.into()));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| format!("`{trimmed}` is not a number"))
}

fn format_number(value: &Value) -> String {
    match value {
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(integer), _) => integer.to_string(),
            (None, Some(float)) if float.fract() == 0.0 => format!("{float:.0}"),
            (None, Some(float)) => float.to_string(),
            _ => number.to_string(),
        },
        other => other.as_str().unwrap_or_default().to_string(),
    }
}

fn relation_label(value: &Value) -> String {
    match value {
        Value::String(id) => id.clone(),
        Value::Object(map) => {
            if let Some(name) = map.get("name") {
                if let Some(text) = name.as_str() {
                    return text.to_string();
                }
                if let Ok(full_name) = serde_json::from_value::<FullName>(name.clone()) {
                    return full_name.display();
                }
            }
            map.get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{CellError, CellInput, FieldCell, FieldDoubleText, FieldRenderer};
    use crate::model::field_metadata::{FieldOption, RelationMetadata, RelationType};
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn stage_options() -> Vec<FieldOption> {
        vec![
            FieldOption {
                value: "NEW".to_string(),
                label: "New".to_string(),
            },
            FieldOption {
                value: "WON".to_string(),
                label: "Won".to_string(),
            },
        ]
    }

    fn relation(relation_type: RelationType) -> FieldCell {
        FieldCell::Relation {
            relation: RelationMetadata {
                relation_type,
                target_object_name_singular: "company".to_string(),
                target_field_name: None,
            },
        }
    }

    #[test]
    fn text_edit_trims_and_empties_to_null() {
        let cell = FieldCell::Text;
        assert_eq!(
            cell.edit(&Value::Null, CellInput::Text("  Paris ".into())).expect("edit"),
            json!("Paris")
        );
        assert_eq!(
            cell.edit(&json!("Paris"), CellInput::Text("   ".into())).expect("edit"),
            Value::Null
        );
    }

    #[test]
    fn email_edit_rejects_malformed_address() {
        let err = FieldCell::Email
            .edit(&Value::Null, CellInput::Text("not-an-email".into()))
            .expect_err("malformed");
        assert!(matches!(err, CellError::InvalidValue { .. }));
    }

    #[test]
    fn full_name_renders_and_edits_double_text() {
        let cell = FieldCell::FullName;
        let edited = cell
            .edit(
                &Value::Null,
                CellInput::DoubleText(FieldDoubleText {
                    first_value: "Ada ".into(),
                    second_value: " Lovelace".into(),
                }),
            )
            .expect("edit");
        assert_eq!(edited, json!({"firstName": "Ada", "lastName": "Lovelace"}));
        assert_eq!(cell.render(&edited).display, "Ada Lovelace");
    }

    #[test]
    fn boolean_toggle_flips_current_value() {
        let cell = FieldCell::Boolean;
        assert_eq!(cell.edit(&json!(true), CellInput::Toggle).expect("toggle"), json!(false));
        assert_eq!(cell.edit(&Value::Null, CellInput::Toggle).expect("toggle"), json!(true));
        assert_eq!(cell.render(&json!(true)).display, "True");
    }

    #[test]
    fn currency_edit_keeps_code_and_stores_micros() {
        let cell = FieldCell::Currency;
        let current = json!({"amountMicros": 1_000_000, "currencyCode": "EUR"});
        let edited = cell.edit(&current, CellInput::Text("12.5".into())).expect("edit");
        assert_eq!(edited, json!({"amountMicros": 12_500_000, "currencyCode": "EUR"}));
        assert_eq!(cell.render(&edited).display, "12.50 EUR");
    }

    #[test]
    fn currency_edit_rejects_non_finite_and_oversized_amounts() {
        let cell = FieldCell::Currency;
        let current = json!({"amountMicros": 1_000_000, "currencyCode": "EUR"});
        for text in ["NaN", "inf", "-inf", "1e300"] {
            let err = cell
                .edit(&current, CellInput::Text(text.into()))
                .expect_err("amount should be rejected");
            assert!(matches!(err, CellError::InvalidValue { .. }), "{text}: {err}");
        }
    }

    #[test]
    fn date_edit_requires_a_calendar_date() {
        let cell = FieldCell::Date;
        for text in ["2024-13-45", "2024-02-30", "2024-01-01garbage"] {
            assert!(
                cell.edit(&Value::Null, CellInput::Text(text.into())).is_err(),
                "{text} should be rejected"
            );
        }
        assert_eq!(
            cell.edit(&Value::Null, CellInput::Text("2024-02-29".into())).expect("leap day"),
            json!("2024-02-29")
        );
        assert!(cell.validate(&json!("2024-02-29T00:00:00Z")).is_ok());
    }

    #[test]
    fn date_time_edit_requires_rfc3339() {
        let cell = FieldCell::DateTime;
        assert_eq!(
            cell.edit(&Value::Null, CellInput::Text("2024-05-01T09:30:00+02:00".into()))
                .expect("timestamp"),
            json!("2024-05-01T09:30:00+02:00")
        );
        assert!(cell.edit(&Value::Null, CellInput::Text("yesterday".into())).is_err());
    }

    #[test]
    fn probability_and_rating_enforce_ranges() {
        assert!(FieldCell::Probability
            .edit(&Value::Null, CellInput::Text("140".into()))
            .is_err());
        assert_eq!(FieldCell::Probability.render(&json!(40)).display, "40%");
        assert!(FieldCell::Rating.edit(&Value::Null, CellInput::Text("6".into())).is_err());
        assert_eq!(
            FieldCell::Rating.edit(&Value::Null, CellInput::Text("4".into())).expect("rating"),
            json!(4)
        );
    }

    #[test]
    fn select_renders_labels_and_rejects_unknown_values() {
        let cell = FieldCell::Select {
            options: stage_options(),
        };
        assert_eq!(cell.render(&json!("WON")).display, "Won");
        assert!(cell
            .edit(&Value::Null, CellInput::Choices(vec!["LOST".into()]))
            .is_err());

        let multi = FieldCell::MultiSelect {
            options: stage_options(),
        };
        let edited = multi
            .edit(&Value::Null, CellInput::Choices(vec!["NEW".into(), "WON".into()]))
            .expect("multi edit");
        assert_eq!(multi.render(&edited).display, "New, Won");
    }

    #[test]
    fn to_one_relation_writes_foreign_key() {
        let cell = relation(RelationType::ManyToOne);
        let target = Uuid::new_v4();
        assert_eq!(cell.patch_key("company"), "companyId");
        assert_eq!(
            cell.edit(&Value::Null, CellInput::RelationTarget(Some(target)))
                .expect("edit"),
            json!(target.to_string())
        );
        assert_eq!(
            cell.editable_value(&json!({"id": target.to_string(), "name": "Acme"})),
            json!(target.to_string())
        );
        assert_eq!(
            cell.render(&json!({"id": target.to_string(), "name": "Acme"})).display,
            "Acme"
        );
    }

    #[test]
    fn to_many_relation_is_read_only_inline() {
        let cell = relation(RelationType::OneToMany);
        assert!(!cell.is_editable());
        assert!(matches!(
            cell.edit(&Value::Null, CellInput::RelationTarget(None)),
            Err(CellError::ReadOnly(_))
        ));
    }

    #[test]
    fn mismatched_input_is_rejected() {
        let err = FieldCell::Number
            .edit(&Value::Null, CellInput::Toggle)
            .expect_err("toggle on number");
        assert!(matches!(err, CellError::InputMismatch { input: "toggle", .. }));
    }
}
