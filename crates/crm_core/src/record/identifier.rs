//! Compact identity of a record: display name, avatar and show-page link.

use crate::model::field_metadata::{CoreObjectNameSingular, ObjectMetadataItem};
use crate::model::record::{Record, RecordId};
use crate::model::workspace::FullName;
use crate::metadata::registry::label_identifier_field;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Favicon service used to derive company logos from their domain.
pub const COMPANY_LOGO_BASE_URL: &str = "https://favicon.twenty.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AvatarType {
    Rounded,
    Squared,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordIdentifier {
    pub id: RecordId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub avatar_type: AvatarType,
    pub link_to_show_page: String,
}

impl RecordIdentifier {
    /// Projects `record` using its object's label identifier rules.
    pub fn from_record(object: &ObjectMetadataItem, record: &Record) -> Self {
        let core = CoreObjectNameSingular::parse(&object.name_singular);
        let (name, avatar_url, avatar_type) = match core {
            Some(CoreObjectNameSingular::Person | CoreObjectNameSingular::WorkspaceMember) => (
                full_name_display(record.get("name")),
                non_empty(record.get_str("avatarUrl")),
                AvatarType::Rounded,
            ),
            Some(CoreObjectNameSingular::Company) => (
                record.get_str("name").unwrap_or_default().to_string(),
                company_logo_url(record.get_str("domainName").unwrap_or_default()),
                AvatarType::Squared,
            ),
            _ => {
                let name = label_identifier_field(object)
                    .map(|field| value_as_name(record.get(&field.name)))
                    .unwrap_or_default();
                let avatar_url = object
                    .image_identifier_field_metadata_id
                    .and_then(|id| object.field_by_id(id))
                    .and_then(|field| non_empty(record.get_str(&field.name)));
                (name, avatar_url, AvatarType::Rounded)
            }
        };

        Self {
            id: record.id,
            name,
            avatar_url,
            avatar_type,
            link_to_show_page: show_page_link(&object.name_singular, record.id),
        }
    }
}

/// Relative route to the record's show page.
pub fn show_page_link(object_name_singular: &str, id: RecordId) -> String {
    format!("/object/{object_name_singular}/{id}")
}

/// Logo URL for a company domain; `None` when the domain is blank.
pub fn company_logo_url(domain_name: &str) -> Option<String> {
    let host = domain_name
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .trim_end_matches('/');
    if host.is_empty() {
        return None;
    }
    Some(format!("{COMPANY_LOGO_BASE_URL}/{host}"))
}

fn full_name_display(value: &Value) -> String {
    serde_json::from_value::<FullName>(value.clone())
        .map(|name| name.display())
        .unwrap_or_default()
}

fn value_as_name(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(_) => full_name_display(value),
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{company_logo_url, AvatarType, RecordIdentifier};
    use crate::model::field_metadata::{FieldMetadataItem, FieldMetadataType, ObjectMetadataItem};
    use crate::model::record::Record;
    use serde_json::json;

    #[test]
    fn person_identifier_uses_full_name_and_rounded_avatar() {
        let object = ObjectMetadataItem::new("person", "Person");
        let record = Record::new("person")
            .with_value("name", json!({"firstName": "Ada", "lastName": "Lovelace"}))
            .with_value("avatarUrl", json!("person-picture/a.png"));

        let identifier = RecordIdentifier::from_record(&object, &record);
        assert_eq!(identifier.name, "Ada Lovelace");
        assert_eq!(identifier.avatar_url.as_deref(), Some("person-picture/a.png"));
        assert_eq!(identifier.avatar_type, AvatarType::Rounded);
        assert_eq!(identifier.link_to_show_page, format!("/object/person/{}", record.id));
    }

    #[test]
    fn company_identifier_derives_squared_logo_from_domain() {
        let object = ObjectMetadataItem::new("company", "Company");
        let record = Record::new("company")
            .with_value("name", json!("Acme"))
            .with_value("domainName", json!("https://www.acme.io/"));

        let identifier = RecordIdentifier::from_record(&object, &record);
        assert_eq!(identifier.name, "Acme");
        assert_eq!(identifier.avatar_type, AvatarType::Squared);
        assert_eq!(
            identifier.avatar_url.as_deref(),
            Some("https://favicon.twenty.com/acme.io")
        );
        assert_eq!(company_logo_url("  "), None);
    }

    #[test]
    fn custom_object_uses_label_identifier_value() {
        let title = FieldMetadataItem::new("title", FieldMetadataType::Text, "Title");
        let mut object = ObjectMetadataItem::new("ticket", "Ticket").with_field(title.clone());
        object.label_identifier_field_metadata_id = Some(title.id);
        let record = Record::new("ticket").with_value("title", json!("Broken login"));

        let identifier = RecordIdentifier::from_record(&object, &record);
        assert_eq!(identifier.name, "Broken login");
        assert_eq!(identifier.avatar_url, None);
    }
}
