//! Object and field metadata model.
//!
//! # Responsibility
//! - Describe server-declared object types and their field definitions.
//! - Name the core object types that receive special layout treatment.
//!
//! # Invariants
//! - Field ids are unique within one object.
//! - A `Relation` field carries relation metadata naming its target object.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Stable identifier for one field metadata item.
pub type FieldMetadataId = Uuid;

/// Stable identifier for one object metadata item.
pub type ObjectMetadataId = Uuid;

/// Closed set of field types understood by the record layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldMetadataType {
    Uuid,
    Text,
    Phone,
    Email,
    DateTime,
    Date,
    Boolean,
    Number,
    Numeric,
    Probability,
    Link,
    Currency,
    FullName,
    Rating,
    Select,
    MultiSelect,
    Position,
    RawJson,
    Relation,
}

impl FieldMetadataType {
    /// Wire name used by the metadata API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uuid => "UUID",
            Self::Text => "TEXT",
            Self::Phone => "PHONE",
            Self::Email => "EMAIL",
            Self::DateTime => "DATE_TIME",
            Self::Date => "DATE",
            Self::Boolean => "BOOLEAN",
            Self::Number => "NUMBER",
            Self::Numeric => "NUMERIC",
            Self::Probability => "PROBABILITY",
            Self::Link => "LINK",
            Self::Currency => "CURRENCY",
            Self::FullName => "FULL_NAME",
            Self::Rating => "RATING",
            Self::Select => "SELECT",
            Self::MultiSelect => "MULTI_SELECT",
            Self::Position => "POSITION",
            Self::RawJson => "RAW_JSON",
            Self::Relation => "RELATION",
        }
    }
}

/// Cardinality of a relation field, seen from the owning object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    OneToOne,
    OneToMany,
    ManyToOne,
}

/// Relation target description for `FieldMetadataType::Relation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationMetadata {
    pub relation_type: RelationType,
    pub target_object_name_singular: String,
    #[serde(default)]
    pub target_field_name: Option<String>,
}

/// One selectable value for select/multi-select fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

/// Server-declared description of one record attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetadataItem {
    pub id: FieldMetadataId,
    /// Attribute key inside record payloads, e.g. `jobTitle`.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldMetadataType,
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default = "default_true")]
    pub is_nullable: bool,
    #[serde(default)]
    pub relation: Option<RelationMetadata>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

fn default_true() -> bool {
    true
}

impl FieldMetadataItem {
    /// Creates a nullable field with no default, icon, relation or options.
    pub fn new(name: impl Into<String>, kind: FieldMetadataType, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            label: label.into(),
            icon: None,
            default_value: None,
            is_nullable: true,
            relation: None,
            options: Vec::new(),
        }
    }

    /// Creates a relation field pointing at `target_object_name_singular`.
    pub fn relation(
        name: impl Into<String>,
        label: impl Into<String>,
        relation_type: RelationType,
        target_object_name_singular: impl Into<String>,
    ) -> Self {
        let mut field = Self::new(name, FieldMetadataType::Relation, label);
        field.relation = Some(RelationMetadata {
            relation_type,
            target_object_name_singular: target_object_name_singular.into(),
            target_field_name: None,
        });
        field
    }

    pub fn is_relation(&self) -> bool {
        self.kind == FieldMetadataType::Relation
    }
}

/// Server-declared description of one object type and its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadataItem {
    pub id: ObjectMetadataId,
    pub name_singular: String,
    pub name_plural: String,
    pub label_singular: String,
    /// Remote objects are backed by a foreign data source and are read-only.
    #[serde(default)]
    pub is_remote: bool,
    #[serde(default)]
    pub label_identifier_field_metadata_id: Option<FieldMetadataId>,
    #[serde(default)]
    pub image_identifier_field_metadata_id: Option<FieldMetadataId>,
    #[serde(default)]
    pub fields: Vec<FieldMetadataItem>,
}

impl ObjectMetadataItem {
    /// Creates an object with no fields; plural defaults to `<singular>s`.
    pub fn new(name_singular: impl Into<String>, label_singular: impl Into<String>) -> Self {
        let name_singular = name_singular.into();
        Self {
            id: Uuid::new_v4(),
            name_plural: format!("{name_singular}s"),
            name_singular,
            label_singular: label_singular.into(),
            is_remote: false,
            label_identifier_field_metadata_id: None,
            image_identifier_field_metadata_id: None,
            fields: Vec::new(),
        }
    }

    /// Builder-style field append.
    pub fn with_field(mut self, field: FieldMetadataItem) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field_by_id(&self, id: FieldMetadataId) -> Option<&FieldMetadataItem> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldMetadataItem> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Object types with dedicated layout or identifier rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreObjectNameSingular {
    Person,
    Company,
    Opportunity,
    Note,
    Task,
    WorkspaceMember,
}

impl CoreObjectNameSingular {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Company => "company",
            Self::Opportunity => "opportunity",
            Self::Note => "note",
            Self::Task => "task",
            Self::WorkspaceMember => "workspaceMember",
        }
    }

    /// Parses an object singular name; custom objects return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "person" => Some(Self::Person),
            "company" => Some(Self::Company),
            "opportunity" => Some(Self::Opportunity),
            "note" => Some(Self::Note),
            "task" => Some(Self::Task),
            "workspaceMember" => Some(Self::WorkspaceMember),
            _ => None,
        }
    }
}
