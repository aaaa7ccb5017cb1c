//! In-process metadata registry.
//!
//! # Invariants
//! - Object singular names are unique within one registry.
//! - Field ids are unique within one object.

use crate::model::field_metadata::{FieldMetadataItem, FieldMetadataType, ObjectMetadataItem};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field name used as label identifier when metadata declares none.
pub const DEFAULT_LABEL_IDENTIFIER_FIELD_NAME: &str = "name";

/// Metadata registration and lookup errors.
#[derive(Debug)]
pub enum MetadataError {
    /// Object singular name is blank.
    EmptyObjectName,
    /// Another object already uses this singular name.
    DuplicateObject(String),
    /// Two fields of one object share an id.
    DuplicateFieldId { object: String, field: String },
    /// A relation field declares no relation target.
    MissingRelationTarget { object: String, field: String },
    /// No object registered under this singular name.
    ObjectNotFound(String),
    /// Metadata payload could not be decoded.
    Decode(serde_json::Error),
}

impl Display for MetadataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyObjectName => write!(f, "object name must not be blank"),
            Self::DuplicateObject(name) => write!(f, "object already registered: {name}"),
            Self::DuplicateFieldId { object, field } => {
                write!(f, "duplicate field id on `{object}`: {field}")
            }
            Self::MissingRelationTarget { object, field } => {
                write!(f, "relation field `{object}.{field}` has no target")
            }
            Self::ObjectNotFound(name) => write!(f, "object metadata not found: {name}"),
            Self::Decode(err) => write!(f, "invalid metadata payload: {err}"),
        }
    }
}

impl Error for MetadataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MetadataError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

/// Registry of object metadata keyed by singular name.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    objects: BTreeMap<String, ObjectMetadataItem>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a JSON array of object metadata items.
    pub fn from_json(raw: &str) -> Result<Self, MetadataError> {
        let objects: Vec<ObjectMetadataItem> = serde_json::from_str(raw)?;
        let mut registry = Self::new();
        for object in objects {
            registry.register(object)?;
        }
        Ok(registry)
    }

    /// Registers one object after validating its field declarations.
    pub fn register(&mut self, mut object: ObjectMetadataItem) -> Result<(), MetadataError> {
        let name = object.name_singular.trim().to_string();
        if name.is_empty() {
            return Err(MetadataError::EmptyObjectName);
        }
        if self.objects.contains_key(&name) {
            return Err(MetadataError::DuplicateObject(name));
        }

        let mut seen = BTreeSet::new();
        for field in &object.fields {
            if !seen.insert(field.id) {
                return Err(MetadataError::DuplicateFieldId {
                    object: name,
                    field: field.name.clone(),
                });
            }
            if field.kind == FieldMetadataType::Relation && field.relation.is_none() {
                return Err(MetadataError::MissingRelationTarget {
                    object: name,
                    field: field.name.clone(),
                });
            }
        }

        debug!(
            "event=metadata_register module=metadata status=ok object={} fields={}",
            name,
            object.fields.len()
        );
        object.name_singular = name.clone();
        self.objects.insert(name, object);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, object_name_singular: &str) -> Option<&ObjectMetadataItem> {
        self.objects.get(object_name_singular)
    }

    /// Lookup that reports a typed error for unknown objects.
    pub fn object(&self, object_name_singular: &str) -> Result<&ObjectMetadataItem, MetadataError> {
        self.get(object_name_singular)
            .ok_or_else(|| MetadataError::ObjectNotFound(object_name_singular.to_string()))
    }

    /// Singular names in sorted order.
    pub fn object_names(&self) -> Vec<&str> {
        self.objects.keys().map(String::as_str).collect()
    }

    /// Resolves the field shown as the record's title.
    pub fn label_identifier_field(
        &self,
        object_name_singular: &str,
    ) -> Result<Option<&FieldMetadataItem>, MetadataError> {
        Ok(label_identifier_field(self.object(object_name_singular)?))
    }

    /// Resolves the field holding the record's image, when declared.
    pub fn image_identifier_field(
        &self,
        object_name_singular: &str,
    ) -> Result<Option<&FieldMetadataItem>, MetadataError> {
        let object = self.object(object_name_singular)?;
        Ok(object
            .image_identifier_field_metadata_id
            .and_then(|id| object.field_by_id(id)))
    }
}

/// Explicit label identifier id first, otherwise the field named `name`.
pub fn label_identifier_field(object: &ObjectMetadataItem) -> Option<&FieldMetadataItem> {
    match object.label_identifier_field_metadata_id {
        Some(id) => object.field_by_id(id),
        None => object.field_by_name(DEFAULT_LABEL_IDENTIFIER_FIELD_NAME),
    }
}

/// Returns whether a field can be rendered as an inline cell.
pub fn is_field_cell_supported(field: &FieldMetadataItem) -> bool {
    match field.kind {
        FieldMetadataType::Uuid | FieldMetadataType::Position | FieldMetadataType::RawJson => false,
        FieldMetadataType::Relation => field.relation.is_some(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_field_cell_supported, MetadataError, MetadataRegistry};
    use crate::model::field_metadata::{
        FieldMetadataItem, FieldMetadataType, ObjectMetadataItem, RelationType,
    };

    fn company() -> ObjectMetadataItem {
        ObjectMetadataItem::new("company", "Company")
            .with_field(FieldMetadataItem::new("name", FieldMetadataType::Text, "Name"))
            .with_field(FieldMetadataItem::new(
                "domainName",
                FieldMetadataType::Text,
                "Domain",
            ))
    }

    #[test]
    fn rejects_duplicate_object_names() {
        let mut registry = MetadataRegistry::new();
        registry.register(company()).expect("first registration");
        let err = registry.register(company()).expect_err("duplicate");
        assert!(matches!(err, MetadataError::DuplicateObject(name) if name == "company"));
    }

    #[test]
    fn object_name_is_stored_trimmed() {
        let mut registry = MetadataRegistry::new();
        let mut object = company();
        object.name_singular = " company ".to_string();
        registry.register(object).expect("register");

        let stored = registry.get("company").expect("trimmed lookup");
        assert_eq!(stored.name_singular, "company");
        assert!(matches!(
            registry.register(company()),
            Err(MetadataError::DuplicateObject(name)) if name == "company"
        ));
    }

    #[test]
    fn rejects_relation_without_target() {
        let mut field =
            FieldMetadataItem::relation("people", "People", RelationType::OneToMany, "person");
        field.relation = None;
        let object = ObjectMetadataItem::new("company", "Company").with_field(field);
        let err = MetadataRegistry::new()
            .register(object)
            .expect_err("relation without target");
        assert!(matches!(err, MetadataError::MissingRelationTarget { .. }));
    }

    #[test]
    fn label_identifier_falls_back_to_name_field() {
        let mut registry = MetadataRegistry::new();
        registry.register(company()).expect("register");
        let field = registry
            .label_identifier_field("company")
            .expect("known object")
            .expect("name field");
        assert_eq!(field.name, "name");
    }

    #[test]
    fn label_identifier_prefers_explicit_id() {
        let mut object = company();
        object.label_identifier_field_metadata_id = Some(object.fields[1].id);
        let mut registry = MetadataRegistry::new();
        registry.register(object).expect("register");
        let field = registry
            .label_identifier_field("company")
            .expect("known object")
            .expect("explicit field");
        assert_eq!(field.name, "domainName");
    }

    #[test]
    fn unknown_object_is_typed_error() {
        let registry = MetadataRegistry::new();
        assert!(matches!(
            registry.object("rocket"),
            Err(MetadataError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn technical_fields_are_not_cells() {
        assert!(!is_field_cell_supported(&FieldMetadataItem::new(
            "id",
            FieldMetadataType::Uuid,
            "Id"
        )));
        assert!(!is_field_cell_supported(&FieldMetadataItem::new(
            "position",
            FieldMetadataType::Position,
            "Position"
        )));
        assert!(is_field_cell_supported(&FieldMetadataItem::new(
            "city",
            FieldMetadataType::Text,
            "City"
        )));
    }
}
