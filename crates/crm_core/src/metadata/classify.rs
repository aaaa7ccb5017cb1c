//! Show-page field classification.
//!
//! # Invariants
//! - The label identifier field never appears in inline or relation groups.
//! - Inline fields are sorted by `name` ascending using byte-wise `str` order.
//! - For `note`/`task`, only `noteTargets`/`taskTargets` is an inline relation;
//!   every other relation field is boxed.

use crate::metadata::registry::{is_field_cell_supported, label_identifier_field};
use crate::model::field_metadata::{CoreObjectNameSingular, FieldMetadataItem, ObjectMetadataItem};

/// Relation field rendered compactly inside the note property box.
pub const NOTE_TARGETS_FIELD_NAME: &str = "noteTargets";
/// Relation field rendered compactly inside the task property box.
pub const TASK_TARGETS_FIELD_NAME: &str = "taskTargets";

/// Field groups for one object's show page.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldClassification<'a> {
    /// Title field shown in the summary header.
    pub label_identifier: Option<&'a FieldMetadataItem>,
    /// Scalar fields, sorted by name.
    pub inline_fields: Vec<&'a FieldMetadataItem>,
    /// Activity-target relations rendered inside the property box.
    pub inline_relation_fields: Vec<&'a FieldMetadataItem>,
    /// Relations rendered as standalone sections.
    pub boxed_relation_fields: Vec<&'a FieldMetadataItem>,
}

/// Classifies an object's fields using its own label identifier.
pub fn classify_object_fields(object: &ObjectMetadataItem) -> FieldClassification<'_> {
    classify_fields(
        object.name_singular.as_str(),
        &object.fields,
        label_identifier_field(object),
    )
}

/// Partitions `fields` into identifier, inline, inline-relation and boxed-relation groups.
pub fn classify_fields<'a>(
    object_name_singular: &str,
    fields: &'a [FieldMetadataItem],
    label_identifier: Option<&'a FieldMetadataItem>,
) -> FieldClassification<'a> {
    let identifier_id = label_identifier.map(|field| field.id);

    let mut available: Vec<&FieldMetadataItem> = fields
        .iter()
        .filter(|field| is_field_cell_supported(field) && Some(field.id) != identifier_id)
        .collect();
    available.sort_by(|left, right| left.name.cmp(&right.name));

    let (relation_fields, inline_fields): (Vec<_>, Vec<_>) =
        available.into_iter().partition(|field| field.is_relation());

    let (inline_relation_fields, boxed_relation_fields): (Vec<_>, Vec<_>) = relation_fields
        .into_iter()
        .partition(|field| is_activity_target_field(object_name_singular, field.name.as_str()));

    FieldClassification {
        label_identifier,
        inline_fields,
        inline_relation_fields,
        boxed_relation_fields,
    }
}

/// Returns whether `field_name` is the activity-target relation of a note or task.
pub fn is_activity_target_field(object_name_singular: &str, field_name: &str) -> bool {
    match CoreObjectNameSingular::parse(object_name_singular) {
        Some(CoreObjectNameSingular::Note) => field_name == NOTE_TARGETS_FIELD_NAME,
        Some(CoreObjectNameSingular::Task) => field_name == TASK_TARGETS_FIELD_NAME,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_fields, classify_object_fields, is_activity_target_field};
    use crate::model::field_metadata::{
        FieldMetadataItem, FieldMetadataType, ObjectMetadataItem, RelationType,
    };

    fn names(fields: &[&FieldMetadataItem]) -> Vec<String> {
        fields.iter().map(|field| field.name.clone()).collect()
    }

    fn task_object() -> ObjectMetadataItem {
        ObjectMetadataItem::new("task", "Task")
            .with_field(FieldMetadataItem::new("title", FieldMetadataType::Text, "Title"))
            .with_field(FieldMetadataItem::new("dueAt", FieldMetadataType::DateTime, "Due"))
            .with_field(FieldMetadataItem::new("body", FieldMetadataType::Text, "Body"))
            .with_field(FieldMetadataItem::relation(
                "taskTargets",
                "Relations",
                RelationType::OneToMany,
                "taskTarget",
            ))
            .with_field(FieldMetadataItem::relation(
                "assignee",
                "Assignee",
                RelationType::ManyToOne,
                "workspaceMember",
            ))
            .with_field(FieldMetadataItem::new("id", FieldMetadataType::Uuid, "Id"))
    }

    #[test]
    fn task_targets_is_inline_relation_and_others_are_boxed() {
        let mut object = task_object();
        object.label_identifier_field_metadata_id = Some(object.fields[0].id);
        let classification = classify_object_fields(&object);

        assert_eq!(
            classification.label_identifier.map(|field| field.name.as_str()),
            Some("title")
        );
        assert_eq!(names(&classification.inline_fields), vec!["body", "dueAt"]);
        assert_eq!(names(&classification.inline_relation_fields), vec!["taskTargets"]);
        assert_eq!(names(&classification.boxed_relation_fields), vec!["assignee"]);
    }

    #[test]
    fn target_field_name_on_other_objects_is_boxed() {
        let fields = vec![FieldMetadataItem::relation(
            "noteTargets",
            "Notes",
            RelationType::OneToMany,
            "noteTarget",
        )];
        let classification = classify_fields("person", &fields, None);
        assert!(classification.inline_relation_fields.is_empty());
        assert_eq!(names(&classification.boxed_relation_fields), vec!["noteTargets"]);
    }

    #[test]
    fn inline_sort_is_case_sensitive() {
        let fields = vec![
            FieldMetadataItem::new("zeta", FieldMetadataType::Text, "Zeta"),
            FieldMetadataItem::new("Alpha", FieldMetadataType::Text, "Alpha"),
            FieldMetadataItem::new("alpha", FieldMetadataType::Text, "alpha"),
        ];
        let classification = classify_fields("company", &fields, None);
        assert_eq!(
            names(&classification.inline_fields),
            vec!["Alpha", "alpha", "zeta"]
        );
    }

    #[test]
    fn activity_target_rule_is_exact_match() {
        assert!(is_activity_target_field("note", "noteTargets"));
        assert!(!is_activity_target_field("note", "taskTargets"));
        assert!(is_activity_target_field("task", "taskTargets"));
        assert!(!is_activity_target_field("task", "TaskTargets"));
    }
}
