//! Per-field rendering context.
//!
//! # Responsibility
//! - Bundle record id, scope id, field definition and the update hook into an
//!   explicit parameter passed down to cells.
//!
//! # Invariants
//! - `scope_id` is the record id immediately followed by the field id.
//! - Building a context has no side effects.

use crate::model::field_metadata::{
    FieldMetadataId, FieldMetadataItem, FieldMetadataType, FieldOption, RelationMetadata,
};
use crate::model::record::{RecordId, RecordPatch};
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use uuid::Uuid;

/// Target record and partial patch for one update call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordUpdateHookParams {
    pub id_to_update: RecordId,
    pub update_one_record_input: RecordPatch,
}

/// Single entry point every inline edit goes through.
pub trait RecordUpdateHook {
    fn update_record(&self, params: RecordUpdateHookParams);
}

/// Keyboard scope claimed by an inline cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineCellHotkeyScope {
    InlineCell,
    InlineCellEditMode,
}

impl InlineCellHotkeyScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InlineCell => "inline-cell",
            Self::InlineCellEditMode => "inline-cell-edit-mode",
        }
    }
}

/// Column-style view of one field, derived from its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub field_metadata_id: FieldMetadataId,
    pub label: String,
    pub icon_name: String,
    pub kind: FieldMetadataType,
    pub field_name: String,
    pub object_name_singular: String,
    pub default_value: Option<Value>,
    pub is_nullable: bool,
    pub relation: Option<RelationMetadata>,
    pub options: Vec<FieldOption>,
    pub position: usize,
    pub show_label: bool,
    pub label_width: Option<u32>,
}

impl FieldDefinition {
    /// Builds the definition of `field` at `position` within its group.
    pub fn from_field(
        field: &FieldMetadataItem,
        object_name_singular: &str,
        position: usize,
    ) -> Self {
        Self {
            field_metadata_id: field.id,
            label: field.label.clone(),
            icon_name: field.icon.clone().unwrap_or_default(),
            kind: field.kind,
            field_name: field.name.clone(),
            object_name_singular: object_name_singular.to_string(),
            default_value: field.default_value.clone(),
            is_nullable: field.is_nullable,
            relation: field.relation.clone(),
            options: field.options.clone(),
            position,
            show_label: false,
            label_width: None,
        }
    }

    /// Text definition used when an object declares no label identifier.
    pub fn placeholder_identifier(object_name_singular: &str) -> Self {
        Self {
            field_metadata_id: Uuid::nil(),
            label: String::new(),
            icon_name: String::new(),
            kind: FieldMetadataType::Text,
            field_name: String::new(),
            object_name_singular: object_name_singular.to_string(),
            default_value: None,
            is_nullable: true,
            relation: None,
            options: Vec::new(),
            position: 0,
            show_label: false,
            label_width: None,
        }
    }

    /// Shows the label next to the value with a fixed label column width.
    pub fn with_label(mut self, label_width: u32) -> Self {
        self.show_label = true;
        self.label_width = Some(label_width);
        self
    }
}

/// Presentation knobs that vary by where a field is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldPresentation {
    pub max_width: Option<u32>,
    pub is_label_identifier: bool,
    pub is_centered: bool,
    pub label_width: Option<u32>,
}

/// Everything a cell needs to render and edit one field of one record.
pub struct FieldContext<'h> {
    pub entity_id: RecordId,
    pub scope_id: String,
    pub is_label_identifier: bool,
    pub field_definition: FieldDefinition,
    pub hotkey_scope: InlineCellHotkeyScope,
    pub max_width: Option<u32>,
    pub is_centered: bool,
    update_hook: &'h dyn RecordUpdateHook,
}

impl<'h> FieldContext<'h> {
    pub fn new(
        entity_id: RecordId,
        field_definition: FieldDefinition,
        presentation: FieldPresentation,
        update_hook: &'h dyn RecordUpdateHook,
    ) -> Self {
        let field_definition = match presentation.label_width {
            Some(width) => field_definition.with_label(width),
            None => field_definition,
        };
        Self {
            entity_id,
            scope_id: field_scope_id(entity_id, field_definition.field_metadata_id),
            is_label_identifier: presentation.is_label_identifier,
            field_definition,
            hotkey_scope: InlineCellHotkeyScope::InlineCell,
            max_width: presentation.max_width,
            is_centered: presentation.is_centered,
            update_hook,
        }
    }

    /// Sends `patch` for this context's record through the bound hook.
    pub fn update_record(&self, patch: RecordPatch) {
        self.update_hook.update_record(RecordUpdateHookParams {
            id_to_update: self.entity_id,
            update_one_record_input: patch,
        });
    }

    pub fn update_hook(&self) -> &'h dyn RecordUpdateHook {
        self.update_hook
    }
}

impl Debug for FieldContext<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldContext")
            .field("entity_id", &self.entity_id)
            .field("scope_id", &self.scope_id)
            .field("is_label_identifier", &self.is_label_identifier)
            .field("field_definition", &self.field_definition)
            .field("hotkey_scope", &self.hotkey_scope)
            .field("max_width", &self.max_width)
            .field("is_centered", &self.is_centered)
            .finish_non_exhaustive()
    }
}

/// Scope id isolating edit state of one field of one record.
pub fn field_scope_id(entity_id: RecordId, field_metadata_id: FieldMetadataId) -> String {
    format!("{entity_id}{field_metadata_id}")
}

/// Builds field contexts for one record, all bound to the same update hook.
pub struct FieldContextResolver<'h> {
    entity_id: RecordId,
    object_name_singular: String,
    update_hook: &'h dyn RecordUpdateHook,
}

impl<'h> FieldContextResolver<'h> {
    pub fn new(
        entity_id: RecordId,
        object_name_singular: impl Into<String>,
        update_hook: &'h dyn RecordUpdateHook,
    ) -> Self {
        Self {
            entity_id,
            object_name_singular: object_name_singular.into(),
            update_hook,
        }
    }

    /// Context for `field` rendered at `position` within its group.
    pub fn resolve(
        &self,
        field: &FieldMetadataItem,
        position: usize,
        presentation: FieldPresentation,
    ) -> FieldContext<'h> {
        let definition = FieldDefinition::from_field(field, &self.object_name_singular, position);
        FieldContext::new(self.entity_id, definition, presentation, self.update_hook)
    }

    /// Context for the title field, or a text placeholder when none is declared.
    pub fn resolve_label_identifier(&self, field: Option<&FieldMetadataItem>) -> FieldContext<'h> {
        let definition = match field {
            Some(field) => FieldDefinition::from_field(field, &self.object_name_singular, 0),
            None => FieldDefinition::placeholder_identifier(&self.object_name_singular),
        };
        let presentation = FieldPresentation {
            is_centered: true,
            ..FieldPresentation::default()
        };
        FieldContext::new(self.entity_id, definition, presentation, self.update_hook)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        field_scope_id, FieldContextResolver, FieldPresentation, RecordUpdateHook,
        RecordUpdateHookParams,
    };
    use crate::model::field_metadata::{FieldMetadataItem, FieldMetadataType};
    use crate::model::record::RecordPatch;
    use serde_json::json;
    use std::cell::RefCell;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingHook {
        calls: RefCell<Vec<RecordUpdateHookParams>>,
    }

    impl RecordUpdateHook for RecordingHook {
        fn update_record(&self, params: RecordUpdateHookParams) {
            self.calls.borrow_mut().push(params);
        }
    }

    #[test]
    fn scope_id_concatenates_record_and_field_ids() {
        let record_id = Uuid::new_v4();
        let field_id = Uuid::new_v4();
        assert_eq!(
            field_scope_id(record_id, field_id),
            format!("{record_id}{field_id}")
        );
    }

    #[test]
    fn resolver_copies_field_metadata_and_presentation() {
        let hook = RecordingHook::default();
        let record_id = Uuid::new_v4();
        let mut field = FieldMetadataItem::new("city", FieldMetadataType::Text, "City");
        field.default_value = Some(json!(""));
        let resolver = FieldContextResolver::new(record_id, "person", &hook);

        let context = resolver.resolve(
            &field,
            3,
            FieldPresentation {
                max_width: Some(200),
                label_width: Some(90),
                ..FieldPresentation::default()
            },
        );

        assert_eq!(context.entity_id, record_id);
        assert_eq!(context.field_definition.field_name, "city");
        assert_eq!(context.field_definition.position, 3);
        assert!(context.field_definition.show_label);
        assert_eq!(context.field_definition.label_width, Some(90));
        assert_eq!(context.field_definition.default_value, Some(json!("")));
        assert_eq!(context.max_width, Some(200));
        assert_eq!(context.hotkey_scope.as_str(), "inline-cell");
    }

    #[test]
    fn update_record_targets_context_entity() {
        let hook = RecordingHook::default();
        let record_id = Uuid::new_v4();
        let field = FieldMetadataItem::new("city", FieldMetadataType::Text, "City");
        let context =
            FieldContextResolver::new(record_id, "person", &hook).resolve(&field, 0, FieldPresentation::default());

        context.update_record(RecordPatch::single("city", json!("Oslo")));

        let calls = hook.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id_to_update, record_id);
        assert_eq!(calls[0].update_one_record_input.field_names(), vec!["city"]);
    }

    #[test]
    fn missing_label_identifier_uses_centered_text_placeholder() {
        let hook = RecordingHook::default();
        let record_id = Uuid::new_v4();
        let context = FieldContextResolver::new(record_id, "opportunity", &hook)
            .resolve_label_identifier(None);
        assert_eq!(context.field_definition.kind, FieldMetadataType::Text);
        assert!(context.is_centered);
        assert_eq!(context.scope_id, format!("{record_id}{}", Uuid::nil()));
    }
}
