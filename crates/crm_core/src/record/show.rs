//! Show page composition for one record.
//!
//! # Responsibility
//! - Classify the object's fields and resolve one context per rendered field.
//! - Assemble the summary card, property box and relation sections.
//! - Upload person pictures and store the resulting avatar url.
//!
//! # Invariants
//! - Every context built for a layout is bound to the same update hook.
//! - Without a cached record there is no summary card, no property box and
//!   no relation section.

use crate::file::{FileError, FileFolder, FileStorage, FileUploadService};
use crate::metadata::classify::classify_object_fields;
use crate::metadata::registry::{MetadataError, MetadataRegistry};
use crate::model::field_metadata::{CoreObjectNameSingular, RelationMetadata};
use crate::model::record::{RecordId, RecordPatch};
use crate::record::field_context::{
    FieldContext, FieldContextResolver, FieldPresentation, RecordUpdateHook, RecordUpdateHookParams,
};
use crate::record::identifier::{AvatarType, RecordIdentifier};
use crate::record::store::RecordStore;
use log::{debug, info};
use serde_json::Value;

/// Width cap of property box values.
pub const PROPERTY_BOX_MAX_WIDTH: u32 = 200;
/// Width of property box labels.
pub const PROPERTY_BOX_LABEL_WIDTH: u32 = 90;

const AVATAR_URL_FIELD_NAME: &str = "avatarUrl";

/// External loading signals folded into the layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowLoadingState {
    /// Metadata and related records are still being prefetched.
    pub is_prefetch_loading: bool,
    /// Caller-level loading flag.
    pub loading: bool,
}

/// Header card with the record title.
#[derive(Debug)]
pub struct SummaryCard<'h> {
    pub identifier_context: FieldContext<'h>,
    pub identifier: RecordIdentifier,
    pub avatar_placeholder: String,
    pub created_at: Option<i64>,
    pub avatar_type: AvatarType,
    pub can_upload_picture: bool,
    pub is_loading: bool,
}

/// Labelled inline fields.
#[derive(Debug)]
pub struct PropertyBox<'h> {
    /// Prefetch still running; render placeholders instead of cells.
    pub is_skeleton: bool,
    pub inline_relation_contexts: Vec<FieldContext<'h>>,
    pub inline_contexts: Vec<FieldContext<'h>>,
    pub is_loading: bool,
}

/// Standalone section listing related records.
#[derive(Debug)]
pub struct RelationSection<'h> {
    pub context: FieldContext<'h>,
    pub relation: RelationMetadata,
    pub is_loading: bool,
}

#[derive(Debug)]
pub struct RecordShowLayout<'h> {
    pub object_name_singular: String,
    pub record_id: RecordId,
    pub is_read_only: bool,
    pub is_loading: bool,
    pub summary_card: Option<SummaryCard<'h>>,
    pub property_box: Option<PropertyBox<'h>>,
    pub relation_sections: Vec<RelationSection<'h>>,
}

impl RecordShowLayout<'_> {
    /// Total number of field contexts in the layout.
    pub fn context_count(&self) -> usize {
        let summary = usize::from(self.summary_card.is_some());
        let property_box = self.property_box.as_ref().map_or(0, |property_box| {
            property_box.inline_relation_contexts.len() + property_box.inline_contexts.len()
        });
        summary + property_box + self.relation_sections.len()
    }
}

/// Builds show page layouts from registry metadata and cached records.
pub struct RecordShowComposer<'a> {
    registry: &'a MetadataRegistry,
    store: &'a RecordStore,
}

impl<'a> RecordShowComposer<'a> {
    pub fn new(registry: &'a MetadataRegistry, store: &'a RecordStore) -> Self {
        Self { registry, store }
    }

    pub fn compose<'h>(
        &self,
        object_name_singular: &str,
        record_id: RecordId,
        update_hook: &'h dyn RecordUpdateHook,
        loading_state: ShowLoadingState,
    ) -> Result<RecordShowLayout<'h>, MetadataError> {
        let object = self.registry.object(object_name_singular)?;
        let record = self.store.read(record_id);
        let record_loading = self.store.is_loading(record_id);
        let cell_loading = loading_state.loading || record_loading;
        let is_loading = loading_state.is_prefetch_loading || cell_loading;

        let mut layout = RecordShowLayout {
            object_name_singular: object.name_singular.clone(),
            record_id,
            is_read_only: object.is_remote,
            is_loading,
            summary_card: None,
            property_box: None,
            relation_sections: Vec::new(),
        };

        let Some(record) = record else {
            debug!(
                "event=record_show_compose module=record status=miss object={} record_id={record_id}",
                object.name_singular
            );
            return Ok(layout);
        };

        let classification = classify_object_fields(object);
        let resolver = FieldContextResolver::new(record_id, object.name_singular.as_str(), update_hook);
        let property_presentation = FieldPresentation {
            max_width: Some(PROPERTY_BOX_MAX_WIDTH),
            label_width: Some(PROPERTY_BOX_LABEL_WIDTH),
            ..FieldPresentation::default()
        };

        let identifier = RecordIdentifier::from_record(object, &record);
        layout.summary_card = Some(SummaryCard {
            identifier_context: resolver.resolve_label_identifier(classification.label_identifier),
            avatar_placeholder: identifier.name.clone(),
            avatar_type: identifier.avatar_type,
            identifier,
            created_at: record.created_at,
            can_upload_picture: is_person(&object.name_singular),
            is_loading,
        });

        layout.property_box = Some(PropertyBox {
            is_skeleton: loading_state.is_prefetch_loading,
            inline_relation_contexts: classification
                .inline_relation_fields
                .iter()
                .enumerate()
                .map(|(position, field)| resolver.resolve(field, position, property_presentation))
                .collect(),
            inline_contexts: classification
                .inline_fields
                .iter()
                .enumerate()
                .map(|(position, field)| resolver.resolve(field, position, property_presentation))
                .collect(),
            is_loading: cell_loading,
        });

        layout.relation_sections = classification
            .boxed_relation_fields
            .iter()
            .enumerate()
            .filter_map(|(position, field)| {
                let relation = field.relation.clone()?;
                Some(RelationSection {
                    context: resolver.resolve(field, position, FieldPresentation::default()),
                    relation,
                    is_loading,
                })
            })
            .collect();

        debug!(
            "event=record_show_compose module=record status=ok object={} record_id={record_id} contexts={}",
            object.name_singular,
            layout.context_count()
        );
        Ok(layout)
    }
}

/// Uploads a person picture and patches the record's `avatarUrl`.
///
/// Returns `Ok(None)` for non-person objects and for records that are not
/// cached; nothing is uploaded for non-person objects.
pub fn upload_person_picture<S: FileStorage>(
    object_name_singular: &str,
    record_id: RecordId,
    picture: &[u8],
    uploader: &FileUploadService<S>,
    store: &RecordStore,
    update_hook: &dyn RecordUpdateHook,
) -> Result<Option<RecordPatch>, FileError> {
    if !is_person(object_name_singular) {
        return Ok(None);
    }

    let uploaded = uploader.upload_image(picture, FileFolder::PersonPicture)?;
    let Some(avatar_url) = uploaded.paths.into_iter().next() else {
        return Ok(None);
    };
    if !store.contains(record_id) {
        return Ok(None);
    }

    let patch = RecordPatch::single(AVATAR_URL_FIELD_NAME, Value::String(avatar_url));
    update_hook.update_record(RecordUpdateHookParams {
        id_to_update: record_id,
        update_one_record_input: patch.clone(),
    });
    info!("event=person_picture_upload module=record status=ok record_id={record_id}");
    Ok(Some(patch))
}

fn is_person(object_name_singular: &str) -> bool {
    CoreObjectNameSingular::parse(object_name_singular) == Some(CoreObjectNameSingular::Person)
}
