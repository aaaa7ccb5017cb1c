//! Single mutation entry point for in-place record edits.
//!
//! # Responsibility
//! - Apply the edit optimistically to the record store.
//! - Forward the patch to the mutation backend and store the server snapshot.
//!
//! # Invariants
//! - One `update_field` call issues exactly one backend call.
//! - Updates of different fields are independent; the backend's last write
//!   decides the stored value.
//! - `update_field` does not surface backend failures to its caller. They are
//!   logged and the optimistic patch stays in the store until the next
//!   server snapshot. Use `try_update_field` to observe the outcome.

use crate::model::record::{Record, RecordId, RecordPatch};
use crate::record::field_context::{RecordUpdateHook, RecordUpdateHookParams};
use crate::record::store::RecordStore;
use crate::repo::RepoError;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by the mutation boundary.
#[derive(Debug)]
pub enum RecordBackendError {
    /// Transport failure; the backend may or may not have applied the patch.
    Network(String),
    /// Backend rejected the patch.
    Validation(String),
    /// Local repository failure.
    Repo(RepoError),
}

impl Display for RecordBackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(message) => write!(f, "record update network error: {message}"),
            Self::Validation(message) => write!(f, "record update rejected: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RecordBackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RecordBackendError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// `updateOneRecord(idToUpdate, updateOneRecordInput)` boundary.
pub trait RecordMutationBackend {
    fn update_one_record(
        &self,
        object_name_singular: &str,
        id_to_update: RecordId,
        update_one_record_input: &RecordPatch,
    ) -> Result<Record, RecordBackendError>;
}

impl<B: RecordMutationBackend + ?Sized> RecordMutationBackend for &B {
    fn update_one_record(
        &self,
        object_name_singular: &str,
        id_to_update: RecordId,
        update_one_record_input: &RecordPatch,
    ) -> Result<Record, RecordBackendError> {
        (**self).update_one_record(object_name_singular, id_to_update, update_one_record_input)
    }
}

/// Update hook bound to one object type.
pub struct UpdateDispatcher<'s, B> {
    object_name_singular: String,
    backend: B,
    store: &'s RecordStore,
}

impl<'s, B: RecordMutationBackend> UpdateDispatcher<'s, B> {
    pub fn new(object_name_singular: impl Into<String>, backend: B, store: &'s RecordStore) -> Self {
        Self {
            object_name_singular: object_name_singular.into(),
            backend,
            store,
        }
    }

    pub fn object_name_singular(&self) -> &str {
        &self.object_name_singular
    }

    /// Fire-and-forget update of `patch` on `id`.
    pub fn update_field(&self, id: RecordId, patch: RecordPatch) {
        if let Err(err) = self.try_update_field(id, patch) {
            warn!(
                "event=record_update module=record status=error object={} record_id={id} error={err}",
                self.object_name_singular
            );
        }
    }

    /// Same flow as `update_field`, returning the server snapshot or the failure.
    pub fn try_update_field(
        &self,
        id: RecordId,
        patch: RecordPatch,
    ) -> Result<Record, RecordBackendError> {
        let fields = patch.field_names().join(",");
        let cached = self.store.apply_patch(id, &patch);
        debug!(
            "event=record_update module=record status=start object={} record_id={id} fields={fields} cached={cached}",
            self.object_name_singular
        );

        let record = self
            .backend
            .update_one_record(&self.object_name_singular, id, &patch)?;
        self.store.write(record.clone());
        debug!(
            "event=record_update module=record status=ok object={} record_id={id}",
            self.object_name_singular
        );
        Ok(record)
    }
}

impl<B: RecordMutationBackend> RecordUpdateHook for UpdateDispatcher<'_, B> {
    fn update_record(&self, params: RecordUpdateHookParams) {
        self.update_field(params.id_to_update, params.update_one_record_input);
    }
}
