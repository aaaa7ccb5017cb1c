//! Inline cell rendering and edit sessions.
//!
//! # Responsibility
//! - Render one field of one cached record through its `FieldCell`.
//! - Run an edit session: stage a draft, then confirm or cancel it.
//!
//! # Invariants
//! - At most one session holds a given scope id at a time.
//! - A confirmed change dispatches exactly one patch, addressed to the
//!   context's record and containing only the edited field.
//! - Cancelled or unchanged edits dispatch nothing.

use crate::model::field_metadata::RelationType;
use crate::model::record::{Record, RecordPatch};
use crate::record::field_cell::{CellError, CellInput, FieldCell, FieldRenderer, RenderedCell};
use crate::record::field_context::{FieldContext, FieldDefinition, InlineCellHotkeyScope};
use crate::record::store::RecordStore;
use log::debug;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Mutex;

/// Scope ids currently in edit mode.
#[derive(Debug, Default)]
pub struct EditScopeRegistry {
    active: Mutex<BTreeSet<String>>,
}

impl EditScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `scope_id`; the claim is released when the guard drops.
    pub fn claim(&self, scope_id: &str) -> Result<EditScopeGuard<'_>, CellError> {
        let mut active = self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !active.insert(scope_id.to_string()) {
            return Err(CellError::ScopeAlreadyEditing(scope_id.to_string()));
        }
        Ok(EditScopeGuard {
            registry: self,
            scope_id: scope_id.to_string(),
        })
    }

    pub fn is_editing(&self, scope_id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(scope_id)
    }

    fn release(&self, scope_id: &str) {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(scope_id);
    }
}

/// Held edit-mode claim on one scope id.
#[derive(Debug)]
pub struct EditScopeGuard<'r> {
    registry: &'r EditScopeRegistry,
    scope_id: String,
}

impl Drop for EditScopeGuard<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.scope_id);
    }
}

/// Stored and editable projections of one field's value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    /// Value as held by the record.
    pub stored: Value,
    /// Value in the shape edits produce and patches carry.
    pub editable: Value,
}

impl FieldValue {
    /// Reads `definition`'s value from `record`.
    ///
    /// To-one relations fall back to the `<name>Id` foreign key when the
    /// related object is not embedded.
    pub fn read(record: &Record, definition: &FieldDefinition, cell: &FieldCell) -> Self {
        let mut stored = record.get(&definition.field_name).clone();
        let is_to_one = definition
            .relation
            .as_ref()
            .is_some_and(|relation| relation.relation_type != RelationType::OneToMany);
        if stored.is_null() && is_to_one {
            stored = record
                .get(&cell.patch_key(&definition.field_name))
                .clone();
        }
        let editable = cell.editable_value(&stored);
        Self { stored, editable }
    }
}

/// Key gesture or pointer event that ends an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellExit {
    Enter,
    Escape,
    Tab,
    ShiftTab,
    ClickOutside,
}

/// Result of closing an edit session.
#[derive(Debug, Clone, PartialEq)]
pub enum CellOutcome {
    /// The patch sent through the update hook.
    Dispatched(RecordPatch),
    Unchanged,
    Cancelled,
}

/// Read-mode view of one inline cell.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineCellView {
    pub label: Option<String>,
    pub label_width: Option<u32>,
    pub cell: RenderedCell,
    pub is_loading: bool,
    pub is_read_only: bool,
}

/// Inline cell bound to one field context.
pub struct RecordInlineCell<'c, 'h> {
    context: &'c FieldContext<'h>,
    cell: FieldCell,
    is_loading: bool,
    is_read_only: bool,
}

impl<'c, 'h> RecordInlineCell<'c, 'h> {
    pub fn new(context: &'c FieldContext<'h>) -> Result<Self, CellError> {
        let cell = FieldCell::for_definition(&context.field_definition)?;
        Ok(Self {
            context,
            is_read_only: !cell.is_editable(),
            cell,
            is_loading: false,
        })
    }

    pub fn with_loading(mut self, is_loading: bool) -> Self {
        self.is_loading = is_loading;
        self
    }

    /// Marks the cell read-only, e.g. for remote objects.
    pub fn read_only(mut self, is_read_only: bool) -> Self {
        self.is_read_only = self.is_read_only || is_read_only;
        self
    }

    pub fn cell(&self) -> &FieldCell {
        &self.cell
    }

    /// Renders the cached value; a missing record renders empty.
    pub fn render(&self, store: &RecordStore) -> InlineCellView {
        let definition = &self.context.field_definition;
        let cell = match store.read(self.context.entity_id) {
            Some(record) => {
                let value = FieldValue::read(&record, definition, &self.cell);
                self.cell.render(&value.stored)
            }
            None => self.cell.render(&Value::Null),
        };
        InlineCellView {
            label: definition.show_label.then(|| definition.label.clone()),
            label_width: definition.label_width,
            cell,
            is_loading: self.is_loading || store.is_loading(self.context.entity_id),
            is_read_only: self.is_read_only,
        }
    }

    /// Enters edit mode for this cell's scope.
    pub fn open_edit<'r>(
        &self,
        store: &RecordStore,
        registry: &'r EditScopeRegistry,
    ) -> Result<InlineCellSession<'c, 'h, 'r>, CellError> {
        if self.is_read_only {
            return Err(CellError::ReadOnly(
                self.context.field_definition.field_name.clone(),
            ));
        }
        let record = store
            .read(self.context.entity_id)
            .ok_or(CellError::RecordNotLoaded(self.context.entity_id))?;
        let value = FieldValue::read(&record, &self.context.field_definition, &self.cell);
        let guard = registry.claim(&self.context.scope_id)?;
        debug!(
            "event=inline_cell_open module=record status=ok scope={}",
            self.context.scope_id
        );
        Ok(InlineCellSession {
            context: self.context,
            cell: self.cell.clone(),
            original: value.editable.clone(),
            draft: value.editable,
            hotkey_scope: InlineCellHotkeyScope::InlineCellEditMode,
            _guard: guard,
        })
    }
}

/// One open edit of one inline cell.
pub struct InlineCellSession<'c, 'h, 'r> {
    context: &'c FieldContext<'h>,
    cell: FieldCell,
    original: Value,
    draft: Value,
    hotkey_scope: InlineCellHotkeyScope,
    _guard: EditScopeGuard<'r>,
}

impl InlineCellSession<'_, '_, '_> {
    pub fn draft(&self) -> &Value {
        &self.draft
    }

    pub fn hotkey_scope(&self) -> InlineCellHotkeyScope {
        self.hotkey_scope
    }

    /// Applies one input gesture to the draft.
    pub fn input(&mut self, input: CellInput) -> Result<&Value, CellError> {
        self.draft = self.cell.edit(&self.draft, input)?;
        Ok(&self.draft)
    }

    /// Closes the session, dispatching the draft when it changed.
    pub fn confirm(self) -> Result<CellOutcome, CellError> {
        let definition = &self.context.field_definition;
        if self.draft == self.original {
            return Ok(CellOutcome::Unchanged);
        }
        self.cell.validate(&self.draft)?;
        if self.draft.is_null() && !definition.is_nullable {
            return Err(CellError::InvalidValue {
                field_type: definition.kind,
                reason: format!("field `{}` cannot be empty", definition.field_name),
            });
        }

        let patch = RecordPatch::single(self.cell.patch_key(&definition.field_name), self.draft);
        self.context.update_record(patch.clone());
        debug!(
            "event=inline_cell_confirm module=record status=dispatched scope={}",
            self.context.scope_id
        );
        Ok(CellOutcome::Dispatched(patch))
    }

    /// Closes the session without dispatching.
    pub fn cancel(self) -> CellOutcome {
        debug!(
            "event=inline_cell_cancel module=record status=ok scope={}",
            self.context.scope_id
        );
        CellOutcome::Cancelled
    }

    /// Escape cancels; every other exit confirms.
    pub fn exit(self, exit: CellExit) -> Result<CellOutcome, CellError> {
        match exit {
            CellExit::Escape => Ok(self.cancel()),
            CellExit::Enter | CellExit::Tab | CellExit::ShiftTab | CellExit::ClickOutside => {
                self.confirm()
            }
        }
    }
}
