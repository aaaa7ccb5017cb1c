//! Client-side keyed record store.
//!
//! # Responsibility
//! - Hold the latest known snapshot of each record by id.
//! - Track which records are currently loading.
//!
//! # Invariants
//! - Reads return owned snapshots; callers never hold the lock.
//! - The store is eventually consistent with the backend: an optimistic
//!   patch is visible before the server confirms it, and a later server
//!   snapshot overwrites it. No cross-record ordering is enforced.

use crate::model::record::{Record, RecordId, RecordPatch};
use log::trace;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Process-wide cache of record snapshots.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: RwLock<HashMap<RecordId, Record>>,
    loading: RwLock<HashSet<RecordId>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one record, if cached.
    pub fn read(&self, id: RecordId) -> Option<Record> {
        self.records_read().get(&id).cloned()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.records_read().contains_key(&id)
    }

    /// Inserts or replaces a snapshot and clears its loading flag.
    pub fn write(&self, record: Record) {
        let id = record.id;
        self.records_write().insert(id, record);
        self.set_loading(id, false);
        trace!("event=record_store_write module=record status=ok record_id={id}");
    }

    /// Merges `patch` into a cached snapshot. Returns `false` when not cached.
    pub fn apply_patch(&self, id: RecordId, patch: &RecordPatch) -> bool {
        match self.records_write().get_mut(&id) {
            Some(record) => {
                record.apply_patch(patch);
                true
            }
            None => false,
        }
    }

    /// Drops a snapshot so the next read misses.
    pub fn invalidate(&self, id: RecordId) -> Option<Record> {
        let removed = self.records_write().remove(&id);
        trace!(
            "event=record_store_invalidate module=record status=ok record_id={id} hit={}",
            removed.is_some()
        );
        removed
    }

    pub fn set_loading(&self, id: RecordId, loading: bool) {
        let mut guard = self.loading.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if loading {
            guard.insert(id);
        } else {
            guard.remove(&id);
        }
    }

    pub fn is_loading(&self, id: RecordId) -> bool {
        self.loading
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&id)
    }

    pub fn len(&self) -> usize {
        self.records_read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records_read().is_empty()
    }

    fn records_read(&self) -> RwLockReadGuard<'_, HashMap<RecordId, Record>> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn records_write(&self) -> RwLockWriteGuard<'_, HashMap<RecordId, Record>> {
        self.records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
