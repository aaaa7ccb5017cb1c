//! Record repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Record values are stored as one JSON object per row.
//! - Updates merge the patch into stored values and never touch the id.
//! - Lists are ordered by `created_at ASC, id ASC`.

use crate::model::record::{Record, RecordId, RecordPatch};
use crate::record::update::{RecordBackendError, RecordMutationBackend};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};

const RECORDS_DEFAULT_LIMIT: u32 = 60;
const RECORDS_LIMIT_MAX: u32 = 200;

/// Query options for listing records of one object type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordListQuery {
    pub object_name_singular: String,
    /// Defaults to 60 and clamps to 200.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for dynamic object records.
pub trait RecordRepository {
    fn create_record(&self, record: &Record) -> RepoResult<RecordId>;
    fn get_record(&self, object_name_singular: &str, id: RecordId) -> RepoResult<Option<Record>>;
    /// Merges `patch` into the stored record and returns the new snapshot.
    fn update_record(
        &self,
        object_name_singular: &str,
        id: RecordId,
        patch: &RecordPatch,
    ) -> RepoResult<Record>;
    fn list_records(&self, query: &RecordListQuery) -> RepoResult<Vec<Record>>;
    fn delete_record(&self, object_name_singular: &str, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed record repository.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["records"])?;
        Ok(Self { conn })
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn create_record(&self, record: &Record) -> RepoResult<RecordId> {
        let data = encode_values(&record.values)?;
        let inserted = match record.created_at {
            Some(created_at) => self.conn.execute(
                "INSERT OR IGNORE INTO records (id, object_name_singular, data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4);",
                params![
                    record.id.to_string(),
                    record.object_name_singular.as_str(),
                    data,
                    created_at
                ],
            )?,
            None => self.conn.execute(
                "INSERT OR IGNORE INTO records (id, object_name_singular, data)
                 VALUES (?1, ?2, ?3);",
                params![
                    record.id.to_string(),
                    record.object_name_singular.as_str(),
                    data
                ],
            )?,
        };

        if inserted == 0 {
            return Err(RepoError::Conflict(format!(
                "record id already exists: {}",
                record.id
            )));
        }
        Ok(record.id)
    }

    fn get_record(&self, object_name_singular: &str, id: RecordId) -> RepoResult<Option<Record>> {
        self.conn
            .query_row(
                "SELECT id, object_name_singular, data, created_at
                 FROM records
                 WHERE id = ?1 AND object_name_singular = ?2;",
                params![id.to_string(), object_name_singular],
                RawRecordRow::from_row,
            )
            .optional()?
            .map(RawRecordRow::into_record)
            .transpose()
    }

    fn update_record(
        &self,
        object_name_singular: &str,
        id: RecordId,
        patch: &RecordPatch,
    ) -> RepoResult<Record> {
        let tx = self.conn.unchecked_transaction()?;
        let mut record = self
            .get_record(object_name_singular, id)?
            .ok_or(RepoError::NotFound {
                entity: "record",
                id,
            })?;
        record.apply_patch(patch);

        tx.execute(
            "UPDATE records
             SET data = ?1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2 AND object_name_singular = ?3;",
            params![encode_values(&record.values)?, id.to_string(), object_name_singular],
        )?;
        tx.commit()?;
        Ok(record)
    }

    fn list_records(&self, query: &RecordListQuery) -> RepoResult<Vec<Record>> {
        let limit = normalize_record_limit(query.limit);
        let mut stmt = self.conn.prepare(
            "SELECT id, object_name_singular, data, created_at
             FROM records
             WHERE object_name_singular = ?1
             ORDER BY created_at ASC, id ASC
             LIMIT ?2 OFFSET ?3;",
        )?;
        let mut rows = stmt.query(params![
            query.object_name_singular.as_str(),
            i64::from(limit),
            i64::from(query.offset)
        ])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(RawRecordRow::from_row(row)?.into_record()?);
        }
        Ok(records)
    }

    fn delete_record(&self, object_name_singular: &str, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM records WHERE id = ?1 AND object_name_singular = ?2;",
            params![id.to_string(), object_name_singular],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "record",
                id,
            });
        }
        Ok(())
    }
}

impl RecordMutationBackend for SqliteRecordRepository<'_> {
    fn update_one_record(
        &self,
        object_name_singular: &str,
        id_to_update: RecordId,
        update_one_record_input: &RecordPatch,
    ) -> Result<Record, RecordBackendError> {
        self.update_record(object_name_singular, id_to_update, update_one_record_input)
            .map_err(RecordBackendError::from)
    }
}

/// Normalizes list limit according to the records contract.
pub fn normalize_record_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => RECORDS_DEFAULT_LIMIT,
        Some(value) => value.min(RECORDS_LIMIT_MAX),
    }
}

struct RawRecordRow {
    id: String,
    object_name_singular: String,
    data: String,
    created_at: i64,
}

impl RawRecordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            object_name_singular: row.get("object_name_singular")?,
            data: row.get("data")?,
            created_at: row.get("created_at")?,
        })
    }

    fn into_record(self) -> RepoResult<Record> {
        let values: Map<String, Value> = serde_json::from_str(&self.data).map_err(|err| {
            RepoError::InvalidData(format!("records.data for {} is not an object: {err}", self.id))
        })?;
        Ok(Record {
            id: parse_uuid(&self.id, "records.id")?,
            object_name_singular: self.object_name_singular,
            created_at: Some(self.created_at),
            values,
        })
    }
}

fn encode_values(values: &Map<String, Value>) -> RepoResult<String> {
    serde_json::to_string(values)
        .map_err(|err| RepoError::InvalidData(format!("record values are not serializable: {err}")))
}
