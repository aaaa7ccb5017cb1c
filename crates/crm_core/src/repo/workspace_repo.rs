//! Workspace repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `invite_hash` lookups are exact matches.
//! - Activation status is persisted with its API spelling.

use crate::model::workspace::{Workspace, WorkspaceActivationStatus, WorkspaceId};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const WORKSPACE_SELECT_SQL: &str = "SELECT
    id,
    display_name,
    domain_name,
    invite_hash,
    activation_status
FROM workspaces";

/// Repository interface for workspace rows.
pub trait WorkspaceRepository {
    fn create_workspace(&self, workspace: &Workspace) -> RepoResult<WorkspaceId>;
    fn get_workspace(&self, id: WorkspaceId) -> RepoResult<Option<Workspace>>;
    fn find_by_invite_hash(&self, invite_hash: &str) -> RepoResult<Option<Workspace>>;
    fn set_activation_status(
        &self,
        id: WorkspaceId,
        status: WorkspaceActivationStatus,
    ) -> RepoResult<()>;
    fn count_workspaces(&self) -> RepoResult<u64>;
}

/// SQLite-backed workspace repository.
pub struct SqliteWorkspaceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWorkspaceRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["workspaces"])?;
        Ok(Self { conn })
    }
}

impl WorkspaceRepository for SqliteWorkspaceRepository<'_> {
    fn create_workspace(&self, workspace: &Workspace) -> RepoResult<WorkspaceId> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO workspaces (
                id,
                display_name,
                domain_name,
                invite_hash,
                activation_status
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                workspace.id.to_string(),
                workspace.display_name.as_str(),
                workspace.domain_name.as_str(),
                workspace.invite_hash.as_str(),
                workspace.activation_status.as_str(),
            ],
        )?;
        if inserted == 0 {
            return Err(RepoError::Conflict(format!(
                "workspace id or invite hash already exists: {}",
                workspace.id
            )));
        }
        Ok(workspace.id)
    }

    fn get_workspace(&self, id: WorkspaceId) -> RepoResult<Option<Workspace>> {
        self.conn
            .query_row(
                &format!("{WORKSPACE_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                RawWorkspaceRow::from_row,
            )
            .optional()?
            .map(RawWorkspaceRow::into_workspace)
            .transpose()
    }

    fn find_by_invite_hash(&self, invite_hash: &str) -> RepoResult<Option<Workspace>> {
        self.conn
            .query_row(
                &format!("{WORKSPACE_SELECT_SQL} WHERE invite_hash = ?1;"),
                [invite_hash],
                RawWorkspaceRow::from_row,
            )
            .optional()?
            .map(RawWorkspaceRow::into_workspace)
            .transpose()
    }

    fn set_activation_status(
        &self,
        id: WorkspaceId,
        status: WorkspaceActivationStatus,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE workspaces SET activation_status = ?1 WHERE id = ?2;",
            params![status.as_str(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "workspace",
                id,
            });
        }
        Ok(())
    }

    fn count_workspaces(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM workspaces;", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

struct RawWorkspaceRow {
    id: String,
    display_name: String,
    domain_name: String,
    invite_hash: String,
    activation_status: String,
}

impl RawWorkspaceRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            display_name: row.get("display_name")?,
            domain_name: row.get("domain_name")?,
            invite_hash: row.get("invite_hash")?,
            activation_status: row.get("activation_status")?,
        })
    }

    fn into_workspace(self) -> RepoResult<Workspace> {
        let activation_status = WorkspaceActivationStatus::parse(&self.activation_status)
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid activation status `{}` in workspaces.activation_status",
                    self.activation_status
                ))
            })?;
        Ok(Workspace {
            id: parse_uuid(&self.id, "workspaces.id")?,
            display_name: self.display_name,
            domain_name: self.domain_name,
            invite_hash: self.invite_hash,
            activation_status,
        })
    }
}
