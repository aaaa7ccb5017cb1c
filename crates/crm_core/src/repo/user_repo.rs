//! User, user-workspace link and workspace member persistence.
//!
//! # Invariants
//! - Emails are unique case-insensitively.
//! - A user is linked to a workspace at most once.

use crate::model::workspace::{
    FullName, User, UserId, WorkspaceId, WorkspaceMember, WorkspaceMemberDateFormat,
    WorkspaceMemberTimeFormat,
};
use crate::repo::{bool_to_int, ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    email,
    first_name,
    last_name,
    default_avatar_url,
    can_impersonate,
    password_hash,
    default_workspace_id
FROM users";

/// Repository interface for users and their workspace memberships.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn count_users(&self) -> RepoResult<u64>;
    fn set_default_workspace(&self, user_id: UserId, workspace_id: WorkspaceId) -> RepoResult<()>;
    /// Links a user to a workspace. Returns `false` when already linked.
    fn add_user_to_workspace(&self, user_id: UserId, workspace_id: WorkspaceId) -> RepoResult<bool>;
    fn list_user_workspace_ids(&self, user_id: UserId) -> RepoResult<Vec<WorkspaceId>>;
    fn create_workspace_member(&self, member: &WorkspaceMember) -> RepoResult<()>;
    fn get_workspace_member(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> RepoResult<Option<WorkspaceMember>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users", "user_workspaces", "workspace_members"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        if self.find_by_email(&user.email)?.is_some() {
            return Err(RepoError::Conflict("email already registered".to_string()));
        }
        self.conn.execute(
            "INSERT INTO users (
                id,
                email,
                first_name,
                last_name,
                default_avatar_url,
                can_impersonate,
                password_hash,
                default_workspace_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                user.id.to_string(),
                user.email.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.default_avatar_url.as_deref(),
                bool_to_int(user.can_impersonate),
                user.password_hash.as_deref(),
                user.default_workspace_id.to_string(),
            ],
        )?;
        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                RawUserRow::from_row,
            )
            .optional()?
            .map(RawUserRow::into_user)
            .transpose()
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE email = ?1 COLLATE NOCASE;"),
                [email.trim()],
                RawUserRow::from_row,
            )
            .optional()?
            .map(RawUserRow::into_user)
            .transpose()
    }

    fn count_users(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn set_default_workspace(&self, user_id: UserId, workspace_id: WorkspaceId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET default_workspace_id = ?1 WHERE id = ?2;",
            params![workspace_id.to_string(), user_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "user",
                id: user_id,
            });
        }
        Ok(())
    }

    fn add_user_to_workspace(&self, user_id: UserId, workspace_id: WorkspaceId) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO user_workspaces (user_id, workspace_id) VALUES (?1, ?2);",
            params![user_id.to_string(), workspace_id.to_string()],
        )?;
        Ok(inserted == 1)
    }

    fn list_user_workspace_ids(&self, user_id: UserId) -> RepoResult<Vec<WorkspaceId>> {
        let mut stmt = self.conn.prepare(
            "SELECT workspace_id
             FROM user_workspaces
             WHERE user_id = ?1
             ORDER BY created_at ASC, workspace_id ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            ids.push(parse_uuid(&raw, "user_workspaces.workspace_id")?);
        }
        Ok(ids)
    }

    fn create_workspace_member(&self, member: &WorkspaceMember) -> RepoResult<()> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO workspace_members (
                id,
                workspace_id,
                user_id,
                first_name,
                last_name,
                color_scheme,
                avatar_url,
                locale,
                time_zone,
                date_format,
                time_format
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                member.id.to_string(),
                member.workspace_id.to_string(),
                member.user_id.to_string(),
                member.name.first_name.as_str(),
                member.name.last_name.as_str(),
                member.color_scheme.as_str(),
                member.avatar_url.as_deref(),
                member.locale.as_str(),
                member.time_zone.as_str(),
                enum_to_db(&member.date_format)?,
                enum_to_db(&member.time_format)?,
            ],
        )?;
        if inserted == 0 {
            return Err(RepoError::Conflict(format!(
                "workspace member already exists for user {} in workspace {}",
                member.user_id, member.workspace_id
            )));
        }
        Ok(())
    }

    fn get_workspace_member(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> RepoResult<Option<WorkspaceMember>> {
        self.conn
            .query_row(
                "SELECT
                    id,
                    workspace_id,
                    user_id,
                    first_name,
                    last_name,
                    color_scheme,
                    avatar_url,
                    locale,
                    time_zone,
                    date_format,
                    time_format
                 FROM workspace_members
                 WHERE workspace_id = ?1 AND user_id = ?2;",
                params![workspace_id.to_string(), user_id.to_string()],
                RawMemberRow::from_row,
            )
            .optional()?
            .map(RawMemberRow::into_member)
            .transpose()
    }
}

struct RawUserRow {
    id: String,
    email: String,
    first_name: String,
    last_name: String,
    default_avatar_url: Option<String>,
    can_impersonate: i64,
    password_hash: Option<String>,
    default_workspace_id: String,
}

impl RawUserRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            default_avatar_url: row.get("default_avatar_url")?,
            can_impersonate: row.get("can_impersonate")?,
            password_hash: row.get("password_hash")?,
            default_workspace_id: row.get("default_workspace_id")?,
        })
    }

    fn into_user(self) -> RepoResult<User> {
        Ok(User {
            id: parse_uuid(&self.id, "users.id")?,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            default_avatar_url: self.default_avatar_url,
            can_impersonate: self.can_impersonate == 1,
            password_hash: self.password_hash,
            default_workspace_id: parse_uuid(
                &self.default_workspace_id,
                "users.default_workspace_id",
            )?,
        })
    }
}

struct RawMemberRow {
    id: String,
    workspace_id: String,
    user_id: String,
    first_name: String,
    last_name: String,
    color_scheme: String,
    avatar_url: Option<String>,
    locale: String,
    time_zone: String,
    date_format: String,
    time_format: String,
}

impl RawMemberRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            workspace_id: row.get("workspace_id")?,
            user_id: row.get("user_id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            color_scheme: row.get("color_scheme")?,
            avatar_url: row.get("avatar_url")?,
            locale: row.get("locale")?,
            time_zone: row.get("time_zone")?,
            date_format: row.get("date_format")?,
            time_format: row.get("time_format")?,
        })
    }

    fn into_member(self) -> RepoResult<WorkspaceMember> {
        Ok(WorkspaceMember {
            id: parse_uuid(&self.id, "workspace_members.id")?,
            workspace_id: parse_uuid(&self.workspace_id, "workspace_members.workspace_id")?,
            user_id: parse_uuid(&self.user_id, "workspace_members.user_id")?,
            name: FullName {
                first_name: self.first_name,
                last_name: self.last_name,
            },
            color_scheme: self.color_scheme,
            avatar_url: self.avatar_url,
            locale: self.locale,
            time_zone: self.time_zone,
            date_format: enum_from_db::<WorkspaceMemberDateFormat>(&self.date_format)?,
            time_format: enum_from_db::<WorkspaceMemberTimeFormat>(&self.time_format)?,
        })
    }
}

fn enum_to_db<T: serde::Serialize>(value: &T) -> RepoResult<String> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(text)) => Ok(text),
        _ => Err(RepoError::InvalidData(
            "enum did not serialize to a string".to_string(),
        )),
    }
}

fn enum_from_db<T: serde::de::DeserializeOwned>(raw: &str) -> RepoResult<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| RepoError::InvalidData(format!("unknown enum value `{raw}`")))
}
